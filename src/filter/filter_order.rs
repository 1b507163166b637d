use super::types::FilterTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: &'static str,
    pub sort: SortDirection,
    pub nulls_last: bool,
}

pub struct FilterOrder;

impl FilterOrder {
    /// Default ordering per collection: recipes alphabetically, users by most
    /// recent login with never-logged-in users at the end.
    pub fn default_for(target: FilterTarget) -> Vec<FilterOrderInfo> {
        match target {
            FilterTarget::Recipes => vec![FilterOrderInfo {
                column: "recipes.title",
                sort: SortDirection::Asc,
                nulls_last: false,
            }],
            FilterTarget::Users => vec![FilterOrderInfo {
                column: "users.lastlog",
                sort: SortDirection::Desc,
                nulls_last: true,
            }],
        }
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| {
                let mut part = format!("{} {}", i.column, i.sort.to_sql());
                if i.nulls_last {
                    part.push_str(" NULLS LAST");
                }
                part
            })
            .collect();
        format!(" ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipes_sort_by_title() {
        let sql = FilterOrder::generate(&FilterOrder::default_for(FilterTarget::Recipes));
        assert_eq!(sql, " ORDER BY recipes.title ASC");
    }

    #[test]
    fn users_sort_by_last_login_nulls_last() {
        let sql = FilterOrder::generate(&FilterOrder::default_for(FilterTarget::Users));
        assert_eq!(sql, " ORDER BY users.lastlog DESC NULLS LAST");
    }

    #[test]
    fn empty_order_is_empty() {
        assert_eq!(FilterOrder::generate(&[]), "");
    }
}
