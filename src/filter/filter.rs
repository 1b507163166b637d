use super::builder::SqlBuilder;
use super::filter_order::{FilterOrder, FilterOrderInfo};
use super::filter_where::{tokenize, FilterWhere};
use super::types::{FilterTarget, ItemFilter, SqlResult};

/// Compiled form of an [`ItemFilter`] for one collection.
///
/// The repository supplies the `SELECT ... FROM ... JOIN ...` head; the
/// filter appends predicate, grouping, ordering, limit and offset in that
/// fixed order.
pub struct Filter {
    target: FilterTarget,
    terms: Vec<String>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(target: FilterTarget) -> Self {
        Self {
            target,
            terms: vec![],
            order_data: FilterOrder::default_for(target),
            limit: None,
            offset: None,
        }
    }

    pub fn from_item_filter(target: FilterTarget, item: &ItemFilter) -> Self {
        let mut filter = Self::new(target);
        filter.assign(item);
        filter
    }

    pub fn assign(&mut self, item: &ItemFilter) -> &mut Self {
        self.query(&item.query);
        self.limit(item.count, item.skip);
        self
    }

    pub fn query(&mut self, query: &str) -> &mut Self {
        self.terms = tokenize(query);
        self
    }

    /// `skip` is a page index: the offset is `count * skip`, and neither a
    /// limit nor an offset applies while `count` is 0.
    pub fn limit(&mut self, count: u32, skip: u32) -> &mut Self {
        if count == 0 {
            self.limit = None;
            self.offset = None;
            return self;
        }
        self.limit = Some(i64::from(count));
        self.offset = if skip > 0 {
            Some(i64::from(count) * i64::from(skip))
        } else {
            None
        };
        self
    }

    fn group_by(&self) -> &'static str {
        match self.target {
            FilterTarget::Recipes => " GROUP BY recipes.id, users.name",
            FilterTarget::Users => " GROUP BY users.id",
        }
    }

    pub fn to_sql(&self, base: &str) -> SqlResult {
        let mut builder = SqlBuilder::new(base);

        match self.target {
            FilterTarget::Recipes => {
                builder.push(self.group_by());
                FilterWhere::generate(&mut builder, self.target, &self.terms);
            }
            FilterTarget::Users => {
                FilterWhere::generate(&mut builder, self.target, &self.terms);
                builder.push(self.group_by());
            }
        }

        builder.push(&FilterOrder::generate(&self.order_data));

        if let Some(limit) = self.limit {
            builder.push_with(" LIMIT ", limit);
        }
        if let Some(offset) = self.offset {
            builder.push_with(" OFFSET ", offset);
        }

        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::SqlParam;

    const BASE: &str = "SELECT recipes.id FROM recipes JOIN users ON recipes.author_id = users.id";

    #[test]
    fn count_and_skip_become_limit_and_page_offset() {
        let filter = Filter::from_item_filter(FilterTarget::Recipes, &ItemFilter::new("", 10, 2));
        assert_eq!(filter.limit, Some(10));
        assert_eq!(filter.offset, Some(20));

        let sql = filter.to_sql(BASE);
        assert!(sql.query.ends_with(" LIMIT $1 OFFSET $2"), "{}", sql.query);
        assert_eq!(sql.params, vec![SqlParam::Int(10), SqlParam::Int(20)]);
    }

    #[test]
    fn skip_without_count_is_ignored() {
        let filter = Filter::from_item_filter(FilterTarget::Users, &ItemFilter::new("", 0, 2));
        assert_eq!(filter.limit, None);
        assert_eq!(filter.offset, None);

        let sql = filter.to_sql("SELECT users.id FROM users");
        assert!(!sql.query.contains("LIMIT"));
        assert!(!sql.query.contains("OFFSET"));
        assert!(sql.params.is_empty());
    }

    #[test]
    fn count_without_skip_has_no_offset() {
        let sql = Filter::from_item_filter(FilterTarget::Recipes, &ItemFilter::new("", 5, 0)).to_sql(BASE);
        assert!(sql.query.ends_with(" LIMIT $1"));
        assert_eq!(sql.params, vec![SqlParam::Int(5)]);
    }

    #[test]
    fn recipe_clauses_in_fixed_order() {
        let filter = Filter::from_item_filter(FilterTarget::Recipes, &ItemFilter::new("  soup  bean  ", 10, 1));
        assert_eq!(filter.terms, vec!["soup", "bean"]);

        let sql = filter.to_sql(BASE);
        let group = sql.query.find("GROUP BY").unwrap();
        let having = sql.query.find("HAVING").unwrap();
        let order = sql.query.find("ORDER BY").unwrap();
        let limit = sql.query.find("LIMIT").unwrap();
        let offset = sql.query.find("OFFSET").unwrap();
        assert!(group < having && having < order && order < limit && limit < offset);

        // Terms bind first, then limit and offset.
        assert_eq!(
            sql.params,
            vec![
                SqlParam::Text("%soup%".into()),
                SqlParam::Text("%bean%".into()),
                SqlParam::Int(10),
                SqlParam::Int(10),
            ]
        );
        assert!(sql.query.contains("LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn user_predicate_precedes_grouping() {
        let sql = Filter::from_item_filter(FilterTarget::Users, &ItemFilter::new("bob", 0, 0))
            .to_sql("SELECT users.id FROM users LEFT JOIN recipes ON users.id = recipes.author_id");
        let where_at = sql.query.find(" WHERE ").unwrap();
        let group = sql.query.find("GROUP BY users.id").unwrap();
        assert!(where_at < group);
        assert!(sql.query.ends_with("ORDER BY users.lastlog DESC NULLS LAST"));
    }

    #[test]
    fn empty_query_matches_everything() {
        let sql = Filter::from_item_filter(FilterTarget::Recipes, &ItemFilter::default()).to_sql(BASE);
        assert!(!sql.query.contains("HAVING"));
        assert!(sql.params.is_empty());
    }
}
