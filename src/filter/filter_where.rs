use super::builder::SqlBuilder;
use super::types::FilterTarget;

/// Split a search string on single spaces, dropping the empty tokens left by
/// leading, trailing, or repeated spaces.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .split(' ')
        .filter(|term| !term.is_empty())
        .map(str::to_string)
        .collect()
}

/// `%term%` for ILIKE, with the term's own wildcards and backslashes
/// escaped so it matches literally.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub struct FilterWhere;

impl FilterWhere {
    /// Keyword that introduces the term predicate for a target. Recipe terms
    /// test the aggregated tag string, so they run after grouping.
    pub fn keyword(target: FilterTarget) -> &'static str {
        match target {
            FilterTarget::Recipes => "HAVING",
            FilterTarget::Users => "WHERE",
        }
    }

    /// Fields a single term may match. Any one of them is enough.
    pub fn fields(target: FilterTarget) -> &'static [&'static str] {
        match target {
            FilterTarget::Recipes => &["recipes.title", "string_agg(tags.tag, ' ')"],
            FilterTarget::Users => &["users.name", "users.email", "users.role"],
        }
    }

    /// Append the predicate for `terms`: terms AND together, fields within a
    /// term OR together. Nothing is appended when there are no terms.
    pub fn generate(builder: &mut SqlBuilder, target: FilterTarget, terms: &[String]) {
        for (i, term) in terms.iter().enumerate() {
            let placeholder = builder.bind(contains_pattern(term));
            let alternatives = Self::fields(target)
                .iter()
                .map(|field| format!("{} ILIKE {}", field, placeholder))
                .collect::<Vec<_>>()
                .join(" OR ");

            let joiner = if i == 0 {
                format!(" {} ", Self::keyword(target))
            } else {
                " AND ".to_string()
            };
            builder.push(&joiner).push(&format!("({})", alternatives));
        }
    }
}
