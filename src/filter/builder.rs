use super::types::{SqlParam, SqlResult};

/// Accumulates SQL text and the values bound to it.
///
/// Placeholders are numbered in the order values are bound, so callers never
/// track `$n` indexes themselves.
#[derive(Debug, Default)]
pub struct SqlBuilder {
    query: String,
    params: Vec<SqlParam>,
}

impl SqlBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            query: base.into(),
            params: vec![],
        }
    }

    /// Append raw SQL.
    pub fn push(&mut self, fragment: &str) -> &mut Self {
        self.query.push_str(fragment);
        self
    }

    /// Register a value and return its placeholder without appending it, for
    /// fragments that reference the same value more than once.
    pub fn bind(&mut self, value: impl Into<SqlParam>) -> String {
        self.params.push(value.into());
        format!("${}", self.params.len())
    }

    /// Register a value and append its placeholder.
    pub fn push_bind(&mut self, value: impl Into<SqlParam>) -> &mut Self {
        let placeholder = self.bind(value);
        self.query.push_str(&placeholder);
        self
    }

    /// Append `fragment` followed by a placeholder for `value`.
    pub fn push_with(&mut self, fragment: &str, value: impl Into<SqlParam>) -> &mut Self {
        self.push(fragment).push_bind(value)
    }

    pub fn finish(self) -> SqlResult {
        SqlResult {
            query: self.query,
            params: self.params,
        }
    }
}
