use serde::{Deserialize, Serialize};

/// Search plus pagination request for any collection.
///
/// `count == 0` means unlimited. `skip` counts whole pages of `count`
/// results, so it has no effect while `count` is 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    /// Space separated search terms, each matched with ILIKE `%term%`.
    #[serde(default)]
    pub query: String,
    /// Limit to this many results.
    #[serde(default)]
    pub count: u32,
    /// Skip this many pages of results.
    #[serde(default)]
    pub skip: u32,
}

impl ItemFilter {
    pub fn new(query: impl Into<String>, count: u32, skip: u32) -> Self {
        Self {
            query: query.into(),
            count,
            skip,
        }
    }

    /// Build a filter from raw query-string values. Missing or unparsable
    /// numbers fall back to 0, which disables the limit.
    pub fn from_params(query: Option<&str>, count: Option<&str>, skip: Option<&str>) -> Self {
        let parse = |v: Option<&str>| v.and_then(|s| s.trim().parse::<u32>().ok()).unwrap_or(0);
        Self {
            query: query.unwrap_or_default().to_string(),
            count: parse(count),
            skip: parse(skip),
        }
    }

    /// Cap `count` at `max`, leaving an unlimited (0) count alone.
    pub fn capped(mut self, max: Option<u32>) -> Self {
        if let Some(max) = max {
            if self.count > max {
                tracing::warn!("Count {} exceeds max {}, capping to max", self.count, max);
                self.count = max;
            }
        }
        self
    }
}

/// Collection a filter is compiled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTarget {
    Recipes,
    Users,
}

/// A value bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Json(serde_json::Value),
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::Int(v.into())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<serde_json::Value> for SqlParam {
    fn from(v: serde_json::Value) -> Self {
        SqlParam::Json(v)
    }
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}
