//! Query-string row filters for the table-style REST API.
//!
//! Filters render as `column=op.value` pairs and are handed to
//! `reqwest::RequestBuilder::query`, which takes care of URL encoding.

use chrono::{DateTime, SecondsFormat, Utc};

/// A single row predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column=eq.value`
    Eq(&'static str, String),
    /// `column=ilike.value` (case-insensitive pattern)
    ILike(&'static str, String),
    /// `column=gte.value`
    Gte(&'static str, String),
}

impl Filter {
    pub fn eq(column: &'static str, value: impl ToString) -> Self {
        Filter::Eq(column, value.to_string())
    }

    pub fn ilike(column: &'static str, pattern: impl ToString) -> Self {
        Filter::ILike(column, pattern.to_string())
    }

    /// `column >= timestamp`, rendered as RFC 3339 in UTC
    pub fn since(column: &'static str, at: DateTime<Utc>) -> Self {
        Filter::Gte(column, at.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    /// Render as a `(key, value)` query pair
    pub fn to_pair(&self) -> (String, String) {
        match self {
            Filter::Eq(column, value) => (column.to_string(), format!("eq.{value}")),
            Filter::ILike(column, value) => (column.to_string(), format!("ilike.{value}")),
            Filter::Gte(column, value) => (column.to_string(), format!("gte.{value}")),
        }
    }
}

/// Render a filter list plus a `select` projection
pub fn query_pairs(filters: &[Filter], select: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = filters.iter().map(Filter::to_pair).collect();
    pairs.push(("select".to_string(), select.to_string()));
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_rendering() {
        assert_eq!(
            Filter::eq("hospital_id", "010001").to_pair(),
            ("hospital_id".to_string(), "eq.010001".to_string())
        );
        assert_eq!(
            Filter::ilike("hosp_name", "*mercy*").to_pair(),
            ("hosp_name".to_string(), "ilike.*mercy*".to_string())
        );

        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(
            Filter::since("created_at", at).to_pair(),
            ("created_at".to_string(), "gte.2023-11-14T22:13:20Z".to_string())
        );
    }

    #[test]
    fn test_query_pairs_appends_select() {
        let pairs = query_pairs(&[Filter::eq("user_id", "u1")], "*");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1], ("select".to_string(), "*".to_string()));
    }
}
