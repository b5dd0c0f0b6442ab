//! Declarative list filters.
//!
//! Query shapes translate their optional parameters into a list of [`Filter`]s;
//! the repository turns those into one SQL predicate shared by the count and
//! page queries.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared::pagination::PageRequest;

/// A typed value bound into a filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Uuid(Uuid),
    Text(String),
    Int(i64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl From<Uuid> for FilterValue {
    fn from(v: Uuid) -> Self {
        FilterValue::Uuid(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Int(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        FilterValue::Int(v as i64)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Bool(v)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(v: DateTime<Utc>) -> Self {
        FilterValue::Timestamp(v)
    }
}

/// A single predicate over entity columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq {
        column: &'static str,
        value: FilterValue,
    },
    /// `column >= gte AND column <= lte`, either bound optional.
    Range {
        column: &'static str,
        gte: Option<FilterValue>,
        lte: Option<FilterValue>,
    },
    /// `column IN (values...)`
    In {
        column: &'static str,
        values: Vec<FilterValue>,
    },
    /// Case-insensitive substring match across any of `columns`.
    Search {
        columns: &'static [&'static str],
        term: String,
    },
}

impl Filter {
    /// Columns this filter touches.
    pub fn columns(&self) -> Vec<&'static str> {
        match self {
            Filter::Eq { column, .. } | Filter::Range { column, .. } | Filter::In { column, .. } => {
                vec![*column]
            }
            Filter::Search { columns, .. } => columns.to_vec(),
        }
    }
}

/// Builder that skips absent query parameters.
#[derive(Debug, Default)]
pub struct Filters(Vec<Filter>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq<V: Into<FilterValue>>(mut self, column: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.0.push(Filter::Eq {
                column,
                value: value.into(),
            });
        }
        self
    }

    pub fn range<V: Into<FilterValue>>(
        mut self,
        column: &'static str,
        gte: Option<V>,
        lte: Option<V>,
    ) -> Self {
        if gte.is_some() || lte.is_some() {
            self.0.push(Filter::Range {
                column,
                gte: gte.map(Into::into),
                lte: lte.map(Into::into),
            });
        }
        self
    }

    /// Membership filter; an empty list is ignored rather than matching nothing.
    pub fn any_of<V: Into<FilterValue>>(
        mut self,
        column: &'static str,
        values: Option<Vec<V>>,
    ) -> Self {
        if let Some(values) = values {
            if !values.is_empty() {
                self.0.push(Filter::In {
                    column,
                    values: values.into_iter().map(Into::into).collect(),
                });
            }
        }
        self
    }

    pub fn search(mut self, columns: &'static [&'static str], term: Option<&str>) -> Self {
        if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
            self.0.push(Filter::Search {
                columns,
                term: term.to_string(),
            });
        }
        self
    }

    pub fn build(self) -> Vec<Filter> {
        self.0
    }
}

/// Splits a comma-separated query parameter (`status=active,planned`).
pub fn split_list(value: Option<&str>) -> Option<Vec<String>> {
    value.map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
}

/// A list query: its filters plus the requested page.
pub trait QueryShape {
    fn filters(&self) -> Vec<Filter>;
    fn page_request(&self) -> PageRequest;
}

impl QueryShape for () {
    fn filters(&self) -> Vec<Filter> {
        Vec::new()
    }

    fn page_request(&self) -> PageRequest {
        PageRequest::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_values_are_skipped() {
        let filters = Filters::new()
            .eq::<String>("name", None)
            .range::<i64>("mtu", None, None)
            .any_of::<String>("status", None)
            .search(&["name"], None)
            .build();
        assert!(filters.is_empty());
    }

    #[test]
    fn test_present_values_are_kept_in_order() {
        let site = Uuid::new_v4();
        let filters = Filters::new()
            .eq("site_id", Some(site))
            .range("mtu", Some(1500i64), None)
            .any_of("status", Some(vec!["active", "planned"]))
            .search(&["name", "serial"], Some("  core "))
            .build();

        assert_eq!(filters.len(), 4);
        assert_eq!(
            filters[0],
            Filter::Eq {
                column: "site_id",
                value: FilterValue::Uuid(site)
            }
        );
        assert_eq!(
            filters[3],
            Filter::Search {
                columns: &["name", "serial"],
                term: "core".to_string()
            }
        );
        assert_eq!(filters[3].columns(), vec!["name", "serial"]);
    }

    #[test]
    fn test_empty_membership_and_blank_search_ignored() {
        let filters = Filters::new()
            .any_of::<String>("status", Some(vec![]))
            .search(&["name"], Some("   "))
            .build();
        assert!(filters.is_empty());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(Some("active, planned,,")),
            Some(vec!["active".to_string(), "planned".to_string()])
        );
        assert_eq!(split_list(None), None);
    }

    #[test]
    fn test_unit_query_shape() {
        assert!(().filters().is_empty());
        assert_eq!(().page_request(), PageRequest::default());
    }
}
