//! WHERE-clause builder shared by the count and page queries.

use domain::models::{Filter, FilterValue};

use crate::entity::Entity;
use crate::error::RepositoryError;

/// Helper struct for building dynamic WHERE clauses from declarative filters.
/// Tracks conditions and parameter positions so the count and page queries
/// bind exactly the same values.
pub(crate) struct FilterBuilder {
    conditions: Vec<String>,
    values: Vec<FilterValue>,
    param_count: usize,
}

impl FilterBuilder {
    /// Builds the predicate for `E`, qualifying columns with `alias`.
    ///
    /// Placeholders start after `offset` already-bound parameters.
    pub(crate) fn build<E: Entity>(
        filters: &[Filter],
        alias: &str,
        offset: usize,
    ) -> Result<Self, RepositoryError> {
        let mut builder = Self {
            conditions: Vec::new(),
            values: Vec::new(),
            param_count: offset,
        };

        for filter in filters {
            for column in filter.columns() {
                if !E::COLUMNS.contains(&column) {
                    return Err(RepositoryError::InvalidPayload(format!(
                        "{} cannot be filtered by '{}'",
                        E::NAME,
                        column
                    )));
                }
            }

            match filter {
                Filter::Eq { column, value } => {
                    let p = builder.push(value.clone());
                    builder.conditions.push(format!("{alias}.{column} = ${p}"));
                }
                Filter::Range { column, gte, lte } => {
                    if let Some(gte) = gte {
                        let p = builder.push(gte.clone());
                        builder.conditions.push(format!("{alias}.{column} >= ${p}"));
                    }
                    if let Some(lte) = lte {
                        let p = builder.push(lte.clone());
                        builder.conditions.push(format!("{alias}.{column} <= ${p}"));
                    }
                }
                Filter::In { column, values } => {
                    let placeholders: Vec<String> = values
                        .iter()
                        .map(|v| format!("${}", builder.push(v.clone())))
                        .collect();
                    if placeholders.is_empty() {
                        builder.conditions.push("FALSE".to_string());
                    } else {
                        builder
                            .conditions
                            .push(format!("{alias}.{column} IN ({})", placeholders.join(", ")));
                    }
                }
                Filter::Search { columns, term } => {
                    let p = builder.push(FilterValue::Text(like_pattern(term)));
                    let any: Vec<String> = columns
                        .iter()
                        .map(|c| format!("{alias}.{c} ILIKE ${p}"))
                        .collect();
                    builder.conditions.push(format!("({})", any.join(" OR ")));
                }
            }
        }

        Ok(builder)
    }

    fn push(&mut self, value: FilterValue) -> usize {
        self.values.push(value);
        self.param_count += 1;
        self.param_count
    }

    /// Get the WHERE clause as a string.
    pub(crate) fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            "TRUE".to_string()
        } else {
            self.conditions.join(" AND ")
        }
    }

    /// Get the current parameter count.
    pub(crate) fn param_count(&self) -> usize {
        self.param_count
    }

    pub(crate) fn values(&self) -> &[FilterValue] {
        &self.values
    }
}

/// Wraps a search term for a substring `ILIKE`, escaping wildcards.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Macro to bind filter values to a SQLx builder.
/// Works for `query`, `query_as` and `query_scalar` builders alike.
macro_rules! bind_filter_values {
    ($builder:expr, $values:expr) => {{
        let mut b = $builder;
        for value in $values {
            b = match value {
                domain::models::FilterValue::Uuid(v) => b.bind(*v),
                domain::models::FilterValue::Text(v) => b.bind(v.clone()),
                domain::models::FilterValue::Int(v) => b.bind(*v),
                domain::models::FilterValue::Bool(v) => b.bind(*v),
                domain::models::FilterValue::Timestamp(v) => b.bind(*v),
            };
        }
        b
    }};
}

pub(crate) use bind_filter_values;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::DeviceEntity;
    use domain::models::Filters;
    use uuid::Uuid;

    #[test]
    fn test_empty_filters_match_everything() {
        let builder = FilterBuilder::build::<DeviceEntity>(&[], "t", 0).unwrap();
        assert_eq!(builder.where_clause(), "TRUE");
        assert_eq!(builder.param_count(), 0);
    }

    #[test]
    fn test_placeholders_are_numbered_in_order() {
        let filters = Filters::new()
            .eq("site_id", Some(Uuid::new_v4()))
            .any_of("status", Some(vec!["active".to_string(), "offline".to_string()]))
            .search(&["name", "serial"], Some("core"))
            .build();

        let builder = FilterBuilder::build::<DeviceEntity>(&filters, "t", 0).unwrap();
        assert_eq!(
            builder.where_clause(),
            "t.site_id = $1 AND t.status IN ($2, $3) AND (t.name ILIKE $4 OR t.serial ILIKE $4)"
        );
        assert_eq!(builder.param_count(), 4);
        assert_eq!(builder.values().len(), 4);
    }

    #[test]
    fn test_offset_shifts_placeholders() {
        let filters = Filters::new()
            .range("created_at", None, Some(chrono::Utc::now()))
            .build();
        let builder = FilterBuilder::build::<DeviceEntity>(&filters, "t", 2).unwrap();
        assert_eq!(builder.where_clause(), "t.created_at <= $3");
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let filters = Filters::new().eq("owner", Some("me")).build();
        let err = FilterBuilder::build::<DeviceEntity>(&filters, "t", 0)
            .err()
            .unwrap();
        assert!(matches!(err, RepositoryError::InvalidPayload(_)));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("10%_off"), "%10\\%\\_off%");
    }
}
