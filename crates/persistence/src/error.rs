//! Repository error taxonomy.

use thiserror::Error;

use crate::registry::RegistryError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Errors surfaced by the generic repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    ReferentialConflict(String),

    /// The audit row could not be produced or written. The enclosing
    /// transaction has been rolled back.
    #[error("Audit write failed: {0}")]
    AuditWriteFailure(String),

    #[error("Unknown relation '{relation}' for {entity}")]
    UnknownRelation {
        entity: &'static str,
        relation: String,
    },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl RepositoryError {
    /// Maps an error raised while deleting a row.
    ///
    /// A foreign key violation here means another row still references the
    /// target through a restricting relation.
    pub fn from_delete(err: sqlx::Error, entity: &str) -> Self {
        match sqlstate(&err).as_deref() {
            Some(FOREIGN_KEY_VIOLATION) => RepositoryError::ReferentialConflict(format!(
                "{} is still referenced by other records",
                entity
            )),
            _ => err.into(),
        }
    }

    pub fn audit(err: impl std::fmt::Display) -> Self {
        RepositoryError::AuditWriteFailure(err.to_string())
    }
}

/// Maps errors raised while inserting or updating rows.
impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match sqlstate(&err).as_deref() {
            Some(UNIQUE_VIOLATION) => {
                RepositoryError::AlreadyExists(constraint_message(&err, "Resource already exists"))
            }
            Some(FOREIGN_KEY_VIOLATION) => RepositoryError::NotFound(constraint_message(
                &err,
                "Referenced resource not found",
            )),
            _ => RepositoryError::Database(err),
        }
    }
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

fn constraint_message(err: &sqlx::Error, fallback: &str) -> String {
    match err {
        sqlx::Error::Database(db_err) => match db_err.constraint() {
            Some(constraint) => format!("{} ({})", fallback, constraint),
            None => fallback.to_string(),
        },
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_pass_through() {
        let err: RepositoryError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::RowNotFound)));

        let err = RepositoryError::from_delete(sqlx::Error::PoolTimedOut, "Site");
        assert!(matches!(err, RepositoryError::Database(sqlx::Error::PoolTimedOut)));
    }

    #[test]
    fn test_messages() {
        let err = RepositoryError::UnknownRelation {
            entity: "Device",
            relation: "owner".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown relation 'owner' for Device");

        let err = RepositoryError::audit("insert failed");
        assert_eq!(err.to_string(), "Audit write failed: insert failed");
    }
}
