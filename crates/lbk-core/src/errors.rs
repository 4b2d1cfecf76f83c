//! Error types for the kiosk core.
//!
//! Nothing in this crate is fatal to the process: a missed card read is a
//! normal timeout outcome, and an unreadable catalog file degrades to an
//! empty collection (logged, not raised).

use thiserror::Error;

use crate::types::CardUid;

/// Errors from catalog persistence.
#[derive(Debug, Error, Clone)]
pub enum CatalogError {
    /// The backing store could not persist a collection. Surfaced to the
    /// caller, never retried.
    #[error("write failure: {0}")]
    WriteFailure(String),

    /// A catalog document failed structural parse on load. Recovered locally
    /// by substituting an empty collection; this value exists so the recovery
    /// is visible in logs rather than silent.
    #[error("malformed catalog document {file}: {detail}")]
    Malformed { file: String, detail: String },
}

/// Business-rule violations from the circulation workflow.
///
/// These abort the operation with no partial mutation of the catalog.
#[derive(Debug, Error, Clone)]
pub enum CirculationError {
    #[error("book {0} is already borrowed")]
    AlreadyBorrowed(String),

    #[error("book {0} is not currently borrowed")]
    NotBorrowed(String),

    #[error("card {0} is already registered to a user or book")]
    DuplicateIdentifier(CardUid),

    #[error("unknown book {0}")]
    UnknownBook(String),

    #[error(transparent)]
    Store(#[from] CatalogError),
}

/// Unified error type for kiosk core operations.
#[derive(Debug, Error, Clone)]
pub enum CoreError {
    /// Required request input was absent - caller error.
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Circulation(#[from] CirculationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circulation_errors_render_the_offending_id() {
        let err = CirculationError::AlreadyBorrowed("B001".into());
        assert_eq!(err.to_string(), "book B001 is already borrowed");

        let err = CirculationError::DuplicateIdentifier(CardUid::new("04A3FF12"));
        assert!(err.to_string().contains("04A3FF12"));
    }

    #[test]
    fn store_error_flows_into_circulation_error() {
        let err: CirculationError = CatalogError::WriteFailure("disk full".into()).into();
        assert!(matches!(err, CirculationError::Store(_)));
    }
}
