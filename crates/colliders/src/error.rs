//! Crate-level error type

use thiserror::Error;

use crate::config::ConfigError;
use crate::enumeration::{HandoffError, PoolError};
use crate::shapes::ShapeError;
use crate::world::QueryError;

/// Any failure surfaced by this crate
#[derive(Error, Debug)]
pub enum CollidersError {
    /// Configuration could not be loaded, saved or validated
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The world query service refused a request
    #[error("World query error: {0}")]
    Query(#[from] QueryError),

    /// A shape was built from invalid parameters
    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    /// Enumeration results had nowhere to go
    #[error("Hand-off error: {0}")]
    Handoff(#[from] HandoffError),

    /// Enumeration workers could not be started
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Result alias using [`CollidersError`]
pub type Result<T> = std::result::Result<T, CollidersError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::CellPos;

    fn denied() -> Result<()> {
        Err(QueryError::CellAccessDenied(CellPos::new(1, 2, 3)))?;
        Ok(())
    }

    #[test]
    fn test_query_errors_convert() {
        let err = denied().unwrap_err();
        assert!(matches!(err, CollidersError::Query(QueryError::CellAccessDenied(_))));
        assert_eq!(err.to_string(), "World query error: Cell access denied at (1, 2, 3)");
    }
}
