//! Error types.
//!
//! Aggregation only ever fails with [`ImpactError`]. Dataset loading and usage
//! estimation have their own enums so callers can tell a bad input file from
//! a view that cannot be computed.

use crate::models::{Metric, QueryType};

/// Failure of a numeric aggregation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImpactError {
    #[error("division by zero in {operation}")]
    DivisionByZero { operation: &'static str },

    #[error("{operation} requires at least one entry")]
    EmptyInput { operation: &'static str },
}

/// An identifier that is not one of the supported query types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown query type '{0}' (expected one of: text, code, image, audio, video)")]
pub struct UnknownQueryType(pub String);

/// The provider dataset violates its input contract.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    #[error(transparent)]
    UnknownQueryType(#[from] UnknownQueryType),

    #[error("empty identifier in {field}")]
    EmptyIdentifier { field: &'static str },

    #[error("model '{0}' is listed more than once")]
    DuplicateModel(String),

    #[error("query type '{0}' is listed more than once")]
    DuplicateQueryType(QueryType),

    #[error("no statistics for model '{0}'")]
    MissingModelStats(String),

    #[error("no statistics for query type '{0}'")]
    MissingQueryTypeStats(QueryType),

    #[error("invalid {metric} value {value} for '{subject}' (must be finite and >= 0)")]
    InvalidValue {
        subject: String,
        metric: Metric,
        value: f64,
    },

    #[error("combination row references unknown model '{0}'")]
    UnknownCombinationModel(String),

    #[error("combination '{model}' + '{query_type}' is defined more than once")]
    DuplicateCombination { model: String, query_type: QueryType },
}

/// A usage estimate could not be produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UsageError {
    #[error("a model must be selected")]
    EmptyModel,

    #[error("quantity must be a positive number, got {0}")]
    InvalidQuantity(f64),

    #[error("model '{0}' not found in dataset")]
    UnknownModel(String),

    #[error(transparent)]
    Impact(#[from] ImpactError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impact_error_messages() {
        let err = ImpactError::DivisionByZero {
            operation: "efficiency_score",
        };
        assert_eq!(err.to_string(), "division by zero in efficiency_score");

        let err = ImpactError::EmptyInput {
            operation: "percentage_of",
        };
        assert!(err.to_string().contains("at least one entry"));
    }

    #[test]
    fn test_usage_error_wraps_impact_error() {
        let err: UsageError = ImpactError::DivisionByZero { operation: "x" }.into();
        assert_eq!(err.to_string(), "division by zero in x");
    }
}
