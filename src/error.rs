//! Error types for predicate translation.

use thiserror::Error;

/// Failure of a single `translate` call. No partial output is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("unsupported node: {0}")]
    UnsupportedNode(String),

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("unsupported value type: {0}")]
    UnsupportedValueType(String),

    #[error("cannot resolve value: {0}")]
    ValueResolutionError(String),
}

pub type Result<T> = std::result::Result<T, TranslateError>;
