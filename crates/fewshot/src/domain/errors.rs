//! Domain-specific errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Please fill: {field}.")]
    MissingRequiredField { field: &'static str },
    #[error("Index out of range. Enter 1–{count}.")]
    IndexOutOfRange { index: i64, count: usize },
    #[error("Please enter a valid integer index (got '{0}').")]
    InvalidIndex(String),
    #[error("No examples to export yet.")]
    EmptyDataset,
}
