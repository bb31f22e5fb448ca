//! Row-level error types

use thiserror::Error;

/// Why a data row could not become a record.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    MissingField {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: {field} value {value:?} is not a number")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
}


/// Field text that is not a finite number.
#[derive(Debug, Error)]
#[error("not a finite number: {0:?}")]
pub struct ParseMoneyError(pub String);
