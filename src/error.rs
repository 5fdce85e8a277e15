//! Unified error type for c-macro-eval using thiserror

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the preprocessor
pub type Result<T> = std::result::Result<T, PreprocessorError>;

/// Preprocessor errors
///
/// Every variant is fatal for the unit being processed. Errors raised inside an
/// included unit propagate unchanged to the including unit.
#[derive(Error, Debug)]
pub enum PreprocessorError {
    /// An active `#error`, or an `#include` that cannot be followed
    #[error("directive error: {message}")]
    Directive { message: String },

    #[error("undefined symbol: {0}")]
    UndefinedSymbol(String),

    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("unbalanced conditional at line {line}: #endif without #if")]
    UnbalancedEndif { line: usize },

    #[error("unbalanced conditional at line {line}: {directive} without #if")]
    UnbalancedElse { line: usize, directive: String },

    #[error("{count} unclosed conditional block(s) at end of file")]
    UnclosedBlock { count: usize },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PreprocessorError {
    pub(crate) fn directive(message: impl Into<String>) -> Self {
        PreprocessorError::Directive {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_expression(message: impl Into<String>) -> Self {
        PreprocessorError::InvalidExpression(message.into())
    }
}
