//! Error type shared by the parsing pipeline.
//!
//! Only structural failures live here. Soft problems (a record missing its
//! date, an unparsable amount) are absorbed by the pipeline and never become
//! an error value.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// No header candidate cleared even the permissive anchor threshold.
    /// The statement is unparsable with this schema.
    #[error("transaction table header not found (best candidate matched {best_hits} anchors, needed {required})")]
    HeaderNotFound { best_hits: usize, required: usize },

    #[error("statement has no text tokens")]
    EmptyInput,

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("unknown bank: {0}")]
    UnknownBank(String),
}

impl ParseError {
    /// True when the failure means "this layout does not fit", as opposed to a
    /// configuration problem on the caller's side.
    pub fn is_table_not_found(&self) -> bool {
        matches!(self, ParseError::HeaderNotFound { .. } | ParseError::EmptyInput)
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
