//! kredo-core: data model shared by the statement pipeline.
//!
//! Tokens come from an external PDF extractor; everything here is pure data
//! plus the small parsers (amounts, dates) every other crate needs.

pub mod amount;
pub mod error;
pub mod time;
pub mod token;
pub mod transaction;

pub use amount::{is_amount_fragment, parse_amount};
pub use error::{ParseError, Result};
pub use token::{Line, PageTokens, Token, Word, PAGE_Y_OFFSET};
pub use transaction::{AmountText, FooterTotals, Record, Side, StatementMeta, Transaction};
