//! kredo-ingest: positioned statement tokens -> reconstructed transaction table.
//!
//! The pipeline is bank-agnostic; banks differ only in the `Schema` they hand
//! to it (see `parsers`).

pub mod footer;
pub mod header;
pub mod layout;
pub mod meta;
pub mod parsers;
pub mod project;
pub mod rows;
pub mod schema;
pub mod statement;

pub use parsers::{detect_bank, parse_with_schema, parser_for, Bank, StatementParser};
pub use schema::{CompiledSchema, FieldKind, FieldRole, FieldSpec, RowStart, Schema};
pub use statement::{parse_statement, ParsedStatement};
