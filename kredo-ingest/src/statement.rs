//! One statement through the whole reconstruction pipeline.

use kredo_core::{FooterTotals, PageTokens, ParseError, Record, Result, StatementMeta, Transaction};
use log::info;
use serde::Serialize;

use crate::footer::extract_footer_totals;
use crate::header::resolve_layout;
use crate::layout::{cluster_lines, normalize_tokens};
use crate::meta::extract_meta;
use crate::project::project;
use crate::rows::reconstruct_rows;
use crate::schema::CompiledSchema;

/// Reconstructed table of one statement. `records[i]` is the raw row behind
/// `transactions[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedStatement {
    pub schema_name: String,
    /// Canonical column names in schema order.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
    pub transactions: Vec<Transaction>,
    pub footer: FooterTotals,
    pub meta: StatementMeta,
    pub header_hits: usize,
}

impl ParsedStatement {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Tokens -> lines -> header/bands -> records -> transactions.
///
/// Fails only when there is nothing to read or the header cannot be found;
/// a statement whose table holds no rows is a success with zero transactions.
pub fn parse_statement(pages: &[PageTokens], schema: &CompiledSchema) -> Result<ParsedStatement> {
    let tokens = normalize_tokens(pages);
    if tokens.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    let lines = cluster_lines(&tokens, schema.schema().line_tolerance);
    let layout = resolve_layout(&lines, schema)?;

    let mut records = Vec::new();
    let mut transactions = Vec::new();
    for record in reconstruct_rows(&lines, &layout, schema) {
        if let Some(tx) = project(&record, schema) {
            records.push(record);
            transactions.push(tx);
        }
    }
    let footer = extract_footer_totals(&lines, &layout, schema);
    let meta = extract_meta(&lines, &layout);

    info!(
        "{}: {} pages, {} lines, {} transactions",
        schema.name(),
        pages.len(),
        lines.len(),
        transactions.len()
    );

    Ok(ParsedStatement {
        schema_name: schema.name().to_string(),
        columns: schema.schema().column_names(),
        records,
        transactions,
        footer,
        meta,
        header_hits: layout.header.hits,
    })
}
