//! Flat CSV forms of the four output tables.
//!
//! Every writer emits the header row first, even for an empty table, and
//! keeps a fixed column order so repeated runs produce identical bytes.

use std::io::Write;

use csv::WriterBuilder;
use kredo_core::{Record, Transaction};
use thiserror::Error;

use crate::aggregate::{IncomeSummary, MonthlyBucket};
use crate::rules::ClassificationFlags;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{records} records, {transactions} transactions, {flags} classification rows")]
    LengthMismatch {
        records: usize,
        transactions: usize,
        flags: usize,
    },
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Fields pulled out of the counterparty and purpose cells.
pub const DERIVED_COLUMNS: [&str; 3] = ["counterparty_id", "counterparty_account", "payment_code"];

pub const FLAG_COLUMNS: [&str; 6] = [
    "knp_normalized",
    "is_non_business_by_code",
    "is_non_business_by_keyword",
    "is_non_business",
    "credit_amount",
    "is_business_income",
];

pub const MONTHLY_COLUMNS: [&str; 3] = ["month", "business_income_sum", "transaction_count"];

pub const SUMMARY_COLUMNS: [&str; 7] = [
    "total_sum",
    "max_transaction",
    "min_transaction",
    "mean_transaction",
    "transactions_used",
    "adjusted_income",
    "formula",
];

/// Renders like the serialized monthly and summary tables (`0.0`, `1500.5`).
fn float_cell(v: f64) -> String {
    format!("{v:?}")
}

fn writer<W: Write>(w: W) -> csv::Writer<W> {
    WriterBuilder::new().has_headers(false).from_writer(w)
}

/// Raw reconstructed table in schema column order.
pub fn write_records<W: Write>(w: W, columns: &[String], records: &[Record]) -> Result<()> {
    let mut out = writer(w);
    out.write_record(columns)?;
    for record in records {
        out.write_record(record.row(columns))?;
    }
    out.flush()?;
    Ok(())
}

/// Raw table with the derived and classification columns appended.
/// `transactions` and `flags` must be aligned with `records`.
pub fn write_classified<W: Write>(
    w: W,
    columns: &[String],
    records: &[Record],
    transactions: &[Transaction],
    flags: &[ClassificationFlags],
) -> Result<()> {
    if records.len() != flags.len() || records.len() != transactions.len() {
        return Err(ExportError::LengthMismatch {
            records: records.len(),
            transactions: transactions.len(),
            flags: flags.len(),
        });
    }
    let mut out = writer(w);
    out.write_record(
        columns
            .iter()
            .map(String::as_str)
            .chain(DERIVED_COLUMNS)
            .chain(FLAG_COLUMNS),
    )?;
    for ((record, tx), f) in records.iter().zip(transactions).zip(flags) {
        let appended = [
            tx.counterparty_id.clone().unwrap_or_default(),
            tx.counterparty_account.clone().unwrap_or_default(),
            tx.payment_code.clone(),
            f.knp_normalized.clone(),
            f.is_non_business_by_code.to_string(),
            f.is_non_business_by_keyword.to_string(),
            f.is_non_business.to_string(),
            float_cell(f.credit_amount),
            f.is_business_income.to_string(),
        ];
        let row: Vec<&str> = record
            .row(columns)
            .into_iter()
            .chain(appended.iter().map(String::as_str))
            .collect();
        out.write_record(row)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_monthly<W: Write>(w: W, buckets: &[MonthlyBucket]) -> Result<()> {
    let mut out = writer(w);
    out.write_record(MONTHLY_COLUMNS)?;
    for bucket in buckets {
        out.serialize(bucket)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_summary<W: Write>(w: W, summary: &IncomeSummary) -> Result<()> {
    let mut out = writer(w);
    out.write_record(SUMMARY_COLUMNS)?;
    out.serialize(summary)?;
    out.flush()?;
    Ok(())
}
