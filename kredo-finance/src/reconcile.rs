//! Parsed turnovers against the totals and balances the statement prints.

use kredo_core::{FooterTotals, StatementMeta, Transaction};
use log::{info, warn};
use serde::Serialize;

pub const TOLERANCE: f64 = 0.01;

/// One printed figure the parsed transactions disagree with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mismatch {
    FooterDebit,
    FooterCredit,
    HeaderDebitTurnover,
    HeaderCreditTurnover,
    /// opening + credits - debits differs from the printed closing balance.
    ClosingBalance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub parsed_debit: f64,
    pub parsed_credit: f64,
    pub footer_debit: Option<f64>,
    pub footer_credit: Option<f64>,
    /// parsed minus footer; `None` when the footer lacks that side.
    pub debit_delta: Option<f64>,
    pub credit_delta: Option<f64>,
    pub opening_balance: Option<f64>,
    pub closing_balance: Option<f64>,
    /// opening + credits - debits; `None` without an opening balance.
    pub computed_closing: Option<f64>,
    pub mismatches: Vec<Mismatch>,
    pub ok: bool,
}

/// Sums both sides (unreadable amounts count as zero) and compares them with
/// every figure the statement prints: footer totals, header turnovers and
/// the closing balance. A figure the statement does not print is not held
/// against `ok`.
pub fn reconcile(transactions: &[Transaction], footer: &FooterTotals, meta: &StatementMeta) -> ReconciliationReport {
    let parsed_debit: f64 = transactions.iter().filter_map(Transaction::debit_value).sum();
    let parsed_credit: f64 = transactions.iter().filter_map(Transaction::credit_value).sum();

    let debit_delta = footer.total_debit.map(|f| parsed_debit - f);
    let credit_delta = footer.total_credit.map(|f| parsed_credit - f);
    let computed_closing = meta.opening_balance.map(|o| o + parsed_credit - parsed_debit);

    let off = |parsed: Option<f64>, printed: Option<f64>| match (parsed, printed) {
        (Some(a), Some(b)) => (a - b).abs() > TOLERANCE,
        _ => false,
    };
    let mut mismatches = Vec::new();
    for (bad, kind) in [
        (debit_delta.is_some_and(|d| d.abs() > TOLERANCE), Mismatch::FooterDebit),
        (credit_delta.is_some_and(|d| d.abs() > TOLERANCE), Mismatch::FooterCredit),
        (off(Some(parsed_debit), meta.debit_turnover), Mismatch::HeaderDebitTurnover),
        (off(Some(parsed_credit), meta.credit_turnover), Mismatch::HeaderCreditTurnover),
        (off(computed_closing, meta.closing_balance), Mismatch::ClosingBalance),
    ] {
        if bad {
            mismatches.push(kind);
        }
    }
    let ok = mismatches.is_empty();

    if ok {
        info!("reconciled: debit {parsed_debit:.2}, credit {parsed_credit:.2}");
    } else {
        warn!(
            "reconciliation failed {mismatches:?}: debit {parsed_debit:.2} vs {:?}, credit {parsed_credit:.2} vs {:?}, closing {computed_closing:?} vs {:?}",
            footer.total_debit, footer.total_credit, meta.closing_balance
        );
    }

    ReconciliationReport {
        parsed_debit,
        parsed_credit,
        footer_debit: footer.total_debit,
        footer_credit: footer.total_credit,
        debit_delta,
        credit_delta,
        opening_balance: meta.opening_balance,
        closing_balance: meta.closing_balance,
        computed_closing,
        mismatches,
        ok,
    }
}
