//! Monthly buckets and the adjusted-income summary.

use std::collections::BTreeMap;

use kredo_core::time::month_key;
use kredo_core::Transaction;
use log::info;
use serde::{Deserialize, Serialize};

use crate::rules::{classify_all, ClassificationFlags, IncomeRuleConfig};
use crate::window::{IncomeWindow, WindowSpec};

pub const SUMMARY_FORMULA: &str = "sum - max - min + sum/6";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    /// `YYYY-MM`
    pub month: String,
    pub business_income_sum: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeSummary {
    pub total_sum: f64,
    pub max_transaction: f64,
    pub min_transaction: f64,
    pub mean_transaction: f64,
    pub transactions_used: usize,
    pub adjusted_income: f64,
    pub formula: String,
}

impl IncomeSummary {
    /// Summary of the given inflows: `S - M - m + S/6`, all zero when empty.
    pub fn from_amounts(amounts: &[f64]) -> Self {
        if amounts.is_empty() {
            return Self {
                total_sum: 0.0,
                max_transaction: 0.0,
                min_transaction: 0.0,
                mean_transaction: 0.0,
                transactions_used: 0,
                adjusted_income: 0.0,
                formula: SUMMARY_FORMULA.to_string(),
            };
        }
        let total: f64 = amounts.iter().sum();
        let max = amounts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = amounts.iter().copied().fold(f64::INFINITY, f64::min);
        Self {
            total_sum: total,
            max_transaction: max,
            min_transaction: min,
            mean_transaction: total / amounts.len() as f64,
            transactions_used: amounts.len(),
            adjusted_income: total - max - min + total / 6.0,
            formula: SUMMARY_FORMULA.to_string(),
        }
    }
}

/// Business-income rows inside `window`, bucketed by operation month.
pub fn aggregate(
    transactions: &[Transaction],
    flags: &[ClassificationFlags],
    window: Option<IncomeWindow>,
) -> (Vec<MonthlyBucket>, IncomeSummary) {
    let mut buckets: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let mut amounts = Vec::new();

    for (tx, f) in transactions.iter().zip(flags) {
        if !f.is_business_income {
            continue;
        }
        if window.is_some_and(|w| !w.contains(tx.operation_date)) {
            continue;
        }
        let entry = buckets.entry(month_key(tx.operation_date)).or_insert((0.0, 0));
        entry.0 += f.credit_amount;
        entry.1 += 1;
        amounts.push(f.credit_amount);
    }

    let monthly = buckets
        .into_iter()
        .map(|(month, (sum, count))| MonthlyBucket {
            month,
            business_income_sum: sum,
            transaction_count: count,
        })
        .collect();
    (monthly, IncomeSummary::from_amounts(&amounts))
}

/// Classification, window and aggregation for one statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeReport {
    pub window: Option<IncomeWindow>,
    pub flags: Vec<ClassificationFlags>,
    pub monthly: Vec<MonthlyBucket>,
    pub summary: IncomeSummary,
}

impl IncomeReport {
    /// True when the table had rows but none qualified as income.
    pub fn has_no_income(&self) -> bool {
        self.summary.transactions_used == 0
    }
}

pub fn compute_income(
    transactions: &[Transaction],
    cfg: &IncomeRuleConfig,
    window: WindowSpec,
    mask: Option<&[bool]>,
) -> IncomeReport {
    let flags = classify_all(transactions, cfg, mask);
    let latest = transactions.iter().map(|tx| tx.operation_date).max();
    let window = window.resolve(latest);
    let (monthly, summary) = aggregate(transactions, &flags, window);

    match window {
        Some(w) => info!(
            "income window {}..={}: {} rows, {} months",
            w.start_date,
            w.end_date,
            summary.transactions_used,
            monthly.len()
        ),
        None => info!("income over whole statement: {} rows, {} months", summary.transactions_used, monthly.len()),
    }

    IncomeReport {
        window,
        flags,
        monthly,
        summary,
    }
}
