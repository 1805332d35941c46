//! Reconstructed table rows and their typed projection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::amount::parse_amount;

/// One reconstructed table row: canonical column name -> raw cell text.
/// Cells keep the order in which the schema declares its columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    cells: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cell.
    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        let value = value.into();
        match self.cells.iter_mut().find(|(c, _)| c == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column.to_string(), value)),
        }
    }

    /// Cell text, `None` when the cell is absent or blank.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    /// Cell texts in the given column order, blank for missing cells.
    pub fn row<'a>(&'a self, columns: &'a [String]) -> Vec<&'a str> {
        columns.iter().map(|c| self.get(c).unwrap_or("")).collect()
    }
}

/// Raw amount text next to its parsed value. `value` is `None` when the text
/// could not be read, which is kept apart from a real zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountText {
    pub raw: String,
    pub value: Option<f64>,
}

impl AmountText {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            value: parse_amount(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Debit,
    Credit,
}

/// Typed view of one statement line. Exactly one of `debit`/`credit` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub operation_date: NaiveDate,
    pub value_date: Option<NaiveDate>,
    pub debit: Option<AmountText>,
    pub credit: Option<AmountText>,
    pub counterparty_name: String,
    /// IIN/BIN, 12 digits.
    pub counterparty_id: Option<String>,
    /// IIK/IBAN when the statement prints it inside the counterparty block.
    pub counterparty_account: Option<String>,
    pub purpose_text: String,
    /// KNP as printed; see the classifier for normalization.
    pub payment_code: String,
    pub document_no: String,
}

impl Transaction {
    pub fn side(&self) -> Side {
        if self.credit.is_some() {
            Side::Credit
        } else {
            Side::Debit
        }
    }

    pub fn debit_value(&self) -> Option<f64> {
        self.debit.as_ref().and_then(|a| a.value)
    }

    pub fn credit_value(&self) -> Option<f64> {
        self.credit.as_ref().and_then(|a| a.value)
    }

    pub fn debit_raw(&self) -> &str {
        self.debit.as_ref().map(|a| a.raw.as_str()).unwrap_or("")
    }

    pub fn credit_raw(&self) -> &str {
        self.credit.as_ref().map(|a| a.raw.as_str()).unwrap_or("")
    }
}

/// Turnover totals printed in the statement footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FooterTotals {
    pub total_debit: Option<f64>,
    pub total_credit: Option<f64>,
}

/// Account details and balances printed around the table. Every field is
/// optional: banks print different subsets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementMeta {
    /// Account holder as printed.
    pub owner: Option<String>,
    /// ИИН/БИН of the account holder.
    pub owner_id: Option<String>,
    /// KZ IBAN of the statement account.
    pub account: Option<String>,
    pub currency: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    /// Date the bank produced the statement.
    pub generated_on: Option<NaiveDate>,
    pub opening_balance: Option<f64>,
    pub closing_balance: Option<f64>,
    /// Turnovers printed in the header block, separate from footer totals.
    pub debit_turnover: Option<f64>,
    pub credit_turnover: Option<f64>,
}

impl StatementMeta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
