//! Income window selection.

use chrono::NaiveDate;
use kredo_core::time::{last_day_of_month, last_day_of_previous_month, months_back_start};
use serde::{Deserialize, Serialize};

/// Inclusive date range of operations counted as income.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    /// Window closes on the last day of the month before the anchor.
    #[default]
    Production,
    /// Window closes with the anchor's own month.
    Test,
}

impl IncomeWindow {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self { start_date, end_date }
    }

    /// `months` whole months ending relative to `anchor`.
    pub fn trailing(anchor: NaiveDate, months: u32, mode: WindowMode) -> Self {
        let end_date = match mode {
            WindowMode::Production => last_day_of_previous_month(anchor),
            WindowMode::Test => last_day_of_month(anchor),
        };
        Self::ending_at(end_date, months)
    }

    /// `months` calendar months back from `end_date`, which stays as given.
    pub fn ending_at(end_date: NaiveDate, months: u32) -> Self {
        Self {
            start_date: months_back_start(end_date, months.saturating_sub(1)),
            end_date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// How the caller wants the window chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowSpec {
    /// No restriction.
    #[default]
    All,
    Explicit { start: NaiveDate, end: NaiveDate },
    Trailing { anchor: NaiveDate, months: u32, mode: WindowMode },
    /// Trailing window ending at the statement's latest operation.
    TrailingFromLatest { months: u32 },
}

impl WindowSpec {
    /// Concrete window; `latest` is the newest operation date of any kind.
    /// `None` means every row counts.
    pub fn resolve(self, latest: Option<NaiveDate>) -> Option<IncomeWindow> {
        match self {
            WindowSpec::All => None,
            WindowSpec::Explicit { start, end } => Some(IncomeWindow::new(start, end)),
            WindowSpec::Trailing { anchor, months, mode } => Some(IncomeWindow::trailing(anchor, months, mode)),
            WindowSpec::TrailingFromLatest { months } => latest.map(|d| IncomeWindow::ending_at(d, months)),
        }
    }
}
