//! Date helpers: pulling a calendar date out of a statement cell and simple
//! month arithmetic used by income windows.

use chrono::{Datelike, Months, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

fn dmy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{2})[./](\d{2})[./](\d{4}|\d{2})").expect("dmy regex"))
}

fn iso_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("iso regex"))
}

/// Find the first calendar date in a cell such as `30.09.2024 14:02:11`,
/// `30.09.24` or `2024-09-30`. Two-digit years are taken as 20xx.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = iso_re().captures(text) {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            return Some(date);
        }
    }

    let caps = dmy_re().captures(text)?;
    let d: u32 = caps[1].parse().ok()?;
    let m: u32 = caps[2].parse().ok()?;
    let y_raw = &caps[3];
    let mut y: i32 = y_raw.parse().ok()?;
    if y_raw.len() == 2 {
        y += 2000;
    }
    NaiveDate::from_ymd_opt(y, m, d)
}

/// `YYYY-MM` bucket key.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month preceding `date`'s month.
pub fn last_day_of_previous_month(date: NaiveDate) -> NaiveDate {
    first_day_of_month(date).pred_opt().unwrap_or(date)
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    first_day_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

/// First day of the month `n` months before `date`'s month.
pub fn months_back_start(date: NaiveDate, n: u32) -> NaiveDate {
    let first = first_day_of_month(date);
    first.checked_sub_months(Months::new(n)).unwrap_or(first)
}
