//! Statement metadata from the text around the table.
//!
//! Owner, account and period are read from the preamble above the header
//! only, since table rows carry the counterparties' accounts and IDs.
//! Balances, header turnovers and the generation date have labels distinct
//! enough to be read from any line.

use std::sync::OnceLock;

use kredo_core::time::find_date;
use kredo_core::{parse_amount, Line, StatementMeta};
use log::debug;
use regex::Regex;

use crate::header::TableLayout;

fn period_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)период(?:\s+выписки)?\s*:?\s*(?:с\s+)?(\d{2}\.\d{2}\.\d{4})\s*(?:[-–—]|по)\s*(\d{2}\.\d{2}\.\d{4})")
            .expect("period regex")
    })
}

fn account_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:лицевой\s+счет|номер\s+счета|выписка\s+по\s+счету|счет|иик|iban)\s*:?\s*№?\s*(KZ[0-9A-Z]{18})\b")
            .expect("account regex")
    })
}

fn currency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i:валюта(?:\s+счета)?)\s*:?\s*([A-Z]{3})\b").expect("currency regex"))
}

fn owner_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:иин/бин|бин/иин|иин|бин)\s*:?\s*(\d{12})\b").expect("owner id regex"))
}

fn owner_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:наименование\s+клиента|владелец(?:\s+счета)?|клиент|фио)\s*:\s*(.+)$").expect("owner regex")
    })
}

/// Trailing `ИИН ...` printed on the owner's line.
fn owner_tail_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)[\s,;]+(?:иин|бин)\b.*$").expect("owner tail regex"))
}

fn generated_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:дата\s+формирования(?:\s+выписки)?|сформирован[а-я]*|дата\s+выдачи)\s*:?\s*(\d{2}\.\d{2}\.\d{4})")
            .expect("generation date regex")
    })
}

fn opening_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:входящ[а-я]*\s+(?:остаток|сальдо)|остаток\s+на\s+начало(?:\s+периода)?)(.*)$")
            .expect("opening balance regex")
    })
}

fn closing_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:исходящ[а-я]*\s+(?:остаток|сальдо)|остаток\s+на\s+конец(?:\s+периода)?)(.*)$")
            .expect("closing balance regex")
    })
}

fn debit_turnover_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:оборот[а-я]*\s+по\s+дебету|дебетов[а-я]*\s+оборот[а-я]*)(.*)$").expect("debit turnover regex")
    })
}

fn credit_turnover_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:оборот[а-я]*\s+по\s+кредиту|кредитов[а-я]*\s+оборот[а-я]*)(.*)$")
            .expect("credit turnover regex")
    })
}

fn date_like_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{2}[./]\d{2}[./]\d{2,4}").expect("date-like regex"))
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-−]?\d+(?:[ \u{a0}\u{202f}]\d{3})*(?:[.,]\d{1,2})?").expect("amount regex"))
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|c| c[1].trim().to_string()).filter(|s| !s.is_empty())
}

/// First amount after the label, skipping dates such as `на 01.03.2024`.
fn labelled_amount(re: &Regex, text: &str) -> Option<f64> {
    let tail = capture(re, text)?;
    let tail = date_like_re().replace_all(&tail, " ");
    amount_re().find(&tail).and_then(|m| parse_amount(m.as_str()))
}

fn owner(text: &str) -> Option<String> {
    let raw = capture(owner_re(), text)?;
    let name = owner_tail_re().replace(&raw, "");
    let name = name.trim_matches(|c: char| c == ',' || c == ';' || c.is_whitespace());
    (!name.is_empty()).then(|| name.to_string())
}

fn first<T>(texts: &[String], f: impl Fn(&str) -> Option<T>) -> Option<T> {
    texts.iter().find_map(|t| f(t))
}

/// Metadata from line texts; lines before `header_line` form the preamble.
pub fn read_meta(texts: &[String], header_line: usize) -> StatementMeta {
    let preamble = &texts[..header_line.min(texts.len())];
    let period = first(preamble, |t| {
        let c = period_re().captures(t)?;
        Some((find_date(&c[1])?, find_date(&c[2])?))
    });

    StatementMeta {
        owner: first(preamble, owner),
        owner_id: first(preamble, |t| capture(owner_id_re(), t)),
        account: first(preamble, |t| capture(account_re(), t).map(|a| a.to_uppercase())),
        currency: first(preamble, |t| capture(currency_re(), t)),
        period_start: period.map(|p| p.0),
        period_end: period.map(|p| p.1),
        generated_on: first(texts, |t| capture(generated_re(), t).and_then(|d| find_date(&d))),
        opening_balance: first(texts, |t| labelled_amount(opening_re(), t)),
        closing_balance: first(texts, |t| labelled_amount(closing_re(), t)),
        debit_turnover: first(texts, |t| labelled_amount(debit_turnover_re(), t)),
        credit_turnover: first(texts, |t| labelled_amount(credit_turnover_re(), t)),
    }
}

pub fn extract_meta(lines: &[Line], layout: &TableLayout) -> StatementMeta {
    let texts: Vec<String> = lines.iter().map(Line::text).collect();
    let meta = read_meta(&texts, layout.header.first_line);
    if !meta.is_empty() {
        debug!("statement meta: {meta:?}");
    }
    meta
}
