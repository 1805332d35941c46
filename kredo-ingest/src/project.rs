//! Typed projection of reconstructed records.

use std::sync::OnceLock;

use kredo_core::time::find_date;
use kredo_core::token::collapse_whitespace;
use kredo_core::{AmountText, Record, Transaction};
use regex::Regex;

use crate::rows::disambiguate_sides;
use crate::schema::{CompiledSchema, FieldRole};

fn labelled_tax_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:БИН|ИИН)[\s:/№]*(\d{12})").expect("tax id regex"))
}

fn tax_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\D)(\d{12})(?:\D|$)").expect("12 digit regex"))
}

fn account_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:ИИК|IBAN|счет)?[\s:№]*\b(KZ[0-9A-Z]{18})\b").expect("account regex"))
}

fn payment_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)КНП[_\s:-]*(\d{1,3})").expect("knp regex"))
}

/// First 12-digit run in `text` (IIN/BIN).
pub fn find_tax_id(text: &str) -> Option<String> {
    tax_id_re().captures(text).map(|c| c[1].to_string())
}

/// `КНП 710`, `КНП_119` inside a purpose string.
pub fn find_payment_code(text: &str) -> Option<String> {
    payment_code_re().captures(text).map(|c| c[1].to_string())
}

/// Split the counterparty block into (name, tax id, account).
fn split_counterparty(block: &str) -> (String, Option<String>, Option<String>) {
    let mut name = block.replace('\n', " ");

    let account = account_re().captures(&name).map(|c| c[1].to_uppercase());
    if account.is_some() {
        name = account_re().replace_all(&name, " ").into_owned();
    }

    let mut tax_id = labelled_tax_id_re().captures(&name).map(|c| c[1].to_string());
    if tax_id.is_some() {
        name = labelled_tax_id_re().replace_all(&name, " ").into_owned();
    } else if let Some(id) = find_tax_id(&name) {
        name = name.replacen(&id, " ", 1);
        tax_id = Some(id);
    }

    let name = collapse_whitespace(&name)
        .trim_matches(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .to_string();
    (name, tax_id, account)
}

/// Build the typed transaction for one record.
///
/// Returns `None` when the record has no readable operation date or neither
/// amount column holds text.
pub fn project(record: &Record, schema: &CompiledSchema) -> Option<Transaction> {
    let cell = |role: FieldRole| -> Option<String> {
        schema
            .field_for(role)
            .and_then(|i| record.get(&schema.fields()[i].name))
            .map(|s| s.trim().to_string())
    };

    let operation_date = cell(FieldRole::OperationDate)
        .or_else(|| {
            schema
                .date_fields()
                .first()
                .and_then(|&i| record.get(&schema.fields()[i].name))
                .map(str::to_string)
        })
        .and_then(|s| find_date(&s))?;
    let value_date = cell(FieldRole::ValueDate).and_then(|s| find_date(&s));

    let (debit_raw, credit_raw) = disambiguate_sides(
        &cell(FieldRole::Debit).unwrap_or_default(),
        &cell(FieldRole::Credit).unwrap_or_default(),
        schema.side_resolution(),
    );
    let debit = (!debit_raw.is_empty()).then(|| AmountText::parse(&debit_raw));
    let credit = (!credit_raw.is_empty()).then(|| AmountText::parse(&credit_raw));
    if debit.is_none() && credit.is_none() {
        return None;
    }

    let purpose_text = cell(FieldRole::Purpose).unwrap_or_default();
    let (counterparty_name, embedded_id, embedded_account) =
        split_counterparty(&cell(FieldRole::CounterpartyName).unwrap_or_default());

    let counterparty_id = cell(FieldRole::CounterpartyId)
        .and_then(|s| find_tax_id(&s))
        .or(embedded_id)
        .or_else(|| find_tax_id(&purpose_text));
    let counterparty_account = cell(FieldRole::CounterpartyAccount)
        .map(|s| collapse_whitespace(&s))
        .or(embedded_account);
    let payment_code = cell(FieldRole::PaymentCode)
        .filter(|s| !s.is_empty())
        .or_else(|| find_payment_code(&purpose_text))
        .unwrap_or_default();

    Some(Transaction {
        operation_date,
        value_date,
        debit,
        credit,
        counterparty_name,
        counterparty_id,
        counterparty_account,
        purpose_text,
        payment_code,
        document_no: cell(FieldRole::DocumentNo).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{default_footer_keywords, FieldKind, FieldSpec, RowStart, Schema, SideResolution};
    use chrono::NaiveDate;

    fn schema(with_code_column: bool) -> CompiledSchema {
        let mut fields = vec![
            FieldSpec::new("Дата", FieldRole::OperationDate, FieldKind::Text),
            FieldSpec::new("Номер", FieldRole::DocumentNo, FieldKind::Text),
            FieldSpec::new("Дебет", FieldRole::Debit, FieldKind::Numeric),
            FieldSpec::new("Кредит", FieldRole::Credit, FieldKind::Numeric),
            FieldSpec::new("Контрагент", FieldRole::CounterpartyName, FieldKind::FreeText),
            FieldSpec::new("Детали", FieldRole::Purpose, FieldKind::FreeText),
        ];
        if with_code_column {
            fields.push(FieldSpec::new("КНП", FieldRole::PaymentCode, FieldKind::Text));
        }
        Schema {
            name: "proj".into(),
            fields,
            header_anchors: vec!["дата".into()],
            min_anchor_hits: 1,
            loose_anchor_hits: 1,
            header_scan_lines: 80,
            row_start: RowStart {
                date_fields: vec!["Дата".into()],
                date_pattern: r"^\d{2}\.\d{2}\.\d{4}".into(),
                id_field: None,
                id_pattern: ".*".into(),
            },
            primary_id_field: None,
            footer_keywords: default_footer_keywords(),
            footer_patterns: Vec::new(),
            footer_terminates_page: false,
            skip_phrases: vec![],
            line_tolerance: 1.0,
            default_fractions: vec![],
            side_resolution: SideResolution::PreferNonZero,
        }
        .compile()
        .unwrap()
    }

    fn record(cells: &[(&str, &str)]) -> Record {
        let mut r = Record::new();
        for (c, v) in cells {
            r.set(c, *v);
        }
        r
    }

    #[test]
    fn test_project_splits_counterparty_block() {
        let r = record(&[
            ("Дата", "05.03.2024 12:01:00"),
            ("Номер", "771"),
            ("Кредит", "250 000,00"),
            ("Контрагент", "ТОО \"Ромашка\"\nБИН 123456789012\nKZ12345678901234567X"),
            ("Детали", "Оплата за товар КНП 710"),
        ]);
        let tx = project(&r, &schema(false)).unwrap();
        assert_eq!(tx.operation_date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(tx.counterparty_name, "ТОО \"Ромашка\"");
        assert_eq!(tx.counterparty_id.as_deref(), Some("123456789012"));
        assert_eq!(tx.counterparty_account.as_deref(), Some("KZ12345678901234567X"));
        assert_eq!(tx.payment_code, "710");
        assert_eq!(tx.credit_value(), Some(250_000.0));
        assert!(tx.debit.is_none());
        assert_eq!(tx.document_no, "771");
    }

    #[test]
    fn test_project_prefers_code_column() {
        let r = record(&[
            ("Дата", "05.03.2024"),
            ("Дебет", "100,00"),
            ("Детали", "КНП 911 перевод"),
            ("КНП", "119"),
        ]);
        let tx = project(&r, &schema(true)).unwrap();
        assert_eq!(tx.payment_code, "119");
        assert_eq!(tx.debit_value(), Some(100.0));
    }

    #[test]
    fn test_project_tax_id_from_purpose() {
        let r = record(&[
            ("Дата", "05.03.2024"),
            ("Кредит", "1,00"),
            ("Контрагент", "ИП Иванов"),
            ("Детали", "перевод от 990101300123 по счету"),
        ]);
        let tx = project(&r, &schema(false)).unwrap();
        assert_eq!(tx.counterparty_id.as_deref(), Some("990101300123"));
        assert_eq!(tx.counterparty_name, "ИП Иванов");
    }

    #[test]
    fn test_project_rejects_row_without_amount_or_date() {
        let no_amount = record(&[("Дата", "05.03.2024"), ("Детали", "x")]);
        assert!(project(&no_amount, &schema(false)).is_none());
        let no_date = record(&[("Дата", "n/a"), ("Кредит", "1,00")]);
        assert!(project(&no_date, &schema(false)).is_none());
    }

    #[test]
    fn test_unparsable_amount_kept_as_none() {
        let r = record(&[("Дата", "05.03.2024"), ("Кредит", "---")]);
        let tx = project(&r, &schema(false)).unwrap();
        assert_eq!(tx.credit.as_ref().map(|a| a.raw.as_str()), Some("---"));
        assert_eq!(tx.credit_value(), None);
    }

    #[test]
    fn test_find_tax_id_needs_exact_run() {
        assert_eq!(find_tax_id("1234567890123"), None);
        assert_eq!(find_tax_id("ИИН:880101350123,"), Some("880101350123".into()));
    }
}
