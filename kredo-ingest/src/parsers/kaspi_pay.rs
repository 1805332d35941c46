//! Kaspi Pay merchant account statements.
//!
//! Fixed column bands; a row opens with a document number in the first band
//! and a date (or the time half of a wrapped timestamp) in the second. The
//! turnover block closes the page.

use crate::schema::{FieldKind, FieldRole, FieldSpec, RowStart, Schema, SideResolution};

use super::{Bank, StatementParser};

pub struct KaspiPayParser;

impl StatementParser for KaspiPayParser {
    fn bank(&self) -> Bank {
        Bank::KaspiPay
    }

    fn schema(&self) -> Schema {
        schema()
    }
}

pub fn schema() -> Schema {
    Schema {
        name: Bank::KaspiPay.key().to_string(),
        fields: vec![
            FieldSpec::new("Номер документа", FieldRole::DocumentNo, FieldKind::Text).band(0.0, 95.0),
            FieldSpec::new("Дата операции", FieldRole::OperationDate, FieldKind::Text).band(95.0, 200.0),
            FieldSpec::new("Дебет", FieldRole::Debit, FieldKind::Numeric).band(200.0, 240.0),
            FieldSpec::new("Кредит", FieldRole::Credit, FieldKind::Numeric).band(240.0, 310.0),
            FieldSpec::new("Наименование получателя", FieldRole::CounterpartyName, FieldKind::FreeText)
                .band(310.0, 450.0),
            FieldSpec::new("ИИК бенеф/отправителя", FieldRole::CounterpartyAccount, FieldKind::Text)
                .band(450.0, 560.0),
            FieldSpec::new("БИК банка", FieldRole::Other, FieldKind::Text).band(560.0, 620.0),
            FieldSpec::new("КНП", FieldRole::PaymentCode, FieldKind::Text).band(620.0, 650.0),
            FieldSpec::new("Назначение платежа", FieldRole::Purpose, FieldKind::FreeText).band(650.0, 2000.0),
        ],
        header_anchors: [
            "номер документа",
            "дата операции",
            "дебет",
            "кредит",
            "наименование",
            "иик",
            "бик",
            "кнп",
            "назначение",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        min_anchor_hits: 4,
        loose_anchor_hits: 3,
        header_scan_lines: 80,
        row_start: RowStart {
            date_fields: vec!["Дата операции".into()],
            date_pattern: r"\d{2}\.\d{2}\.\d{4}|\d{1,2}:\d{2}".into(),
            id_field: Some("Номер документа".into()),
            id_pattern: r"^[A-Za-zА-Яа-я0-9][A-Za-zА-Яа-я0-9\-_/]{0,19}$".into(),
        },
        primary_id_field: Some("Номер документа".into()),
        footer_keywords: ["итого", "итого обороты", "отчет сформирован", "наименование и бик", "бик:"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        footer_patterns: vec![r"итог[а-я]* операций".into(), r"бик\s*:?\s*caspkzka".into()],
        footer_terminates_page: true,
        skip_phrases: Vec::new(),
        line_tolerance: 0.9,
        default_fractions: Vec::new(),
        side_resolution: SideResolution::MergeSplit,
    }
}
