//! Halyk Bank card/current account statements for individuals.
//!
//! Columns are inferred from the header; a row opens when both the posting
//! and the processing date columns hold a date.

use crate::schema::{default_footer_keywords, FieldKind, FieldRole, FieldSpec, RowStart, Schema, SideResolution};

use super::{Bank, StatementParser};

pub struct HalykIndividualParser;

impl StatementParser for HalykIndividualParser {
    fn bank(&self) -> Bank {
        Bank::HalykIndividual
    }

    fn schema(&self) -> Schema {
        schema()
    }
}

const SKIP_PHRASES: &[&str] = &[
    "Выписка по счету",
    "ФИО:",
    "ИИН:",
    "Период выписки:",
    "Тип счета:",
    "Номер счета:",
    "Валюта счета:",
    "Входящий остаток:",
    "Номер карточки:",
    "Доступная сумма",
    "Дата формирования выписки:",
    "Дата открытия счета:",
    "Дата закрытия счета:",
    "Расшифровка заблокированных сумм:",
    "По требованиям третьих лиц",
    "БИК:",
];

pub fn schema() -> Schema {
    Schema {
        name: Bank::HalykIndividual.key().to_string(),
        fields: vec![
            FieldSpec::new("Дата проведения", FieldRole::OperationDate, FieldKind::Text)
                .aliases(&["дата проведения операции"]),
            FieldSpec::new("Дата обработки", FieldRole::ValueDate, FieldKind::Text),
            FieldSpec::new("Описание операции", FieldRole::Purpose, FieldKind::FreeText).aliases(&["описание"]),
            FieldSpec::new("Сумма операции", FieldRole::Other, FieldKind::Numeric).aliases(&["сумма"]),
            FieldSpec::new("Валюта операции", FieldRole::Other, FieldKind::Text).aliases(&["валюта"]),
            FieldSpec::new("Приход", FieldRole::Credit, FieldKind::Numeric),
            FieldSpec::new("Расход", FieldRole::Debit, FieldKind::Numeric),
            FieldSpec::new("Комиссия", FieldRole::Other, FieldKind::Numeric),
            FieldSpec::new("№ карточки/счета", FieldRole::CounterpartyAccount, FieldKind::Text)
                .aliases(&["карточки/счета"]),
        ],
        header_anchors: [
            "дата проведения",
            "дата обработки",
            "описание",
            "сумма",
            "валюта",
            "приход",
            "расход",
            "комисси",
            "карточки/счета",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        min_anchor_hits: 3,
        loose_anchor_hits: 2,
        header_scan_lines: 80,
        row_start: RowStart {
            date_fields: vec!["Дата проведения".into(), "Дата обработки".into()],
            date_pattern: r"^\d{2}\.\d{2}\.\d{4}$".into(),
            id_field: None,
            id_pattern: ".*".into(),
        },
        primary_id_field: None,
        footer_keywords: default_footer_keywords(),
        footer_patterns: Vec::new(),
        footer_terminates_page: false,
        skip_phrases: SKIP_PHRASES.iter().map(|s| s.to_string()).collect(),
        line_tolerance: 3.0,
        default_fractions: Vec::new(),
        side_resolution: SideResolution::PreferNonZero,
    }
}
