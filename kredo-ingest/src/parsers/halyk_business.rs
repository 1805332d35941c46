//! Halyk Bank business account statements.

use crate::schema::{default_footer_keywords, FieldKind, FieldRole, FieldSpec, RowStart, Schema, SideResolution};

use super::{Bank, StatementParser};

pub struct HalykBusinessParser;

impl StatementParser for HalykBusinessParser {
    fn bank(&self) -> Bank {
        Bank::HalykBusiness
    }

    fn schema(&self) -> Schema {
        schema()
    }
}

/// Static bands; the counterparty block carries name, BIN/IIN and account
/// on separate lines and is split during projection.
pub fn schema() -> Schema {
    let mut footer_keywords = default_footer_keywords();
    footer_keywords.push("дата остатка".to_string());

    Schema {
        name: Bank::HalykBusiness.key().to_string(),
        fields: vec![
            FieldSpec::new("Дата", FieldRole::OperationDate, FieldKind::Text).band(0.0, 85.0),
            FieldSpec::new("Номер документа", FieldRole::DocumentNo, FieldKind::Text).band(85.0, 170.0),
            FieldSpec::new("Дебет", FieldRole::Debit, FieldKind::Numeric).band(170.0, 235.0),
            FieldSpec::new("Кредит", FieldRole::Credit, FieldKind::Numeric).band(235.0, 320.0),
            FieldSpec::new("Контрагент", FieldRole::CounterpartyName, FieldKind::FreeText).band(320.0, 410.0),
            FieldSpec::new("Детали платежа", FieldRole::Purpose, FieldKind::FreeText).band(410.0, 2000.0),
        ],
        header_anchors: ["дата", "номер документа", "дебет", "кредит", "контрагент", "детали"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        min_anchor_hits: 4,
        loose_anchor_hits: 3,
        header_scan_lines: 80,
        row_start: RowStart {
            date_fields: vec!["Дата".into()],
            date_pattern: r"^\d{2}\.\d{2}\.\d{4}".into(),
            id_field: Some("Номер документа".into()),
            id_pattern: r"^[0-9A-Za-zА-Яа-я][0-9A-Za-zА-Яа-я\-_/]{0,30}$".into(),
        },
        primary_id_field: None,
        footer_keywords,
        footer_patterns: Vec::new(),
        footer_terminates_page: false,
        skip_phrases: Vec::new(),
        line_tolerance: 2.0,
        default_fractions: Vec::new(),
        side_resolution: SideResolution::PreferNonZero,
    }
}
