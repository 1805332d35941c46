//! Bank CenterCredit business statements (bilingual kazakh/russian header).

use crate::schema::{default_footer_keywords, FieldKind, FieldRole, FieldSpec, RowStart, Schema, SideResolution};

use super::{Bank, StatementParser};

pub struct BccParser;

impl StatementParser for BccParser {
    fn bank(&self) -> Bank {
        Bank::BccBank
    }

    fn schema(&self) -> Schema {
        schema()
    }
}

pub fn schema() -> Schema {
    Schema {
        name: Bank::BccBank.key().to_string(),
        fields: vec![
            FieldSpec::new("Реттік №/ № п/п", FieldRole::Other, FieldKind::Text).aliases(&["п/п", "реттік"]),
            FieldSpec::new("Күні / Дата", FieldRole::OperationDate, FieldKind::Text).aliases(&["дата", "күні"]),
            FieldSpec::new("Корр-тің БСК / БИК корр-та", FieldRole::Other, FieldKind::Text).aliases(&["бик корр та"]),
            FieldSpec::new("Корр-тің ЖСК /ИИК корр-та", FieldRole::CounterpartyAccount, FieldKind::Text)
                .aliases(&["иик корр та"]),
            FieldSpec::new("Жіберушінің СН / ИН отправителя", FieldRole::CounterpartyId, FieldKind::Text)
                .aliases(&["ин отправителя"]),
            FieldSpec::new("Корреспондент / Корреспондент", FieldRole::CounterpartyName, FieldKind::FreeText)
                .aliases(&["корреспондент"]),
            FieldSpec::new("Алушының СН / ИН получателя", FieldRole::Other, FieldKind::Text)
                .aliases(&["ин получателя"]),
            FieldSpec::new("Дебет / Дебет", FieldRole::Debit, FieldKind::Numeric).aliases(&["дебет"]),
            FieldSpec::new("Кредит / Кредит", FieldRole::Credit, FieldKind::Numeric).aliases(&["кредит"]),
            FieldSpec::new("ТМК /КНП", FieldRole::PaymentCode, FieldKind::Text).aliases(&["кнп", "тмк"]),
            FieldSpec::new("Банк корреспондент / Банк корреспондент", FieldRole::Other, FieldKind::FreeText)
                .aliases(&["банк корреспондент"]),
            FieldSpec::new("Төлемнің мақсаты / Назначение платежа", FieldRole::Purpose, FieldKind::FreeText)
                .aliases(&["назначение платежа", "назначение"]),
        ],
        header_anchors: [
            "дата",
            "бик",
            "иик",
            "отправителя",
            "корреспондент",
            "получателя",
            "дебет",
            "кредит",
            "кнп",
            "назначение",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        min_anchor_hits: 5,
        loose_anchor_hits: 3,
        header_scan_lines: 80,
        row_start: RowStart {
            date_fields: vec!["Күні / Дата".into()],
            date_pattern: r"^\d{2}\.\d{2}\.\d{4}".into(),
            id_field: None,
            id_pattern: ".*".into(),
        },
        primary_id_field: None,
        footer_keywords: default_footer_keywords(),
        footer_patterns: Vec::new(),
        footer_terminates_page: false,
        skip_phrases: Vec::new(),
        line_tolerance: 2.0,
        default_fractions: Vec::new(),
        side_resolution: SideResolution::PreferNonZero,
    }
}
