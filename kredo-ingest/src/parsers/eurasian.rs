//! Eurasian Bank account statements.
//!
//! Header wording varies between statement generations, so every column
//! carries a generous alias list and the header threshold counts word stems.

use crate::schema::{default_footer_keywords, FieldKind, FieldRole, FieldSpec, RowStart, Schema, SideResolution};

use super::{Bank, StatementParser};

pub struct EurasianParser;

impl StatementParser for EurasianParser {
    fn bank(&self) -> Bank {
        Bank::EurasianBank
    }

    fn schema(&self) -> Schema {
        schema()
    }
}

const ANCHORS: &[&str] = &[
    "дата", "проводк", "операци", "вид", "тип", "номер", "док", "бенефициара", "отправителя", "получателя", "иин",
    "бин", "иик", "iban", "банк", "бик", "swift", "назначение", "дебет", "кредит", "блокирован",
];

pub fn schema() -> Schema {
    Schema {
        name: Bank::EurasianBank.key().to_string(),
        fields: vec![
            FieldSpec::new("Дата проводки", FieldRole::OperationDate, FieldKind::Text).aliases(&[
                "дата провод",
                "дата операции",
                "дата транзакции",
            ]),
            FieldSpec::new("Вид операции", FieldRole::Other, FieldKind::Text).aliases(&["тип операции", "операция"]),
            FieldSpec::new("Номер документа клиента", FieldRole::DocumentNo, FieldKind::Text).aliases(&[
                "номер документа",
                "номер док",
                "№ док",
                "документ клиента",
            ]),
            FieldSpec::new("Наименование Бенефициара/Отправителя", FieldRole::CounterpartyName, FieldKind::FreeText)
                .aliases(&[
                    "наименование получателя/отправителя",
                    "получатель/отправитель",
                    "контрагент",
                    "бенефициар",
                ]),
            FieldSpec::new("ИИН/БИН Бенефициара/Отправителя", FieldRole::CounterpartyId, FieldKind::Text)
                .aliases(&["иин/бин", "бин/иин", "идент номер"]),
            FieldSpec::new("ИИК Бенефициара/Отправителя денег", FieldRole::CounterpartyAccount, FieldKind::Text)
                .aliases(&["иик", "iban", "счет получателя"]),
            FieldSpec::new("Наименование банка Бенефициара/Отправителя денег", FieldRole::Other, FieldKind::FreeText)
                .aliases(&["банк бенефициара", "банк получателя", "банк отправителя"]),
            FieldSpec::new("БИК банка Бенефициара/Отправителя", FieldRole::Other, FieldKind::Text)
                .aliases(&["бик", "swift", "bic"]),
            FieldSpec::new("Назначение платежа", FieldRole::Purpose, FieldKind::FreeText).aliases(&["назначение"]),
            FieldSpec::new("Дебет", FieldRole::Debit, FieldKind::Numeric).aliases(&["сумма по дебету"]),
            FieldSpec::new("Кредит", FieldRole::Credit, FieldKind::Numeric).aliases(&["сумма по кредиту"]),
            FieldSpec::new("Блокированная сумма", FieldRole::Other, FieldKind::Numeric).aliases(&[
                "блокирован",
                "холд",
                "зарезервированная",
            ]),
        ],
        header_anchors: ANCHORS.iter().map(|s| s.to_string()).collect(),
        min_anchor_hits: 6,
        loose_anchor_hits: 4,
        header_scan_lines: 80,
        row_start: RowStart {
            date_fields: vec!["Дата проводки".into()],
            date_pattern: r"^\d{2}\.\d{2}\.\d{4}".into(),
            id_field: None,
            id_pattern: ".*".into(),
        },
        primary_id_field: None,
        footer_keywords: default_footer_keywords(),
        footer_patterns: vec![r"^\s*итог".into()],
        footer_terminates_page: false,
        skip_phrases: Vec::new(),
        line_tolerance: 2.0,
        default_fractions: Vec::new(),
        side_resolution: SideResolution::PreferNonZero,
    }
}
