use kredo_core::{PageTokens, ParseError, Side, Word};
use kredo_ingest::{detect_bank, parser_for, Bank};

/// Lays words out on pages with a fixed 4-unit glyph width.
struct Sheet {
    pages: Vec<PageTokens>,
}

impl Sheet {
    fn new() -> Self {
        Self {
            pages: vec![PageTokens { page_index: 0, words: Vec::new() }],
        }
    }

    fn new_page(&mut self) {
        let index = self.pages.len();
        self.pages.push(PageTokens { page_index: index, words: Vec::new() });
    }

    fn put(&mut self, top: f64, cells: &[(f64, &str)]) {
        let page = self.pages.last_mut().unwrap();
        for (x0, text) in cells {
            let x1 = x0 + 4.0 * text.chars().count() as f64;
            page.words.push(Word::new(*text, *x0, x1, top, top + 8.0));
        }
    }
}

fn kaspi_header(sh: &mut Sheet) {
    sh.put(
        100.0,
        &[
            (10.0, "Номер"),
            (40.0, "документа"),
            (100.0, "Дата"),
            (120.0, "операции"),
            (205.0, "Дебет"),
            (250.0, "Кредит"),
            (320.0, "Наименование"),
            (460.0, "ИИК"),
            (570.0, "БИК"),
            (622.0, "КНП"),
            (660.0, "Назначение"),
        ],
    );
}

fn kaspi_statement() -> Vec<PageTokens> {
    let mut sh = Sheet::new();
    sh.put(40.0, &[(10.0, "Выписка"), (60.0, "Kaspi"), (90.0, "Pay")]);
    kaspi_header(&mut sh);
    sh.put(
        120.0,
        &[
            (10.0, "KP-000101"),
            (100.0, "05.03.2024"),
            (245.0, "150 000,00"),
            (320.0, "ТОО"),
            (340.0, "Ромашка"),
            (460.0, "KZ12345678901234567X"),
            (570.0, "CASPKZKA"),
            (622.0, "710"),
            (660.0, "Оплата"),
        ],
    );
    sh.put(130.0, &[(100.0, "12:30:00"), (320.0, "БИН"), (340.0, "123456789012"), (660.0, "услуг")]);
    sh.put(
        150.0,
        &[
            (10.0, "KP-000102"),
            (100.0, "06.03.2024"),
            (205.0, "2 500,00"),
            (320.0, "ИП"),
            (335.0, "Иванов"),
            (660.0, "Комиссия"),
        ],
    );
    sh.put(170.0, &[(10.0, "Итого"), (40.0, "обороты"), (205.0, "2 500,00"), (245.0, "150 000,00")]);
    sh.put(180.0, &[(10.0, "KP-999999"), (100.0, "31.03.2024"), (245.0, "1,00")]);

    sh.new_page();
    kaspi_header(&mut sh);
    sh.put(
        120.0,
        &[
            (10.0, "KP-000103"),
            (100.0, "07.03.2024"),
            (245.0, "10 000,00"),
            (320.0, "ТОО"),
            (340.0, "Альфа"),
            (622.0, "119"),
            (660.0, "Возврат"),
        ],
    );
    sh.pages
}

fn halyk_individual_statement() -> Vec<PageTokens> {
    let mut sh = Sheet::new();
    sh.put(50.0, &[(10.0, "Выписка"), (45.0, "по"), (60.0, "счету")]);
    sh.put(60.0, &[(10.0, "ИИН:"), (40.0, "900101300123")]);
    sh.put(
        100.0,
        &[
            (10.0, "Дата проведения"),
            (90.0, "Дата обработки"),
            (170.0, "Описание операции"),
            (260.0, "Сумма операции"),
            (340.0, "Валюта операции"),
            (420.0, "Приход"),
            (470.0, "Расход"),
            (520.0, "Комиссия"),
            (580.0, "№ карточки/счета"),
        ],
    );
    sh.put(
        120.0,
        &[
            (10.0, "01.04.2024"),
            (90.0, "02.04.2024"),
            (170.0, "Поступление"),
            (260.0, "50 000,00"),
            (340.0, "KZT"),
            (420.0, "50 000,00"),
            (470.0, "0,00"),
            (520.0, "0,00"),
            (580.0, "4400****1234"),
        ],
    );
    sh.put(130.0, &[(170.0, "перевода")]);
    sh.put(
        150.0,
        &[
            (10.0, "03.04.2024"),
            (90.0, "03.04.2024"),
            (170.0, "Покупка"),
            (260.0, "-2 000,00"),
            (340.0, "KZT"),
            (420.0, "0,00"),
            (470.0, "2 000,00"),
            (520.0, "0,00"),
            (580.0, "4400****1234"),
        ],
    );
    sh.put(170.0, &[(10.0, "Всего"), (420.0, "50 000,00"), (470.0, "2 000,00")]);
    sh.pages
}

#[test]
fn test_kaspi_pay_one_transaction_per_data_row() {
    let st = parser_for(Bank::KaspiPay).parse(&kaspi_statement()).unwrap();
    assert_eq!(st.transactions.len(), 3, "footer and post-footer lines must not become rows");
    assert_eq!(st.records.len(), st.transactions.len());

    let first = &st.transactions[0];
    assert_eq!(first.side(), Side::Credit);
    assert_eq!(first.credit_value(), Some(150_000.0));
    assert_eq!(first.document_no, "KP-000101");
    assert_eq!(first.counterparty_name, "ТОО Ромашка");
    assert_eq!(first.counterparty_id.as_deref(), Some("123456789012"));
    assert_eq!(first.counterparty_account.as_deref(), Some("KZ12345678901234567X"));
    assert_eq!(first.payment_code, "710");
    assert_eq!(first.purpose_text, "Оплата\nуслуг");
    assert_eq!(st.records[0].get("Дата операции"), Some("05.03.2024 12:30:00"));

    assert_eq!(st.transactions[1].debit_value(), Some(2_500.0));
    assert_eq!(st.transactions[2].payment_code, "119");

    assert_eq!(st.footer.total_debit, Some(2_500.0));
    assert_eq!(st.footer.total_credit, Some(150_000.0));
}

#[test]
fn test_kaspi_purpose_mentioning_totals_keeps_later_rows() {
    let mut sh = Sheet::new();
    sh.put(40.0, &[(10.0, "Выписка"), (60.0, "Kaspi"), (90.0, "Pay")]);
    kaspi_header(&mut sh);
    sh.put(
        120.0,
        &[(10.0, "KP-000101"), (100.0, "05.03.2024"), (245.0, "40 000,00"), (320.0, "ТОО"), (660.0, "Бонус")],
    );
    sh.put(130.0, &[(660.0, "по"), (675.0, "итогам"), (705.0, "квартала")]);
    sh.put(
        150.0,
        &[(10.0, "KP-000102"), (100.0, "06.03.2024"), (245.0, "12 000,00"), (320.0, "ИП"), (660.0, "Оплата")],
    );
    sh.put(170.0, &[(10.0, "Итого"), (40.0, "операций:"), (100.0, "2")]);
    sh.put(180.0, &[(10.0, "KP-999999"), (100.0, "31.03.2024"), (245.0, "1,00")]);

    let st = parser_for(Bank::KaspiPay).parse(&sh.pages).unwrap();
    assert_eq!(st.transactions.len(), 2, "rows after the purpose line must survive");
    assert_eq!(st.transactions[0].purpose_text, "Бонус\nпо итогам квартала");
    assert_eq!(st.transactions[1].credit_value(), Some(12_000.0));
}

#[test]
fn test_kaspi_statement_meta_from_preamble() {
    let mut sh = Sheet::new();
    sh.put(20.0, &[(10.0, "Выписка"), (60.0, "Kaspi"), (90.0, "Pay")]);
    sh.put(40.0, &[(10.0, "Лицевой"), (45.0, "счет:"), (70.0, "KZ12722S000012345678")]);
    sh.put(50.0, &[(10.0, "Период:"), (45.0, "01.03.2024"), (90.0, "-"), (100.0, "31.03.2024")]);
    sh.put(60.0, &[(10.0, "Входящий"), (50.0, "остаток:"), (90.0, "1 000,00"), (125.0, "KZT")]);
    sh.put(70.0, &[(10.0, "Исходящий"), (50.0, "остаток:"), (90.0, "1 500,00"), (125.0, "KZT")]);
    kaspi_header(&mut sh);
    sh.put(
        120.0,
        &[(10.0, "KP-000101"), (100.0, "05.03.2024"), (245.0, "500,00"), (320.0, "ТОО"), (660.0, "Оплата")],
    );

    let st = parser_for(Bank::KaspiPay).parse(&sh.pages).unwrap();
    assert_eq!(st.transactions.len(), 1);
    assert_eq!(st.meta.account.as_deref(), Some("KZ12722S000012345678"));
    assert_eq!(st.meta.period_end.map(|d| d.to_string()), Some("2024-03-31".to_string()));
    assert_eq!(st.meta.opening_balance, Some(1_000.0));
    assert_eq!(st.meta.closing_balance, Some(1_500.0));
}

#[test]
fn test_kaspi_amount_split_across_columns_is_rejoined() {
    let mut sh = Sheet::new();
    sh.put(40.0, &[(10.0, "Выписка"), (60.0, "Kaspi"), (90.0, "Pay")]);
    kaspi_header(&mut sh);
    sh.put(
        120.0,
        &[(10.0, "KP-000101"), (100.0, "05.03.2024"), (220.0, "150"), (245.0, "000,00"), (660.0, "Оплата")],
    );

    let st = parser_for(Bank::KaspiPay).parse(&sh.pages).unwrap();
    assert_eq!(st.transactions.len(), 1);
    assert_eq!(st.transactions[0].side(), Side::Credit);
    assert_eq!(st.transactions[0].credit_value(), Some(150_000.0));
}

#[test]
fn test_eurasian_purpose_full_of_header_words_stays_in_row() {
    let labels = [
        "Дата проводки",
        "Вид операции",
        "Номер документа",
        "Контрагент",
        "ИИН/БИН",
        "ИИК",
        "Банк получателя",
        "БИК",
        "Назначение",
        "Дебет",
        "Кредит",
        "Блокирован",
    ];
    let mut sh = Sheet::new();
    let header: Vec<(f64, &str)> = labels.iter().enumerate().map(|(i, l)| (10.0 + 80.0 * i as f64, *l)).collect();
    sh.put(100.0, &header);
    sh.put(120.0, &[(10.0, "05.03.2024"), (250.0, "ТОО"), (650.0, "Оплата"), (810.0, "150 000,00")]);
    sh.put(
        130.0,
        &[
            (640.0, "дата"),
            (644.0, "док"),
            (648.0, "иин"),
            (652.0, "бин"),
            (656.0, "иик"),
            (660.0, "банк"),
            (664.0, "бик"),
        ],
    );
    sh.put(150.0, &[(10.0, "06.03.2024"), (650.0, "Комиссия"), (730.0, "500,00")]);

    let st = parser_for(Bank::EurasianBank).parse(&sh.pages).unwrap();
    assert_eq!(st.transactions.len(), 2);
    assert_eq!(st.transactions[0].purpose_text, "Оплата\nдата док иин бин иик банк бик");
    assert_eq!(st.transactions[0].credit_value(), Some(150_000.0));
    assert_eq!(st.transactions[1].debit_value(), Some(500.0));
}

#[test]
fn test_exactly_one_side_per_transaction() {
    for pages in [kaspi_statement(), halyk_individual_statement()] {
        let bank = detect_bank(&pages).unwrap();
        let st = parser_for(bank).parse(&pages).unwrap();
        for tx in &st.transactions {
            assert!(tx.debit.is_some() ^ tx.credit.is_some(), "{bank}: {tx:?}");
        }
    }
}

#[test]
fn test_halyk_individual_inferred_columns() {
    let st = parser_for(Bank::HalykIndividual).parse(&halyk_individual_statement()).unwrap();
    assert_eq!(st.transactions.len(), 2);

    let income = &st.transactions[0];
    assert_eq!(income.credit_value(), Some(50_000.0));
    assert!(income.debit.is_none(), "zero in the expense column is cleared");
    assert_eq!(income.value_date.map(|d| d.to_string()), Some("2024-04-02".to_string()));
    assert_eq!(income.purpose_text, "Поступление\nперевода");
    assert_eq!(income.counterparty_account.as_deref(), Some("4400****1234"));

    let spend = &st.transactions[1];
    assert_eq!(spend.debit_value(), Some(2_000.0));
    assert!(spend.credit.is_none());

    assert_eq!(st.footer.total_credit, Some(50_000.0));
    assert_eq!(st.footer.total_debit, Some(2_000.0));
}

#[test]
fn test_detect_bank_picks_matching_layout() {
    assert_eq!(detect_bank(&kaspi_statement()), Some(Bank::KaspiPay));
    assert_eq!(detect_bank(&halyk_individual_statement()), Some(Bank::HalykIndividual));
}

#[test]
fn test_unknown_layout_is_fatal() {
    let mut sh = Sheet::new();
    sh.put(10.0, &[(10.0, "Счет-фактура"), (120.0, "№"), (140.0, "42")]);
    sh.put(30.0, &[(10.0, "Товар"), (120.0, "Количество")]);
    let err = parser_for(Bank::HalykBusiness).parse(&sh.pages).unwrap_err();
    assert!(err.is_table_not_found());
    assert!(matches!(err, ParseError::HeaderNotFound { .. }));

    let empty = parser_for(Bank::KaspiPay).parse(&[]).unwrap_err();
    assert_eq!(empty, ParseError::EmptyInput);
}

#[test]
fn test_reconstruction_is_idempotent_through_json() {
    let pages = kaspi_statement();
    let json = serde_json::to_string(&pages).unwrap();
    let decoded: Vec<PageTokens> = serde_json::from_str(&json).unwrap();

    let parser = parser_for(Bank::KaspiPay);
    let a = parser.parse(&decoded).unwrap();
    let b = parser.parse(&decoded).unwrap();
    assert_eq!(a, b);
    assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
}
