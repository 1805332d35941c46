//! Business-income classification rules.
//!
//! Deterministic keyword and payment-code rules decide, per transaction,
//! whether an inflow counts as business income. Nothing here can fail:
//! unknown codes and unmatched text default to "business".

use std::collections::BTreeSet;

use chrono::NaiveDate;
use kredo_core::Transaction;
use log::info;
use serde::{Deserialize, Serialize};

const BASE_EXCLUDED_CODES: &[&str] = &[
    "10", "12", "121", "131", "132", "192", "193", "194", "195", "211", "213", "221", "223", "230", "290", "342",
    "343", "344", "345", "350", "361", "390", "411", "413", "419", "421", "423", "424", "429", "430", "911", "912",
];

const EXTRA_EXCLUDED_CODES: &[&str] = &["310", "312", "314", "315", "316", "317", "320", "321", "322", "324", "329"];

const NON_BUSINESS_KEYWORDS: &[&str] = &[
    "возврат",
    "отмена",
    // microcredit organisations
    "money-express",
    "tengeda",
    "solva lite",
    "acredit",
    "cashdrive",
    "честное слово",
    "tomi.",
    "tengebai",
    "i-credit",
    "kviku",
    "lime",
    "деньги-клик",
    "alacredit деньги",
    "quick money",
    "мани мен",
    "ccloan",
    "gmoney",
    "смартолет",
    "creditplus",
    "vivus",
    "вивус",
    "solva",
    "кредитбар",
    "qanat",
    "turbomoney",
    "займер",
    "koke",
    "tengo",
    "onecredit",
    "credit365",
    // transfers that are not revenue
    "несие",
    "социальный счет",
    "cash-in",
    "проданный автомобиль",
    "кошельк",
    "зарплата",
    "жалақы",
    "арест",
    "қайтар",
    "пенсионные",
    "конверт",
    "банкомат",
    "терминал",
    "popolnenie depozita",
    "зейнетақы",
    "социаль",
    "командировочные",
    // bookmakers
    "1xbet",
    "pin-up",
    "olimpbet",
    "parimatch",
    "winline",
    "ubet",
    "tennisi",
    "fonbet",
    "ringobet",
];

const WHITELIST_KEYWORDS: &[&str] = &[
    "банк центр кредит",
    "банкцентркредит",
    "банк центркредит",
    "банкцентр кредит",
    "бцк",
    "bcc",
    "bank center credit",
    "bankcentrcredit",
];

const KEEP_IF_CODE_099: &[&str] = &["возмещение", "возмещ.", "гарант"];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Rule lists for one tenant. Every field has a production default, so a
/// partial TOML file overrides only what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeRuleConfig {
    /// Payment codes that are never business income.
    pub excluded_codes_base: BTreeSet<String>,
    /// Payment codes excluded only for operations on or after `extra_cutoff_date`.
    pub excluded_codes_extra: BTreeSet<String>,
    pub extra_cutoff_date: NaiveDate,
    /// Substrings of purpose/counterparty text marking non-business inflows.
    pub non_business_keywords: Vec<String>,
    /// Text matching any of these is never excluded by keyword.
    pub whitelist_keywords: Vec<String>,
    /// With payment code 099, these keep the transaction as business income.
    pub keep_if_code_099: Vec<String>,
}

impl Default for IncomeRuleConfig {
    fn default() -> Self {
        Self {
            excluded_codes_base: BASE_EXCLUDED_CODES.iter().map(|s| s.to_string()).collect(),
            excluded_codes_extra: EXTRA_EXCLUDED_CODES.iter().map(|s| s.to_string()).collect(),
            extra_cutoff_date: NaiveDate::from_ymd_opt(2025, 7, 22).unwrap_or_default(),
            non_business_keywords: owned(NON_BUSINESS_KEYWORDS),
            whitelist_keywords: owned(WHITELIST_KEYWORDS),
            keep_if_code_099: owned(KEEP_IF_CODE_099),
        }
    }
}

/// Per-transaction classification result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationFlags {
    pub knp_normalized: String,
    pub is_non_business_by_code: bool,
    pub is_non_business_by_keyword: bool,
    pub is_non_business: bool,
    pub credit_amount: f64,
    pub is_business_income: bool,
}

/// First digit run of a payment code.
fn code_digits(code: &str) -> &str {
    let start = match code.find(|c: char| c.is_ascii_digit()) {
        Some(i) => i,
        None => return "",
    };
    let rest = &code[start..];
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    &rest[..end]
}

/// Digits of the payment code with leading zeros stripped.
pub fn normalize_code(code: &str) -> String {
    code_digits(code).trim_start_matches('0').to_string()
}

/// Digits of the payment code zero-padded to three places.
fn padded_code(code: &str) -> String {
    format!("{:0>3}", code_digits(code))
}

/// Lowercased matching view of a rule config.
#[derive(Debug, Clone)]
pub struct IncomeRules {
    base: BTreeSet<String>,
    extra: BTreeSet<String>,
    cutoff: NaiveDate,
    blacklist: Vec<String>,
    whitelist: Vec<String>,
    keep_099: Vec<String>,
}

impl IncomeRules {
    pub fn new(cfg: &IncomeRuleConfig) -> Self {
        let lower = |v: &[String]| -> Vec<String> {
            v.iter().map(|k| k.to_lowercase()).filter(|k| !k.is_empty()).collect()
        };
        Self {
            base: cfg.excluded_codes_base.iter().map(|c| normalize_code(c)).collect(),
            extra: cfg.excluded_codes_extra.iter().map(|c| normalize_code(c)).collect(),
            cutoff: cfg.extra_cutoff_date,
            blacklist: lower(&cfg.non_business_keywords),
            whitelist: lower(&cfg.whitelist_keywords),
            keep_099: lower(&cfg.keep_if_code_099),
        }
    }

    pub fn classify(&self, tx: &Transaction) -> ClassificationFlags {
        let knp = normalize_code(&tx.payment_code);
        let by_code = (!knp.is_empty() && self.base.contains(&knp))
            || (tx.operation_date >= self.cutoff && !knp.is_empty() && self.extra.contains(&knp));

        let text = format!("{} {}", tx.purpose_text, tx.counterparty_name).to_lowercase();
        let matches = |list: &[String]| list.iter().any(|k| text.contains(k.as_str()));
        let by_keyword = matches(&self.blacklist) && !matches(&self.whitelist);

        let keep = padded_code(&tx.payment_code) == "099" && matches(&self.keep_099);
        let is_non_business = (by_code || by_keyword) && !keep;

        let credit_amount = tx.credit_value().unwrap_or(0.0);
        ClassificationFlags {
            knp_normalized: knp,
            is_non_business_by_code: by_code,
            is_non_business_by_keyword: by_keyword,
            is_non_business,
            credit_amount,
            is_business_income: !is_non_business && credit_amount > 0.0,
        }
    }
}

/// Classify every transaction. `mask`, when given, further restricts
/// `is_business_income` position by position; missing positions count as
/// excluded.
pub fn classify_all(
    transactions: &[Transaction],
    cfg: &IncomeRuleConfig,
    mask: Option<&[bool]>,
) -> Vec<ClassificationFlags> {
    let rules = IncomeRules::new(cfg);
    let mut flags: Vec<ClassificationFlags> = transactions.iter().map(|tx| rules.classify(tx)).collect();
    if let Some(mask) = mask {
        for (i, f) in flags.iter_mut().enumerate() {
            f.is_business_income &= mask.get(i).copied().unwrap_or(false);
        }
    }

    info!(
        "classified {} transactions: {} excluded by code, {} by keyword, {} business income",
        flags.len(),
        flags.iter().filter(|f| f.is_non_business_by_code).count(),
        flags.iter().filter(|f| f.is_non_business_by_keyword).count(),
        flags.iter().filter(|f| f.is_business_income).count()
    );
    flags
}
