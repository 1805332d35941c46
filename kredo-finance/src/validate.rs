//! Structural checks over projected transactions. Findings are reported,
//! never raised.

use std::fmt;

use kredo_core::Transaction;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingDocumentNo,
    /// Both or neither side carries an amount.
    AmbiguousSide,
    UnreadableAmount,
    BadTaxId,
    BadPaymentCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Position in the transaction list.
    pub index: usize,
    pub kind: IssueKind,
    pub detail: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {:?} ({})", self.index, self.kind, self.detail)
    }
}

/// `require_document_no` is set for layouts whose rows are keyed by a
/// document number. The operation date is typed and always present.
pub fn validate(transactions: &[Transaction], require_document_no: bool) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for (index, tx) in transactions.iter().enumerate() {
        let mut push = |kind, detail: String| issues.push(ValidationIssue { index, kind, detail });

        if require_document_no && tx.document_no.trim().is_empty() {
            push(IssueKind::MissingDocumentNo, String::new());
        }
        match (&tx.debit, &tx.credit) {
            (Some(_), Some(_)) | (None, None) => {
                push(IssueKind::AmbiguousSide, format!("debit {:?}, credit {:?}", tx.debit_raw(), tx.credit_raw()))
            }
            (Some(a), None) | (None, Some(a)) if a.value.is_none() => {
                push(IssueKind::UnreadableAmount, a.raw.clone())
            }
            _ => {}
        }
        if let Some(id) = tx.counterparty_id.as_ref().filter(|id| !is_digits(id, 12..=12)) {
            push(IssueKind::BadTaxId, id.clone());
        }
        let code = tx.payment_code.trim();
        if !code.is_empty() && !is_digits(code, 1..=5) {
            push(IssueKind::BadPaymentCode, code.to_string());
        }
    }
    issues
}

fn is_digits(s: &str, len: std::ops::RangeInclusive<usize>) -> bool {
    len.contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kredo_core::AmountText;

    fn base() -> Transaction {
        Transaction {
            operation_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            value_date: None,
            debit: None,
            credit: Some(AmountText::parse("1 000,00")),
            counterparty_name: "ТОО Альфа".into(),
            counterparty_id: Some("123456789012".into()),
            counterparty_account: None,
            purpose_text: "Оплата".into(),
            payment_code: "710".into(),
            document_no: "15".into(),
        }
    }

    #[test]
    fn test_clean_transaction_has_no_issues() {
        assert!(validate(&[base()], true).is_empty());
    }

    #[test]
    fn test_each_check_reports_its_kind() {
        let mut no_doc = base();
        no_doc.document_no.clear();
        let mut both = base();
        both.debit = Some(AmountText::parse("1,00"));
        let mut garbled = base();
        garbled.credit = Some(AmountText::parse("abc"));
        let mut short_id = base();
        short_id.counterparty_id = Some("12345".into());
        let mut long_code = base();
        long_code.payment_code = "710-A".into();

        let issues = validate(&[no_doc, both, garbled, short_id, long_code], true);
        let kinds: Vec<(usize, IssueKind)> = issues.iter().map(|i| (i.index, i.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (0, IssueKind::MissingDocumentNo),
                (1, IssueKind::AmbiguousSide),
                (2, IssueKind::UnreadableAmount),
                (3, IssueKind::BadTaxId),
                (4, IssueKind::BadPaymentCode),
            ]
        );
    }

    #[test]
    fn test_document_no_optional_when_not_required() {
        let mut tx = base();
        tx.document_no.clear();
        assert!(validate(&[tx], false).is_empty());
    }
}
