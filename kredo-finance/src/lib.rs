//! kredo-finance: business-income evaluation of reconstructed statements.
//!
//! Everything here is a pure function of the transaction list and an
//! `IncomeRuleConfig`; output tables are written through `export`.

pub mod aggregate;
pub mod export;
pub mod reconcile;
pub mod rules;
pub mod validate;
pub mod window;

pub use aggregate::{aggregate, compute_income, IncomeReport, IncomeSummary, MonthlyBucket, SUMMARY_FORMULA};
pub use export::ExportError;
pub use reconcile::{reconcile, Mismatch, ReconciliationReport};
pub use rules::{classify_all, normalize_code, ClassificationFlags, IncomeRuleConfig, IncomeRules};
pub use validate::{validate, IssueKind, ValidationIssue};
pub use window::{IncomeWindow, WindowMode, WindowSpec};
