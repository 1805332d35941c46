//! One statement from token file to CSV artifacts.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use kredo_finance::export::{write_classified, write_monthly, write_records, write_summary};
use kredo_finance::{
    compute_income, reconcile, validate, IncomeReport, IncomeRuleConfig, ReconciliationReport, WindowMode,
    WindowSpec,
};
use kredo_core::StatementMeta;
use kredo_ingest::{detect_bank, parse_with_schema, parser_for, Bank, ParsedStatement, Schema};
use log::{debug, info};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::state::read_tokens;

/// Everything needed to process one statement. Owned so it can move into a
/// blocking task.
#[derive(Debug, Clone)]
pub struct Job {
    pub tokens: PathBuf,
    pub out_dir: PathBuf,
    /// `None` means detect.
    pub bank: Option<Bank>,
    pub schema: Option<Schema>,
    pub rules: IncomeRuleConfig,
    pub window: WindowSpec,
}

#[derive(Debug)]
pub struct Outcome {
    /// Layout actually used: a bank key or the custom schema's name.
    pub layout: String,
    pub statement: ParsedStatement,
    pub report: IncomeReport,
    pub reconciliation: ReconciliationReport,
    pub issues: usize,
}

impl Outcome {
    pub fn print(&self) {
        let s = &self.report.summary;
        let m = &self.statement.meta;
        println!("Layout:        {}", self.layout);
        if let Some(account) = &m.account {
            println!("Account:       {account}");
        }
        if let (Some(start), Some(end)) = (m.period_start, m.period_end) {
            println!("Period:        {start} .. {end}");
        }
        println!("Transactions:  {}", self.statement.transactions.len());
        if let Some(w) = self.report.window {
            println!("Window:        {} .. {}", w.start_date, w.end_date);
        }
        if self.report.has_no_income() {
            println!("Income:        no qualifying income rows");
        } else {
            println!("Income rows:   {}", s.transactions_used);
            println!("Total:         {:.2}", s.total_sum);
            println!("Max / min:     {:.2} / {:.2}", s.max_transaction, s.min_transaction);
            println!("Adjusted:      {:.2}  ({})", s.adjusted_income, s.formula);
        }
        let r = &self.reconciliation;
        println!(
            "Totals check:  {} (debit {:.2}, credit {:.2})",
            if r.ok { "ok".to_string() } else { format!("MISMATCH {:?}", r.mismatches) },
            r.parsed_debit,
            r.parsed_credit
        );
        if let (Some(computed), Some(printed)) = (r.computed_closing, r.closing_balance) {
            println!("Closing:       {computed:.2} computed, {printed:.2} printed");
        }
        if self.issues > 0 {
            println!("Validation:    {} issue(s), see log", self.issues);
        }
    }
}

/// Window from the command-line flags.
pub fn window_spec(
    anchor: Option<NaiveDate>,
    months: Option<u32>,
    test_window: bool,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<WindowSpec> {
    let mode = if test_window {
        WindowMode::Test
    } else {
        WindowMode::Production
    };
    Ok(match (start, end, anchor, months) {
        (Some(start), Some(end), None, None) => {
            if start > end {
                bail!("--start {start} is after --end {end}");
            }
            WindowSpec::Explicit { start, end }
        }
        (Some(_), None, ..) | (None, Some(_), ..) => bail!("--start and --end go together"),
        (Some(_), Some(_), ..) => bail!("--start/--end cannot be combined with --anchor/--months"),
        (None, None, Some(anchor), months) => WindowSpec::Trailing {
            anchor,
            months: months.unwrap_or(12),
            mode,
        },
        (None, None, None, Some(months)) => WindowSpec::TrailingFromLatest { months },
        (None, None, None, None) => {
            if test_window {
                bail!("--test-window needs --anchor");
            }
            WindowSpec::All
        }
    })
}

/// `--months` without `--anchor` anchors on the statement's generation date,
/// else its period end; only a statement printing neither falls back to the
/// latest operation.
pub fn statement_window(spec: WindowSpec, meta: &StatementMeta) -> WindowSpec {
    match (spec, meta.generated_on.or(meta.period_end)) {
        (WindowSpec::TrailingFromLatest { months }, Some(anchor)) => WindowSpec::Trailing {
            anchor,
            months,
            mode: WindowMode::Production,
        },
        (spec, _) => spec,
    }
}

pub fn run(job: &Job) -> Result<Outcome> {
    let pages = read_tokens(&job.tokens)?;

    let (layout, statement) = match (&job.schema, job.bank) {
        (Some(schema), _) => (schema.name.clone(), parse_with_schema(&pages, schema.clone())?),
        (None, Some(bank)) => (bank.key().to_string(), parser_for(bank).parse(&pages)?),
        (None, None) => {
            let Some(bank) = detect_bank(&pages) else {
                bail!("no built-in layout matches {}", job.tokens.display());
            };
            info!("{}: detected {}", job.tokens.display(), bank.display_name());
            (bank.key().to_string(), parser_for(bank).parse(&pages)?)
        }
    };

    let require_doc_no = statement
        .columns
        .iter()
        .any(|c| c.to_lowercase().contains("документ"));
    let found = validate(&statement.transactions, require_doc_no);
    for issue in &found {
        debug!("{}: {issue}", job.tokens.display());
    }

    let reconciliation = reconcile(&statement.transactions, &statement.footer, &statement.meta);
    let window = statement_window(job.window, &statement.meta);
    let report = compute_income(&statement.transactions, &job.rules, window, None);
    write_artifacts(&job.out_dir, &statement, &report)?;

    Ok(Outcome {
        layout,
        statement,
        report,
        reconciliation,
        issues: found.len(),
    })
}

fn create(dir: &Path, name: &str) -> Result<BufWriter<File>> {
    let p = dir.join(name);
    let f = File::create(&p).with_context(|| format!("create {}", p.display()))?;
    Ok(BufWriter::new(f))
}

pub fn write_artifacts(dir: &Path, st: &ParsedStatement, report: &IncomeReport) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    write_records(create(dir, "transactions.csv")?, &st.columns, &st.records).context("write transactions.csv")?;
    write_classified(create(dir, "classified.csv")?, &st.columns, &st.records, &st.transactions, &report.flags)
        .context("write classified.csv")?;
    write_monthly(create(dir, "monthly.csv")?, &report.monthly).context("write monthly.csv")?;
    write_summary(create(dir, "summary.csv")?, &report.summary).context("write summary.csv")?;
    Ok(())
}
