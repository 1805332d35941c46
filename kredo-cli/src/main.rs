use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use kredo_core::ParseError;
use kredo_ingest::{detect_bank, parser_for, Bank};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod pipeline;
mod state;

use pipeline::Job;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("KREDO_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "kredo", version = VERSION, about = "Bank statement reconstruction and income evaluation")]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct WindowArgs {
    /// Anchor date for a trailing window (YYYY-MM-DD)
    #[arg(long)]
    anchor: Option<NaiveDate>,

    /// Trailing window length in months (default 12 with --anchor); without
    /// --anchor the statement's generation date or period end anchors it
    #[arg(long)]
    months: Option<u32>,

    /// Close the window with the anchor's own month
    #[arg(long)]
    test_window: bool,

    /// Explicit window start (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Explicit window end (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconstruct one statement and write its CSV artifacts
    Parse {
        /// Bank layout; detected when omitted
        #[arg(long)]
        bank: Option<Bank>,

        /// Token JSON from the PDF extractor
        #[arg(long)]
        tokens: PathBuf,

        /// TOML schema replacing the built-in layout
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Rule file (default: ~/.kredo/rules.toml, else built-in rules)
        #[arg(long)]
        rules: Option<PathBuf>,

        #[command(flatten)]
        window: WindowArgs,

        /// Output directory
        #[arg(long)]
        out: PathBuf,
    },

    /// Print the bank layout that fits a token file
    Detect {
        #[arg(long)]
        tokens: PathBuf,
    },

    /// Parse every *.json token file in a directory in parallel
    Batch {
        #[arg(long)]
        bank: Option<Bank>,

        #[arg(long)]
        dir: PathBuf,

        #[arg(long)]
        rules: Option<PathBuf>,

        #[command(flatten)]
        window: WindowArgs,

        /// One sub-directory per statement is created here
        #[arg(long)]
        out: PathBuf,
    },

    /// Income rule configuration
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },

    /// Print a built-in layout as TOML, a starting point for --schema
    Schema {
        #[arg(long)]
        bank: Bank,
    },
}

#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// Write the default rules to ~/.kredo/rules.toml
    Init,

    /// Print the rules in effect
    Show {
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

impl WindowArgs {
    fn spec(&self) -> Result<kredo_finance::WindowSpec> {
        pipeline::window_spec(self.anchor, self.months, self.test_window, self.start, self.end)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) if e.downcast_ref::<ParseError>().is_some_and(ParseError::is_table_not_found) => {
            eprintln!("table not found: {e:#}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Parse {
            bank,
            tokens,
            schema,
            rules,
            window,
            out,
        } => {
            let job = Job {
                tokens,
                out_dir: out,
                bank,
                schema: schema.as_deref().map(config::load_schema).transpose()?,
                rules: config::load_rules(rules.as_deref())?,
                window: window.spec()?,
            };
            let outcome = pipeline::run(&job)?;
            outcome.print();
            println!("\nWrote {}", job.out_dir.display());
        }

        Command::Detect { tokens } => {
            let pages = state::read_tokens(&tokens)?;
            match detect_bank(&pages) {
                Some(bank) => println!("{} ({})", bank, bank.display_name()),
                None => {
                    println!("no built-in layout matches {}", tokens.display());
                    return Ok(ExitCode::from(2));
                }
            }
        }

        Command::Batch {
            bank,
            dir,
            rules,
            window,
            out,
        } => {
            let rules = config::load_rules(rules.as_deref())?;
            let window = window.spec()?;
            let files = state::token_files(&dir)?;
            if files.is_empty() {
                bail!("no *.json token files in {}", dir.display());
            }
            return batch(files, bank, rules, window, out).await;
        }

        Command::Rules { command } => match command {
            RulesCommand::Init => config::init_rules()?,
            RulesCommand::Show { rules } => {
                let cfg = config::load_rules(rules.as_deref())?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize rules")?);
            }
        },

        Command::Schema { bank } => {
            let schema = parser_for(bank).schema();
            print!("{}", toml::to_string_pretty(&schema).context("serialize schema")?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// One blocking task per statement; a failed statement does not stop the others.
async fn batch(
    files: Vec<PathBuf>,
    bank: Option<Bank>,
    rules: kredo_finance::IncomeRuleConfig,
    window: kredo_finance::WindowSpec,
    out: PathBuf,
) -> Result<ExitCode> {
    let mut handles = Vec::with_capacity(files.len());
    for tokens in files {
        let stem = tokens
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "statement".to_string());
        let job = Job {
            out_dir: out.join(&stem),
            tokens,
            bank,
            schema: None,
            rules: rules.clone(),
            window,
        };
        handles.push(tokio::task::spawn_blocking(move || {
            let result = pipeline::run(&job);
            (job.tokens, result)
        }));
    }

    let total = handles.len();
    let mut failed = 0;
    for handle in handles {
        let (tokens, result) = handle.await.context("statement task panicked")?;
        match result {
            Ok(outcome) => {
                let s = &outcome.report.summary;
                println!(
                    "ok    {}  [{}] {} tx, {} income rows, adjusted {:.2}{}",
                    tokens.display(),
                    outcome.layout,
                    outcome.statement.transactions.len(),
                    s.transactions_used,
                    s.adjusted_income,
                    if outcome.reconciliation.ok { "" } else { ", totals mismatch" }
                );
            }
            Err(e) => {
                failed += 1;
                let kind = if e.downcast_ref::<ParseError>().is_some_and(ParseError::is_table_not_found) {
                    "table not found"
                } else {
                    "error"
                };
                println!("fail  {}  {kind}: {e:#}", tokens.display());
                error!("{}: {e:#}", tokens.display());
            }
        }
    }

    info!("batch finished: {} of {total} statements parsed", total - failed);
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
