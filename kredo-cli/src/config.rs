use anyhow::{Context, Result};
use kredo_finance::IncomeRuleConfig;
use kredo_ingest::Schema;
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::{ensure_kredo_home, kredo_home};

const RULES_FILE: &str = "rules.toml";

/// Rules from `path`, else `~/.kredo/rules.toml`, else the built-in defaults.
/// Reading never creates `~/.kredo`.
pub fn load_rules(path: Option<&Path>) -> Result<IncomeRuleConfig> {
    resolve_rules(path, kredo_home().ok().as_deref())
}

fn resolve_rules(path: Option<&Path>, home: Option<&Path>) -> Result<IncomeRuleConfig> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => match home.map(|h| h.join(RULES_FILE)).filter(|p| p.is_file()) {
            Some(p) => p,
            None => return Ok(IncomeRuleConfig::default()),
        },
    };
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_rules(cfg: &IncomeRuleConfig) -> Result<PathBuf> {
    let p = ensure_kredo_home()?.join(RULES_FILE);
    let s = toml::to_string_pretty(cfg).context("serialize rules")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(p)
}

pub fn init_rules() -> Result<()> {
    let p = kredo_home()?.join(RULES_FILE);
    if p.exists() {
        println!("Rules already exist: {}", p.display());
        return Ok(());
    }
    let p = save_rules(&IncomeRuleConfig::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn load_schema(path: &Path) -> Result<Schema> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse schema {}", path.display()))
}
