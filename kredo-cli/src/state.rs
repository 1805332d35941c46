use anyhow::{Context, Result};
use kredo_core::PageTokens;
use std::fs;
use std::path::{Path, PathBuf};

pub fn kredo_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".kredo"))
}

pub fn ensure_kredo_home() -> Result<PathBuf> {
    let dir = kredo_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Token dump produced by the PDF extractor.
pub fn read_tokens(path: &Path) -> Result<Vec<PageTokens>> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("decode tokens from {}", path.display()))
}

/// `*.json` files directly inside `dir`, sorted by name.
pub fn token_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
