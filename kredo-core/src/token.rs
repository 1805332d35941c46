//! Positioned text tokens and the lines they form.
//!
//! `Word` is the wire shape produced by the external PDF extractor; `Token` is
//! the normalized, immutable form the pipeline works on (geometry always
//! complete, page index attached).

use serde::{Deserialize, Serialize};

/// Vertical distance inserted between pages so a single sort keeps them apart.
pub const PAGE_Y_OFFSET: f64 = 100_000.0;

/// One word as emitted by the extractor. `x1`/`bottom` may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub x0: f64,
    #[serde(default)]
    pub x1: Option<f64>,
    pub top: f64,
    #[serde(default)]
    pub bottom: Option<f64>,
}

impl Word {
    pub fn new(text: impl Into<String>, x0: f64, x1: f64, top: f64, bottom: f64) -> Self {
        Self {
            text: text.into(),
            x0,
            x1: Some(x1),
            top,
            bottom: Some(bottom),
        }
    }
}

/// All words of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTokens {
    pub page_index: usize,
    #[serde(default)]
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    pub bottom: f64,
    pub page_index: usize,
}

impl Token {
    pub fn x_mid(&self) -> f64 {
        0.5 * (self.x0 + self.x1)
    }

    /// `top` shifted by the page offset; comparable across pages.
    pub fn doc_top(&self) -> f64 {
        self.page_index as f64 * PAGE_Y_OFFSET + self.top
    }
}

/// Tokens sharing one vertical band, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub tokens: Vec<Token>,
    /// Reference `doc_top` of the first token that opened the line.
    pub doc_top: f64,
    pub page_index: usize,
}

impl Line {
    pub fn new(first: Token) -> Self {
        Self {
            doc_top: first.doc_top(),
            page_index: first.page_index,
            tokens: vec![first],
        }
    }

    pub fn text(&self) -> String {
        join_texts(self.tokens.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn min_x(&self) -> f64 {
        self.tokens.iter().map(|t| t.x0).fold(f64::INFINITY, f64::min)
    }

    pub fn max_x(&self) -> f64 {
        self.tokens.iter().map(|t| t.x1).fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Space-join token texts and collapse whitespace.
pub fn join_texts<'a>(tokens: impl Iterator<Item = &'a Token>) -> String {
    let joined: Vec<&str> = tokens.map(|t| t.text.as_str()).collect();
    collapse_whitespace(&joined.join(" "))
}

/// Collapse every run of whitespace (including NBSP and narrow NBSP) to one
/// space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}' || c == '\u{202f}')
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
