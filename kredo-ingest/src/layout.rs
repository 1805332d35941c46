//! Token normalization and line clustering.

use kredo_core::{Line, PageTokens, Token};

const MIN_WIDTH: f64 = 6.0;
const CHAR_WIDTH: f64 = 4.6;
const DEFAULT_HEIGHT: f64 = 8.0;

/// Flatten extractor pages into one stream ordered by
/// (page-offset top, top, x0). Empty-text words are dropped and missing or
/// degenerate geometry is estimated from the text length.
pub fn normalize_tokens(pages: &[PageTokens]) -> Vec<Token> {
    let mut tokens: Vec<Token> = pages
        .iter()
        .flat_map(|page| {
            page.words.iter().filter_map(move |w| {
                let text = w.text.trim();
                if text.is_empty() {
                    return None;
                }
                let x1 = match w.x1 {
                    Some(x1) if x1 > w.x0 => x1,
                    _ => w.x0 + MIN_WIDTH.max(CHAR_WIDTH * text.chars().count() as f64),
                };
                let bottom = match w.bottom {
                    Some(b) if b > w.top => b,
                    _ => w.top + DEFAULT_HEIGHT,
                };
                Some(Token {
                    text: text.to_string(),
                    x0: w.x0,
                    x1,
                    top: w.top,
                    bottom,
                    page_index: page.page_index,
                })
            })
        })
        .collect();

    tokens.sort_by(|a, b| {
        a.doc_top()
            .total_cmp(&b.doc_top())
            .then(a.top.total_cmp(&b.top))
            .then(a.x0.total_cmp(&b.x0))
    });
    tokens
}

/// Group an ordered token stream into lines.
///
/// A token opens a new line when its `doc_top` is more than `tolerance` away
/// from the reference of the current line; a distance of exactly `tolerance`
/// stays on the current line. Tokens inside each line are ordered by `x0`.
pub fn cluster_lines(tokens: &[Token], tolerance: f64) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    for tok in tokens {
        match lines.last_mut() {
            Some(line) if (tok.doc_top() - line.doc_top).abs() <= tolerance => {
                line.tokens.push(tok.clone());
            }
            _ => lines.push(Line::new(tok.clone())),
        }
    }
    for line in &mut lines {
        line.tokens.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    }
    lines
}
