//! Header detection and column resolution.
//!
//! The header is the line (or a stitch of two or three consecutive lines)
//! with the most anchor keywords among the first `header_scan_lines` lines.
//! Its tokens are then segmented into raw column cells, each cell is mapped to
//! a canonical field, and every mapped field gets an x-band.

use std::collections::HashSet;

use kredo_core::{Line, ParseError, Result, Token};
use log::{debug, info};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::schema::{CompiledSchema, FieldSpec};

const STOP_TOKENS: &[&str] = &["в", "и", "по", "на", "за", "от", "of", "the", "no", "№"];

/// Header tokens closer than this (on one line) belong to the same phrase.
const PHRASE_GAP: f64 = 6.0;

/// Fallback page width when the statement carries no usable geometry.
const DEFAULT_PAGE_WIDTH: f64 = 595.0;

/// Lowercase, fold diacritics, keep letters/digits/slashes, collapse
/// whitespace and drop stop tokens.
pub fn normalize_label(s: &str) -> String {
    let folded: String = s
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(|c| c.to_lowercase())
        .map(|c| if c.is_alphanumeric() || c == '/' { c } else { ' ' })
        .collect();
    folded
        .split_whitespace()
        .filter(|t| !STOP_TOKENS.contains(t))
        .collect::<Vec<_>>()
        .join(" ")
}

fn label_tokens(s: &str) -> HashSet<String> {
    normalize_label(s)
        .split(|c: char| c == ' ' || c == '/')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// The chosen header: lines `first..=last` of the statement.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMatch {
    pub first_line: usize,
    pub last_line: usize,
    pub hits: usize,
    pub tokens: Vec<Token>,
}

/// One resolved column: schema field index and its `[left, right)` band.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBand {
    pub field: usize,
    pub left: f64,
    pub right: f64,
    /// Header text the field was mapped from; empty for static or fallback bands.
    pub label: String,
}

impl ColumnBand {
    pub fn contains(&self, x: f64) -> bool {
        self.left <= x && x < self.right
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub header: HeaderMatch,
    /// Sorted by `left`.
    pub bands: Vec<ColumnBand>,
}

impl TableLayout {
    /// Field index whose band holds `x`.
    pub fn field_at(&self, x: f64) -> Option<usize> {
        self.bands.iter().find(|b| b.contains(x)).map(|b| b.field)
    }

    pub fn band_of(&self, field: usize) -> Option<&ColumnBand> {
        self.bands.iter().find(|b| b.field == field)
    }
}

/// Locate the header, map its cells and resolve bands.
pub fn resolve_layout(lines: &[Line], schema: &CompiledSchema) -> Result<TableLayout> {
    let header = find_header(lines, schema)?;
    let bands = if schema.has_static_bands() {
        static_bands(schema.fields())
    } else {
        let page_width = lines
            .iter()
            .map(|l| l.max_x())
            .fold(f64::NEG_INFINITY, f64::max);
        let page_width = if page_width.is_finite() && page_width > 0.0 {
            page_width
        } else {
            DEFAULT_PAGE_WIDTH
        };
        infer_bands(&header.tokens, schema, page_width)
    };

    info!(
        "{}: header at lines {}..={} ({} anchors), {} columns resolved",
        schema.name(),
        header.first_line,
        header.last_line,
        header.hits,
        bands.len()
    );
    Ok(TableLayout { header, bands })
}

/// Best header candidate, strict pass first then the permissive one.
///
/// A stitch of `span` lines must clear the threshold plus `span - 1`, and
/// candidates rank by hits in excess of that stitch cost so a single header
/// line is not displaced by itself plus the first data row.
pub fn find_header(lines: &[Line], schema: &CompiledSchema) -> Result<HeaderMatch> {
    let s = schema.schema();
    let scan = s.header_scan_lines.min(lines.len());
    let mut best_hits = 0;

    for threshold in [s.min_anchor_hits, s.loose_anchor_hits] {
        // (score, first line, span, hits)
        let mut best: Option<(usize, usize, usize, usize)> = None;
        for i in 0..scan {
            for span in 1..=3usize {
                if i + span > lines.len() {
                    break;
                }
                let text = lines[i..i + span]
                    .iter()
                    .map(|l| l.text())
                    .collect::<Vec<_>>()
                    .join(" ");
                let hits = schema.anchor_hits(&text);
                best_hits = best_hits.max(hits);
                let need = threshold + span - 1;
                if hits < need.max(1) {
                    continue;
                }
                let score = hits - (span - 1);
                let better = match best {
                    None => true,
                    Some((bs, bi, bspan, _)) => {
                        score > bs || (score == bs && (i < bi || (i == bi && span < bspan)))
                    }
                };
                if better {
                    best = Some((score, i, span, hits));
                }
            }
        }

        if let Some((_, i, span, hits)) = best {
            if threshold != s.min_anchor_hits {
                debug!("{}: header found only by permissive pass", schema.name());
            }
            let mut tokens: Vec<Token> = lines[i..i + span]
                .iter()
                .flat_map(|l| l.tokens.iter().cloned())
                .collect();
            tokens.sort_by(|a, b| a.x0.total_cmp(&b.x0));
            return Ok(HeaderMatch {
                first_line: i,
                last_line: i + span - 1,
                hits,
                tokens,
            });
        }
    }

    Err(ParseError::HeaderNotFound {
        best_hits,
        required: s.loose_anchor_hits,
    })
}

fn static_bands(fields: &[FieldSpec]) -> Vec<ColumnBand> {
    let mut bands: Vec<ColumnBand> = fields
        .iter()
        .enumerate()
        .filter_map(|(i, f)| {
            f.band.map(|[left, right]| ColumnBand {
                field: i,
                left,
                right,
                label: String::new(),
            })
        })
        .collect();
    bands.sort_by(|a, b| a.left.total_cmp(&b.left));
    bands
}

/// A header phrase: horizontally adjacent tokens, merged across stitched lines
/// when their x-ranges overlap.
#[derive(Debug, Clone)]
struct Phrase {
    x0: f64,
    x1: f64,
    tokens: Vec<Token>,
}

impl Phrase {
    fn mid(&self) -> f64 {
        0.5 * (self.x0 + self.x1)
    }

    fn label(&self) -> String {
        let mut toks = self.tokens.clone();
        toks.sort_by(|a, b| a.doc_top().total_cmp(&b.doc_top()).then(a.x0.total_cmp(&b.x0)));
        kredo_core::token::join_texts(toks.iter())
    }
}

fn header_phrases(tokens: &[Token]) -> Vec<Phrase> {
    let mut phrases: Vec<Phrase> = Vec::new();
    let mut sorted = tokens.to_vec();
    sorted.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    for t in sorted {
        let joins = phrases.iter().position(|p| {
            let overlaps = t.x0 < p.x1 && t.x1 > p.x0;
            let adjacent_on_line = p
                .tokens
                .iter()
                .any(|q| (q.doc_top() - t.doc_top()).abs() < 1.0 && t.x0 - q.x1 < PHRASE_GAP);
            overlaps || adjacent_on_line
        });
        match joins {
            Some(idx) => {
                let p = &mut phrases[idx];
                p.x0 = p.x0.min(t.x0);
                p.x1 = p.x1.max(t.x1);
                p.tokens.push(t);
            }
            None => phrases.push(Phrase {
                x0: t.x0,
                x1: t.x1,
                tokens: vec![t],
            }),
        }
    }
    phrases.sort_by(|a, b| a.mid().total_cmp(&b.mid()));
    phrases
}

/// Bands from the widest gaps between header phrase midpoints, or from page
/// fractions when the header has fewer phrases than the schema has fields.
fn infer_bands(tokens: &[Token], schema: &CompiledSchema, page_width: f64) -> Vec<ColumnBand> {
    let fields = schema.fields();
    let k = fields.len();
    let phrases = header_phrases(tokens);

    if phrases.len() < k {
        debug!(
            "{}: {} header phrases for {} fields, using page fractions",
            schema.name(),
            phrases.len(),
            k
        );
        return fraction_bands(k, &schema.schema().default_fractions, page_width);
    }

    let mids: Vec<f64> = phrases.iter().map(|p| p.mid()).collect();
    let mut gaps: Vec<(f64, usize)> = mids.windows(2).enumerate().map(|(i, w)| (w[1] - w[0], i)).collect();
    gaps.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
    let mut cut_after: Vec<usize> = gaps.iter().take(k - 1).map(|(_, i)| *i).collect();
    cut_after.sort_unstable();

    let mut cells: Vec<(f64, f64, String)> = Vec::with_capacity(k);
    let last = phrases.len() - 1;
    let mut start = 0usize;
    let mut left = f64::NEG_INFINITY;
    for (n, &cut) in cut_after.iter().chain(std::iter::once(&last)).enumerate() {
        let right = if n < cut_after.len() {
            0.5 * (mids[cut] + mids[cut + 1])
        } else {
            f64::INFINITY
        };
        let label = phrases[start..=cut]
            .iter()
            .map(|p| p.label())
            .collect::<Vec<_>>()
            .join(" ");
        cells.push((left, right, label));
        left = right;
        start = cut + 1;
    }

    let labels: Vec<String> = cells.iter().map(|(_, _, l)| l.clone()).collect();
    let mapping = map_columns(&labels, fields);
    cells
        .into_iter()
        .zip(mapping)
        .filter_map(|((left, right, label), field)| {
            field.map(|field| ColumnBand {
                field,
                left,
                right,
                label,
            })
        })
        .collect()
}

fn fraction_bands(k: usize, fractions: &[f64], page_width: f64) -> Vec<ColumnBand> {
    let cuts: Vec<f64> = if fractions.len() + 1 == k {
        fractions.iter().map(|f| f * page_width).collect()
    } else {
        (1..k).map(|i| page_width * i as f64 / k as f64).collect()
    };
    (0..k)
        .map(|i| ColumnBand {
            field: i,
            left: if i == 0 { f64::NEG_INFINITY } else { cuts[i - 1] },
            right: if i + 1 == k { f64::INFINITY } else { cuts[i] },
            label: String::new(),
        })
        .collect()
}

/// Map raw header cells to schema fields.
///
/// Stages, each only over still-unused fields: exact name/alias match after
/// normalization, then alias containment (longest alias wins), then the best
/// Jaccard token overlap, then leftovers in schema order. Cells beyond the
/// field count stay unmapped.
pub fn map_columns(cells: &[String], fields: &[FieldSpec]) -> Vec<Option<usize>> {
    let mut mapped: Vec<Option<usize>> = vec![None; cells.len()];
    let mut used = vec![false; fields.len()];
    let norm_cells: Vec<String> = cells.iter().map(|c| normalize_label(c)).collect();
    let names: Vec<Vec<String>> = fields
        .iter()
        .map(|f| {
            std::iter::once(&f.name)
                .chain(f.aliases.iter())
                .map(|n| normalize_label(n))
                .filter(|n| !n.is_empty())
                .collect()
        })
        .collect();

    // exact
    for (ci, cell) in norm_cells.iter().enumerate() {
        if cell.is_empty() {
            continue;
        }
        if let Some(fi) = (0..fields.len()).find(|&fi| !used[fi] && names[fi].iter().any(|n| n == cell)) {
            mapped[ci] = Some(fi);
            used[fi] = true;
        }
    }

    // alias containment
    for (ci, cell) in norm_cells.iter().enumerate() {
        if mapped[ci].is_some() || cell.is_empty() {
            continue;
        }
        let best = (0..fields.len())
            .filter(|&fi| !used[fi])
            .filter_map(|fi| {
                names[fi]
                    .iter()
                    .filter(|n| cell.contains(n.as_str()))
                    .map(|n| n.chars().count())
                    .max()
                    .map(|len| (len, fi))
            })
            .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        if let Some((_, fi)) = best {
            mapped[ci] = Some(fi);
            used[fi] = true;
        }
    }

    // jaccard
    for (ci, cell) in cells.iter().enumerate() {
        if mapped[ci].is_some() {
            continue;
        }
        let ct = label_tokens(cell);
        if ct.is_empty() {
            continue;
        }
        let best = (0..fields.len())
            .filter(|&fi| !used[fi])
            .map(|fi| {
                let score = std::iter::once(&fields[fi].name)
                    .chain(fields[fi].aliases.iter())
                    .map(|n| jaccard(&ct, &label_tokens(n)))
                    .fold(0.0, f64::max);
                (score, fi)
            })
            .filter(|(score, _)| *score > 0.0)
            .max_by(|a, b| a.0.total_cmp(&b.0).then(b.1.cmp(&a.1)));
        if let Some((_, fi)) = best {
            mapped[ci] = Some(fi);
            used[fi] = true;
        }
    }

    // leftovers in schema order
    let mut remaining = (0..fields.len()).filter(|&fi| !used[fi]);
    for slot in mapped.iter_mut().filter(|m| m.is_none()) {
        match remaining.next() {
            Some(fi) => *slot = Some(fi),
            None => break,
        }
    }
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{cluster_lines, normalize_tokens};
    use crate::schema::{FieldKind, FieldRole, RowStart, Schema, SideResolution, default_footer_keywords};
    use kredo_core::{PageTokens, Word};

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("Дата", FieldRole::OperationDate, FieldKind::Text).aliases(&["дата операции"]),
            FieldSpec::new("Номер документа", FieldRole::DocumentNo, FieldKind::Text).aliases(&["№ док"]),
            FieldSpec::new("Дебет", FieldRole::Debit, FieldKind::Numeric),
            FieldSpec::new("Кредит", FieldRole::Credit, FieldKind::Numeric),
            FieldSpec::new("Назначение платежа", FieldRole::Purpose, FieldKind::FreeText),
        ]
    }

    fn schema() -> CompiledSchema {
        Schema {
            name: "test".into(),
            fields: fields(),
            header_anchors: ["дата", "документ", "дебет", "кредит", "назначение"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_anchor_hits: 4,
            loose_anchor_hits: 2,
            header_scan_lines: 80,
            row_start: RowStart {
                date_fields: vec!["Дата".into()],
                date_pattern: r"^\d{2}\.\d{2}\.\d{4}".into(),
                id_field: None,
                id_pattern: ".+".into(),
            },
            primary_id_field: None,
            footer_keywords: default_footer_keywords(),
            footer_patterns: Vec::new(),
            footer_terminates_page: false,
            skip_phrases: vec![],
            line_tolerance: 1.0,
            default_fractions: vec![],
            side_resolution: SideResolution::PreferNonZero,
        }
        .compile()
        .unwrap()
    }

    fn w(text: &str, x0: f64, top: f64) -> Word {
        Word::new(text, x0, x0 + 5.0 * text.chars().count() as f64, top, top + 8.0)
    }

    fn lines(words: Vec<Word>) -> Vec<Line> {
        let toks = normalize_tokens(&[PageTokens { page_index: 0, words }]);
        cluster_lines(&toks, 1.0)
    }

    #[test]
    fn test_normalize_label_folds_and_strips() {
        assert_eq!(normalize_label("  Назначение   ПЛАТЕЖА: "), "назначение платежа");
        assert_eq!(normalize_label("Ёлка"), "елка");
        assert_eq!(normalize_label("Café № док"), "cafe док");
        assert_eq!(normalize_label("ИИН/БИН"), "иин/бин");
    }

    #[test]
    fn test_map_columns_exact_alias_jaccard_leftover() {
        let cells: Vec<String> = vec![
            "Дата операции".into(),       // alias exact
            "№ док.".into(),              // alias exact after normalization
            "Сумма по дебету".into(),     // containment
            "Кредит".into(),              // exact
            "Назначение".into(),          // jaccard
        ];
        let m = map_columns(&cells, &fields());
        assert_eq!(m, vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn test_map_columns_extra_cells_unmapped() {
        let cells: Vec<String> = vec!["Дата".into(), "Дебет".into(), "Кредит".into(), "x".into(), "y".into(), "z".into()];
        let m = map_columns(&cells, &fields()[..3]);
        assert_eq!(m, vec![Some(0), Some(2), Some(1), None, None, None]);
    }

    #[test]
    fn test_find_header_single_line() {
        let ls = lines(vec![
            w("Выписка", 10.0, 10.0),
            w("Дата", 10.0, 40.0),
            w("Документ", 80.0, 40.0),
            w("Дебет", 160.0, 40.0),
            w("Кредит", 230.0, 40.0),
            w("Назначение", 300.0, 40.0),
            w("01.02.2024", 10.0, 60.0),
        ]);
        let h = find_header(&ls, &schema()).unwrap();
        assert_eq!((h.first_line, h.last_line, h.hits), (1, 1, 5));
    }

    #[test]
    fn test_find_header_stitched_across_lines() {
        let ls = lines(vec![
            w("Дата", 10.0, 40.0),
            w("Номер", 80.0, 40.0),
            w("Дебет", 160.0, 40.0),
            w("документа", 80.0, 50.0),
            w("Кредит", 230.0, 50.0),
            w("Назначение", 300.0, 50.0),
            w("01.02.2024", 10.0, 70.0),
        ]);
        let h = find_header(&ls, &schema()).unwrap();
        assert_eq!((h.first_line, h.last_line), (0, 1));
        assert_eq!(h.hits, 5);
    }

    #[test]
    fn test_find_header_permissive_pass() {
        let ls = lines(vec![w("Дата", 10.0, 40.0), w("Кредит", 200.0, 40.0)]);
        let h = find_header(&ls, &schema()).unwrap();
        assert_eq!(h.hits, 2);
    }

    #[test]
    fn test_find_header_fatal_when_nothing_qualifies() {
        let ls = lines(vec![w("Счет-фактура", 10.0, 40.0), w("Дата", 200.0, 80.0)]);
        let err = find_header(&ls, &schema()).unwrap_err();
        assert_eq!(err, ParseError::HeaderNotFound { best_hits: 1, required: 2 });
    }

    #[test]
    fn test_infer_bands_from_gaps() {
        let ls = lines(vec![
            w("Дата", 10.0, 40.0),
            w("Номер", 80.0, 40.0),
            w("документа", 110.0, 40.0),
            w("Дебет", 200.0, 40.0),
            w("Кредит", 260.0, 40.0),
            w("Назначение", 330.0, 40.0),
            w("платежа", 385.0, 40.0),
        ]);
        let layout = resolve_layout(&ls, &schema()).unwrap();
        assert_eq!(layout.bands.len(), 5);
        let fields: Vec<usize> = layout.bands.iter().map(|b| b.field).collect();
        assert_eq!(fields, vec![0, 1, 2, 3, 4]);
        assert_eq!(layout.bands[1].label, "Номер документа");
        assert_eq!(layout.field_at(0.0), Some(0));
        assert_eq!(layout.field_at(215.0), Some(2));
        assert_eq!(layout.field_at(900.0), Some(4));
    }

    #[test]
    fn test_fraction_fallback_when_header_sparse() {
        let bands = fraction_bands(4, &[], 400.0);
        assert_eq!(bands[1].left, 100.0);
        assert_eq!(bands[3].right, f64::INFINITY);
        let custom = fraction_bands(3, &[0.2, 0.5], 100.0);
        assert_eq!(custom[1].left, 20.0);
        assert_eq!(custom[1].right, 50.0);
    }
}
