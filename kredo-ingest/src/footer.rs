//! Turnover totals printed in the statement footer.

use kredo_core::time::find_date;
use kredo_core::token::join_texts;
use kredo_core::{is_amount_fragment, parse_amount, FooterTotals, Line, Token};
use log::debug;

use crate::header::{ColumnBand, TableLayout};
use crate::schema::{CompiledSchema, FieldRole};

/// Numeric tokens closer than this are parts of one number.
const STITCH_GAP: f64 = 5.2;

const TURNOVER_PREFIXES: &[&str] = &["итого", "обороты", "всего"];

/// One stitched number and its horizontal centre.
#[derive(Debug, Clone, PartialEq)]
struct NumericGroup {
    value: f64,
    x_mid: f64,
}

fn numeric_groups(line: &Line) -> Vec<NumericGroup> {
    let numeric: Vec<&Token> = line
        .tokens
        .iter()
        .filter(|t| is_amount_fragment(&t.text) && find_date(&t.text).is_none())
        .collect();

    let mut groups: Vec<Vec<&Token>> = Vec::new();
    for tok in numeric {
        match groups.last_mut() {
            Some(g) if g.last().is_some_and(|prev| tok.x0 - prev.x1 < STITCH_GAP) => g.push(tok),
            _ => groups.push(vec![tok]),
        }
    }

    groups
        .into_iter()
        .filter_map(|g| {
            let value = parse_amount(&join_texts(g.iter().copied()))?;
            let x0 = g.first()?.x0;
            let x1 = g.last()?.x1;
            Some(NumericGroup {
                value,
                x_mid: 0.5 * (x0 + x1),
            })
        })
        .collect()
}

/// Debit and credit turnovers from the first turnover line below the header
/// that holds at least two numbers.
///
/// Groups are assigned by the debit/credit bands when both land in them;
/// otherwise the first two groups are read in column order.
pub fn extract_footer_totals(lines: &[Line], layout: &TableLayout, schema: &CompiledSchema) -> FooterTotals {
    let debit_band = schema.field_for(FieldRole::Debit).and_then(|f| layout.band_of(f));
    let credit_band = schema.field_for(FieldRole::Credit).and_then(|f| layout.band_of(f));
    let credit_first = matches!((debit_band, credit_band), (Some(d), Some(c)) if c.left < d.left);

    for line in lines.iter().skip(layout.header.last_line + 1) {
        let lower = line.text().to_lowercase();
        if !TURNOVER_PREFIXES.iter().any(|p| lower.starts_with(p)) {
            continue;
        }
        let groups = numeric_groups(line);
        if groups.len() < 2 {
            continue;
        }

        let in_band = |band: Option<&ColumnBand>| {
            band.and_then(|b| groups.iter().find(|g| b.contains(g.x_mid)).map(|g| g.value))
        };
        let totals = match (in_band(debit_band), in_band(credit_band)) {
            (Some(d), Some(c)) => FooterTotals {
                total_debit: Some(d),
                total_credit: Some(c),
            },
            _ if credit_first => FooterTotals {
                total_debit: Some(groups[1].value),
                total_credit: Some(groups[0].value),
            },
            _ => FooterTotals {
                total_debit: Some(groups[0].value),
                total_credit: Some(groups[1].value),
            },
        };
        debug!("{}: footer turnovers {:?}", schema.name(), totals);
        return totals;
    }
    FooterTotals::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderMatch;
    use crate::schema::{default_footer_keywords, FieldKind, FieldSpec, RowStart, Schema, SideResolution};

    fn tok(text: &str, x0: f64, x1: f64) -> Token {
        Token {
            text: text.into(),
            x0,
            x1,
            top: 500.0,
            bottom: 508.0,
            page_index: 0,
        }
    }

    fn line(toks: Vec<Token>) -> Line {
        let mut it = toks.into_iter();
        let mut l = Line::new(it.next().unwrap());
        l.tokens.extend(it);
        l
    }

    fn schema() -> CompiledSchema {
        Schema {
            name: "footer".into(),
            fields: vec![
                FieldSpec::new("Дата", FieldRole::OperationDate, FieldKind::Text),
                FieldSpec::new("Дебет", FieldRole::Debit, FieldKind::Numeric),
                FieldSpec::new("Кредит", FieldRole::Credit, FieldKind::Numeric),
            ],
            header_anchors: vec!["дата".into()],
            min_anchor_hits: 1,
            loose_anchor_hits: 1,
            header_scan_lines: 80,
            row_start: RowStart {
                date_fields: vec!["Дата".into()],
                date_pattern: r"^\d{2}\.\d{2}\.\d{4}".into(),
                id_field: None,
                id_pattern: ".*".into(),
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

    fn layout(debit: (f64, f64), credit: (f64, f64)) -> TableLayout {
        TableLayout {
            header: HeaderMatch {
                first_line: 0,
                last_line: 0,
                hits: 1,
                tokens: vec![],
            },
            bands: vec![
                ColumnBand { field: 0, left: f64::NEG_INFINITY, right: 100.0, label: String::new() },
                ColumnBand { field: 1, left: debit.0, right: debit.1, label: String::new() },
                ColumnBand { field: 2, left: credit.0, right: credit.1, label: String::new() },
            ],
        }
    }

    #[test]
    fn test_stitches_split_numbers() {
        let l = line(vec![tok("Итого", 0.0, 30.0), tok("1", 120.0, 125.0), tok("250,00", 128.0, 150.0), tok("900,00", 220.0, 245.0)]);
        let groups = numeric_groups(&l);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].value, 1250.0);
    }

    #[test]
    fn test_footer_totals_by_band() {
        let lines = vec![
            line(vec![tok("Дата", 0.0, 30.0)]),
            line(vec![tok("01.02.2024", 0.0, 40.0), tok("5,00", 220.0, 240.0)]),
            line(vec![tok("Исходящий", 0.0, 40.0), tok("остаток", 45.0, 70.0), tok("5,00", 120.0, 140.0)]),
            line(vec![tok("Итого", 0.0, 30.0), tok("обороты", 35.0, 70.0), tok("0,00", 120.0, 140.0), tok("5,00", 220.0, 240.0)]),
        ];
        let t = extract_footer_totals(&lines, &layout((100.0, 200.0), (200.0, f64::INFINITY)), &schema());
        assert_eq!(t.total_debit, Some(0.0));
        assert_eq!(t.total_credit, Some(5.0));
    }

    #[test]
    fn test_footer_totals_credit_first_fallback() {
        let lines = vec![
            line(vec![tok("Дата", 0.0, 30.0)]),
            line(vec![tok("Всего", 0.0, 30.0), tok("7,00", 40.0, 60.0), tok("3,00", 70.0, 90.0)]),
        ];
        let t = extract_footer_totals(&lines, &layout((200.0, 300.0), (100.0, 200.0)), &schema());
        assert_eq!(t.total_credit, Some(7.0));
        assert_eq!(t.total_debit, Some(3.0));
    }

    #[test]
    fn test_no_footer_gives_empty_totals() {
        let lines = vec![line(vec![tok("Дата", 0.0, 30.0)])];
        assert_eq!(
            extract_footer_totals(&lines, &layout((100.0, 200.0), (200.0, 300.0)), &schema()),
            FooterTotals::default()
        );
    }
}
