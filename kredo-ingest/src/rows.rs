//! Row reconstruction: lines below the header become records.
//!
//! A two-state machine walks the lines once. `AwaitingRowStart` ignores
//! everything until a row-start line appears; `InRow` owns the buffer of the
//! record being assembled and merges continuation lines into it band by band.
//! Footer lines close the open record and are discarded.

use kredo_core::time::find_date;
use kredo_core::token::{collapse_whitespace, join_texts};
use kredo_core::{is_amount_fragment, parse_amount, Line, Record, Token};
use log::{debug, info};

use crate::header::{normalize_label, TableLayout};
use crate::schema::{CompiledSchema, FieldKind, FieldRole, SideResolution};

/// A mid-table header repeats its labels across at least this many columns.
const MIN_HEADER_COLUMNS: usize = 3;

/// Line cells split by band; index = schema field index.
fn line_cells<'a>(line: &'a Line, layout: &TableLayout, width: usize) -> Vec<Vec<&'a Token>> {
    let mut cells: Vec<Vec<&Token>> = vec![Vec::new(); width];
    for tok in &line.tokens {
        if let Some(field) = layout.field_at(tok.x_mid()) {
            if field < width {
                cells[field].push(tok);
            }
        }
    }
    cells
}

/// Fragments collected for one record, one entry per contributing line.
#[derive(Debug, Default)]
struct RowBuffer {
    fragments: Vec<Vec<String>>,
    first_line: usize,
}

impl RowBuffer {
    fn open(width: usize, first_line: usize) -> Self {
        Self {
            fragments: vec![Vec::new(); width],
            first_line,
        }
    }

    fn absorb(&mut self, cells: &[Vec<&Token>]) {
        for (field, toks) in cells.iter().enumerate() {
            if toks.is_empty() {
                continue;
            }
            let text = join_texts(toks.iter().copied());
            if !text.is_empty() {
                self.fragments[field].push(text);
            }
        }
    }
}

enum RowState {
    AwaitingRowStart,
    InRow(RowBuffer),
}

/// Turn the lines of a statement into records, using the header and bands
/// resolved by the header module.
pub fn reconstruct_rows(lines: &[Line], layout: &TableLayout, schema: &CompiledSchema) -> Vec<Record> {
    Reconstructor::new(layout, schema).run(lines)
}

struct Reconstructor<'a> {
    layout: &'a TableLayout,
    schema: &'a CompiledSchema,
    header_texts: Vec<String>,
    date_field: usize,
    debit: Option<usize>,
    credit: Option<usize>,
    records: Vec<Record>,
    dropped: usize,
}

impl<'a> Reconstructor<'a> {
    fn new(layout: &'a TableLayout, schema: &'a CompiledSchema) -> Self {
        Self {
            layout,
            schema,
            header_texts: Vec::new(),
            date_field: schema
                .field_for(FieldRole::OperationDate)
                .or_else(|| schema.date_fields().first().copied())
                .unwrap_or(0),
            debit: schema.field_for(FieldRole::Debit),
            credit: schema.field_for(FieldRole::Credit),
            records: Vec::new(),
            dropped: 0,
        }
    }

    fn run(mut self, lines: &[Line]) -> Vec<Record> {
        let layout = self.layout;
        let header = &layout.header;
        self.header_texts = lines[header.first_line..=header.last_line.min(lines.len().saturating_sub(1))]
            .iter()
            .map(|l| normalize_label(&l.text()))
            .collect();

        let width = self.schema.fields().len();
        let mut state = RowState::AwaitingRowStart;
        let mut skip_page: Option<usize> = None;
        let mut footers = 0usize;

        for (idx, line) in lines.iter().enumerate().skip(header.last_line + 1) {
            if skip_page == Some(line.page_index) {
                continue;
            }
            let text = line.text();
            let cells = line_cells(line, layout, width);
            let starts_row = self.is_row_start(&cells);

            if !starts_row {
                if self.is_repeated_header(&text, &cells) {
                    debug!("line {idx}: repeated header skipped");
                    continue;
                }
                if self.schema.is_skip_text(&text) || is_numbering_ruler(line) {
                    continue;
                }
            }

            if !starts_row && self.schema.is_footer_text(&text) {
                debug!("line {idx}: footer line closes open row");
                footers += 1;
                if let RowState::InRow(buf) = std::mem::replace(&mut state, RowState::AwaitingRowStart) {
                    self.flush(buf);
                }
                if self.schema.schema().footer_terminates_page {
                    skip_page = Some(line.page_index);
                }
                continue;
            }

            if starts_row {
                if let RowState::InRow(buf) = std::mem::replace(&mut state, RowState::AwaitingRowStart) {
                    self.flush(buf);
                }
                let mut buf = RowBuffer::open(width, idx);
                buf.absorb(&cells);
                state = RowState::InRow(buf);
            } else if let RowState::InRow(buf) = &mut state {
                buf.absorb(&cells);
            }
        }

        if let RowState::InRow(buf) = state {
            self.flush(buf);
        }

        info!(
            "{}: {} records reconstructed, {} dropped, {} footer lines",
            self.schema.name(),
            self.records.len(),
            self.dropped,
            footers
        );
        self.records
    }

    /// Same text as the table header, or enough anchors spread over several
    /// columns. Purpose text naming many anchors stays within one or two bands.
    fn is_repeated_header(&self, text: &str, cells: &[Vec<&Token>]) -> bool {
        let norm = normalize_label(text);
        if !norm.is_empty() && self.header_texts.iter().any(|h| *h == norm) {
            return true;
        }
        if self.schema.anchor_hits(text) < self.schema.schema().min_anchor_hits {
            return false;
        }
        let labelled = cells
            .iter()
            .filter(|c| !c.is_empty() && self.schema.anchor_hits(&join_texts(c.iter().copied())) > 0)
            .count();
        labelled >= MIN_HEADER_COLUMNS
    }

    fn is_row_start(&self, cells: &[Vec<&Token>]) -> bool {
        let cell_text = |field: usize| cells.get(field).map(|t| join_texts(t.iter().copied())).unwrap_or_default();
        let dates_ok = self
            .schema
            .date_fields()
            .iter()
            .all(|&f| self.schema.matches_date(&cell_text(f)));
        if !dates_ok {
            return false;
        }
        match self.schema.id_field() {
            Some(f) => self.schema.matches_id(&cell_text(f)),
            None => true,
        }
    }

    fn flush(&mut self, buf: RowBuffer) {
        let schema = self.schema;
        let fields = schema.fields();
        let mut values: Vec<String> = fields
            .iter()
            .zip(&buf.fragments)
            .map(|(spec, frags)| match spec.kind {
                FieldKind::Text => collapse_whitespace(&frags.join(" ")),
                FieldKind::FreeText => frags
                    .iter()
                    .map(|f| collapse_whitespace(f))
                    .filter(|f| !f.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n"),
                FieldKind::Numeric => frags
                    .iter()
                    .filter(|f| is_amount_fragment(f))
                    .map(|f| f.trim())
                    .collect::<String>(),
            })
            .collect();

        if find_date(&values[self.date_field]).is_none() {
            debug!("row at line {}: no operation date, dropped", buf.first_line);
            self.dropped += 1;
            return;
        }
        if let Some(p) = schema.primary_id() {
            if values[p].trim().is_empty() {
                debug!("row at line {}: no primary id, dropped", buf.first_line);
                self.dropped += 1;
                return;
            }
        }

        if let (Some(d), Some(c)) = (self.debit, self.credit) {
            let (debit, credit) = disambiguate_sides(&values[d], &values[c], schema.side_resolution());
            values[d] = debit;
            values[c] = credit;
        }

        let mut record = Record::new();
        for (spec, value) in fields.iter().zip(values) {
            record.set(&spec.name, value);
        }
        self.records.push(record);
    }
}

/// A ruler line of column numbers such as `1 2 3 4 5 6`.
fn is_numbering_ruler(line: &Line) -> bool {
    line.tokens.len() >= 4
        && line
            .tokens
            .iter()
            .all(|t| t.text.len() <= 2 && t.text.chars().all(|c| c.is_ascii_digit()))
}

/// Resolve a row that carries text in both amount columns.
///
/// `MergeSplit` reads the two fragments as one number split across the
/// column boundary whenever their concatenation parses, and puts it on the
/// side with the longer fragment (debit on a tie). `PreferNonZero` clears a
/// zero printed in the unused column. Both fall back to the longer raw text
/// (credit on a tie).
pub fn disambiguate_sides(debit: &str, credit: &str, mode: SideResolution) -> (String, String) {
    let (d, c) = (debit.trim(), credit.trim());
    if d.is_empty() || c.is_empty() {
        return (d.to_string(), c.to_string());
    }
    let len = |s: &str| s.chars().filter(|ch| !ch.is_whitespace()).count();
    let (dlen, clen) = (len(d), len(c));

    match mode {
        SideResolution::MergeSplit => {
            let merged = format!("{d}{c}");
            if parse_amount(d).is_some() && parse_amount(c).is_some() && parse_amount(&merged).is_some() {
                debug!("debit {d:?} and credit {c:?} merged into one amount");
                return if dlen >= clen {
                    (merged, String::new())
                } else {
                    (String::new(), merged)
                };
            }
        }
        SideResolution::PreferNonZero => match (parse_amount(d), parse_amount(c)) {
            (Some(x), Some(y)) if x == 0.0 && y != 0.0 => return (String::new(), c.to_string()),
            (Some(x), Some(y)) if y == 0.0 && x != 0.0 => return (d.to_string(), String::new()),
            _ => {}
        },
    }

    debug!("both amount columns filled, keeping the longer side");
    if dlen > clen {
        (d.to_string(), String::new())
    } else {
        (String::new(), c.to_string())
    }
}
