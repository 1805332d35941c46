//! Statement layout schemas.
//!
//! A `Schema` is plain data: the table's canonical columns, the words that
//! identify its header, how a new row is recognised and which lines are
//! footers. Every bank is one `Schema` value; nothing in the pipeline branches
//! on the bank itself. `Schema::compile` validates it and prepares the
//! normalized keyword lists and regexes the pipeline uses.

use kredo_core::{ParseError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::header::normalize_label;

/// What a column means for the typed `Transaction` projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    OperationDate,
    ValueDate,
    DocumentNo,
    Debit,
    Credit,
    CounterpartyName,
    CounterpartyId,
    CounterpartyAccount,
    Purpose,
    PaymentCode,
    #[default]
    Other,
}

/// How continuation lines merge into a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Fragments are space-joined.
    #[default]
    Text,
    /// One line per fragment, newline-joined.
    FreeText,
    /// Amount fragments, concatenated without separator at flush.
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Canonical column name, used as the output column header.
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub role: FieldRole,
    #[serde(default)]
    pub kind: FieldKind,
    /// Static `[left, right)` x-band. When every field has one the header is
    /// only used to locate the table, not to infer columns.
    #[serde(default)]
    pub band: Option<[f64; 2]>,
}

impl FieldSpec {
    pub fn new(name: &str, role: FieldRole, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            role,
            kind,
            band: None,
        }
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn band(mut self, left: f64, right: f64) -> Self {
        self.band = Some([left, right]);
        self
    }
}

/// How a row that printed text in both amount columns is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideResolution {
    /// Treat the two fragments as one amount split across the column
    /// boundary whenever their concatenation parses.
    MergeSplit,
    /// Clear a zero printed in the unused column.
    #[default]
    PreferNonZero,
}

/// Row-start predicate: every `date_fields` cell must match `date_pattern`,
/// and when `id_field` is set its cell must match `id_pattern`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowStart {
    pub date_fields: Vec<String>,
    #[serde(default = "default_date_pattern")]
    pub date_pattern: String,
    #[serde(default)]
    pub id_field: Option<String>,
    #[serde(default = "default_id_pattern")]
    pub id_pattern: String,
}

fn default_date_pattern() -> String {
    r"^\d{2}\.\d{2}\.\d{4}".to_string()
}

fn default_id_pattern() -> String {
    r"^[0-9A-Za-zА-Яа-яЁё][0-9A-Za-zА-Яа-яЁё\-_/]{0,30}$".to_string()
}

pub fn default_footer_keywords() -> Vec<String> {
    ["итого", "всего", "обороты", "исходящий остаток"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_min_anchor_hits() -> usize {
    3
}

fn default_loose_anchor_hits() -> usize {
    2
}

fn default_header_scan_lines() -> usize {
    80
}

fn default_line_tolerance() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
    pub header_anchors: Vec<String>,
    #[serde(default = "default_min_anchor_hits")]
    pub min_anchor_hits: usize,
    /// Threshold of the permissive second pass.
    #[serde(default = "default_loose_anchor_hits")]
    pub loose_anchor_hits: usize,
    #[serde(default = "default_header_scan_lines")]
    pub header_scan_lines: usize,
    pub row_start: RowStart,
    /// A record without this cell is dropped at flush.
    #[serde(default)]
    pub primary_id_field: Option<String>,
    /// Whole words or phrases, matched case-insensitively.
    #[serde(default = "default_footer_keywords")]
    pub footer_keywords: Vec<String>,
    /// Case-insensitive regexes for footers a fixed phrase cannot express.
    #[serde(default)]
    pub footer_patterns: Vec<String>,
    /// Ignore the remainder of the page once a footer line is seen.
    #[serde(default)]
    pub footer_terminates_page: bool,
    /// Page furniture (running titles, account banners) skipped without
    /// closing the open row.
    #[serde(default)]
    pub skip_phrases: Vec<String>,
    #[serde(default = "default_line_tolerance")]
    pub line_tolerance: f64,
    /// Column boundaries as fractions of page width, used when the header
    /// has too few distinct tokens to infer bands. Empty means equal split.
    #[serde(default)]
    pub default_fractions: Vec<f64>,
    #[serde(default)]
    pub side_resolution: SideResolution,
}

impl Schema {
    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn compile(self) -> Result<CompiledSchema> {
        CompiledSchema::new(self)
    }
}

/// A validated schema with matching helpers prepared.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    schema: Schema,
    anchors: Vec<String>,
    footer_keywords: Vec<String>,
    footer_res: Vec<Regex>,
    skip_phrases: Vec<String>,
    date_re: Regex,
    id_re: Regex,
    date_fields: Vec<usize>,
    id_field: Option<usize>,
    primary_id: Option<usize>,
}

impl CompiledSchema {
    fn new(schema: Schema) -> Result<Self> {
        if schema.fields.is_empty() {
            return Err(ParseError::InvalidSchema(format!("{}: no fields", schema.name)));
        }
        if schema.header_anchors.is_empty() {
            return Err(ParseError::InvalidSchema(format!("{}: no header anchors", schema.name)));
        }
        if schema.loose_anchor_hits > schema.min_anchor_hits {
            return Err(ParseError::InvalidSchema(format!(
                "{}: loose_anchor_hits {} exceeds min_anchor_hits {}",
                schema.name, schema.loose_anchor_hits, schema.min_anchor_hits
            )));
        }

        let lookup = |name: &str| {
            schema.field_index(name).ok_or_else(|| {
                ParseError::InvalidSchema(format!("{}: unknown field '{name}'", schema.name))
            })
        };

        if schema.row_start.date_fields.is_empty() {
            return Err(ParseError::InvalidSchema(format!("{}: row_start needs a date field", schema.name)));
        }
        let date_fields = schema
            .row_start
            .date_fields
            .iter()
            .map(|n| lookup(n))
            .collect::<Result<Vec<_>>>()?;
        let id_field = schema.row_start.id_field.as_deref().map(lookup).transpose()?;
        let primary_id = schema.primary_id_field.as_deref().map(lookup).transpose()?;

        for role in [FieldRole::Debit, FieldRole::Credit] {
            if !schema.fields.iter().any(|f| f.role == role) {
                return Err(ParseError::InvalidSchema(format!("{}: no {role:?} column", schema.name)));
            }
        }

        let date_re = Regex::new(&schema.row_start.date_pattern)
            .map_err(|e| ParseError::InvalidSchema(format!("{}: date_pattern: {e}", schema.name)))?;
        let id_re = Regex::new(&schema.row_start.id_pattern)
            .map_err(|e| ParseError::InvalidSchema(format!("{}: id_pattern: {e}", schema.name)))?;

        let anchors = schema
            .header_anchors
            .iter()
            .map(|a| normalize_label(a))
            .filter(|a| !a.is_empty())
            .collect();
        let footer_keywords = schema.footer_keywords.iter().map(|k| k.to_lowercase()).collect();
        let footer_res = schema
            .footer_patterns
            .iter()
            .map(|p| {
                Regex::new(&format!("(?i){p}"))
                    .map_err(|e| ParseError::InvalidSchema(format!("{}: footer pattern '{p}': {e}", schema.name)))
            })
            .collect::<Result<Vec<_>>>()?;
        let skip_phrases = schema.skip_phrases.iter().map(|k| k.to_lowercase()).collect();

        Ok(Self {
            schema,
            anchors,
            footer_keywords,
            footer_res,
            skip_phrases,
            date_re,
            id_re,
            date_fields,
            id_field,
            primary_id,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.schema.fields
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// First field carrying `role`.
    pub fn field_for(&self, role: FieldRole) -> Option<usize> {
        self.schema.fields.iter().position(|f| f.role == role)
    }

    pub fn date_fields(&self) -> &[usize] {
        &self.date_fields
    }

    pub fn id_field(&self) -> Option<usize> {
        self.id_field
    }

    pub fn primary_id(&self) -> Option<usize> {
        self.primary_id
    }

    pub fn matches_date(&self, cell: &str) -> bool {
        self.date_re.is_match(cell)
    }

    pub fn matches_id(&self, cell: &str) -> bool {
        self.id_re.is_match(cell)
    }

    /// Number of distinct header anchors present in `text`.
    pub fn anchor_hits(&self, text: &str) -> usize {
        let norm = normalize_label(text);
        self.anchors.iter().filter(|a| norm.contains(a.as_str())).count()
    }

    pub fn is_footer_text(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.footer_keywords.iter().any(|k| contains_word(&lower, k))
            || self.footer_res.iter().any(|re| re.is_match(text))
    }

    pub fn is_skip_text(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.skip_phrases.iter().any(|p| lower.contains(p.as_str()))
    }

    /// Footer keywords that open a turnover summary line.
    pub fn footer_keywords(&self) -> &[String] {
        &self.footer_keywords
    }

    pub fn side_resolution(&self) -> SideResolution {
        self.schema.side_resolution
    }

    pub fn has_static_bands(&self) -> bool {
        self.schema.fields.iter().all(|f| f.band.is_some())
    }
}

/// `needle` occurs in `haystack` as a whole word or phrase. An edge of the
/// needle that is not alphanumeric (`бик:`) needs no boundary on that side.
fn contains_word(haystack: &str, needle: &str) -> bool {
    let bounded_left = needle.chars().next().is_some_and(char::is_alphanumeric);
    let bounded_right = needle.chars().next_back().is_some_and(char::is_alphanumeric);
    haystack.match_indices(needle).any(|(pos, m)| {
        let before = haystack[..pos].chars().next_back();
        let after = haystack[pos + m.len()..].chars().next();
        (!bounded_left || before.is_none_or(|c| !c.is_alphanumeric()))
            && (!bounded_right || after.is_none_or(|c| !c.is_alphanumeric()))
    })
}
