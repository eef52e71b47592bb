//! Listing markup parser
//!
//! This module turns a listing page into candidate records in two steps:
//! - `extract_rows` flattens the table markup into `RowCell`s
//! - `parse_row` maps cell positions to record fields
//!
//! Only `parse_row` knows the column layout:
//!
//! | Cell | Field |
//! |------|-------|
//! | 0 | row number (ignored) |
//! | 1 | name (link text preferred) |
//! | 2 | birth year |
//! | 3 | address |
//! | 4 | parents |
//! | 5 | crime |
//! | 6 | decision number |
//! | 7 | issuing unit |

use crate::config::CrawlerConfig;
use crate::record::CandidateRecord;
use crate::SyncError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Whitespace regex is hardcoded and valid"));

static FOUR_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]{4}").expect("Year regex is hardcoded and valid"));

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table tbody tr").expect("Row selector is hardcoded and valid"));

static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Cell selector is hardcoded and valid"));

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("Link selector is hardcoded and valid"));

/// Text content of one table cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowCell {
    /// All text inside the cell
    pub text: String,

    /// Concatenated text of the links inside the cell, if there are any
    pub link_text: Option<String>,
}

impl RowCell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link_text: None,
        }
    }

    pub fn with_link(text: impl Into<String>, link_text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link_text: Some(link_text.into()),
        }
    }

    fn from_element(cell: ElementRef<'_>) -> Self {
        let mut links = cell.select(&LINK_SELECTOR).peekable();
        let link_text = links
            .peek()
            .is_some()
            .then(|| links.flat_map(|a| a.text()).collect::<String>());

        Self {
            text: cell.text().collect(),
            link_text,
        }
    }
}

/// Row parsing knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Rows with fewer cells are skipped
    pub min_cells: usize,

    /// Upper-case names before returning them
    pub uppercase_names: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            min_cells: 7,
            uppercase_names: true,
        }
    }
}

impl From<&CrawlerConfig> for ParseOptions {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            min_cells: config.min_cells,
            uppercase_names: config.uppercase_names,
        }
    }
}

/// Collapses whitespace runs to single spaces and trims the ends
pub fn normalize_text(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Takes the first four consecutive ASCII digits as the birth year
///
/// A longer digit run yields its leading four digits.
pub fn extract_birth_year(text: &str) -> Option<i32> {
    FOUR_DIGITS
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// Parses one table row into a candidate record
///
/// Returns `None` for rows that are too short, rows without a name, and
/// rows that fail extraction; the last case is logged as a warning.
pub fn parse_row(cells: &[RowCell], options: &ParseOptions) -> Option<CandidateRecord> {
    if cells.len() < options.min_cells {
        return None;
    }

    match extract_candidate(cells, options) {
        Ok(candidate) => candidate,
        Err(e) => {
            tracing::warn!("Skipping row due to parse error: {}", e);
            None
        }
    }
}

fn extract_candidate(
    cells: &[RowCell],
    options: &ParseOptions,
) -> Result<Option<CandidateRecord>, SyncError> {
    let required = |idx: usize| {
        cells
            .get(idx)
            .ok_or_else(|| SyncError::RowParse(format!("missing cell {}", idx)))
    };
    let optional = |idx: usize| {
        cells
            .get(idx)
            .map(|cell| normalize_text(&cell.text))
            .filter(|text| !text.is_empty())
    };

    let name_cell = required(1)?;
    let name = name_cell
        .link_text
        .as_deref()
        .map(normalize_text)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| normalize_text(&name_cell.text));

    if name.is_empty() {
        return Ok(None);
    }

    Ok(Some(CandidateRecord {
        name: if options.uppercase_names {
            name.to_uppercase()
        } else {
            name
        },
        birth_year: extract_birth_year(&required(2)?.text),
        address: optional(3),
        parents: optional(4),
        crime: normalize_text(&required(5)?.text),
        decision_number: optional(6),
        issuing_unit: optional(7),
    }))
}

/// Flattens every body row of every table into cells, minus the header row
///
/// The first matched row is the header and is always dropped.
pub fn extract_rows(html: &str) -> Vec<Vec<RowCell>> {
    let document = Html::parse_document(html);

    document
        .select(&ROW_SELECTOR)
        .skip(1)
        .map(|row| row.select(&CELL_SELECTOR).map(RowCell::from_element).collect())
        .collect()
}

/// Parses a whole listing page into candidates, in document order
pub fn parse_listing(html: &str, options: &ParseOptions) -> Vec<CandidateRecord> {
    extract_rows(html)
        .iter()
        .filter_map(|cells| parse_row(cells, options))
        .collect()
}
