use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::models::{Cell, RawRow, RawTable, SourceRow};
use crate::rows::{parse_isracard_date, IsracardRow};

/// Metadata and column-title rows at the top of a Poalim export.
pub const POALIM_HEADER_ROWS: usize = 6;

/// Isracard section markers, matched against the export's own wording.
pub const CARD_SECTION_LABEL: &str = "מסטרקארד";
pub const DOMESTIC_MARKER: &str = "עסקאות בארץ";
pub const FOREIGN_MARKER: &str = "עסקאות בחו˝ל";
pub const TOTAL_CHARGE_MARKER: &str = "סך חיוב בש\"ח";

const DOMESTIC_COLUMNS: [usize; 5] = [0, 1, 4, 7, 6];
/// Source columns of a foreign charge row.
const FOREIGN_FIELDS: [&str; 6] = [
    "purchase_date",
    "date",
    "action",
    "original_amount",
    "currency",
    "amount",
];

fn cell_text(row: &[Cell], idx: usize) -> String {
    row.get(idx).map(|c| c.to_string()).unwrap_or_default()
}

fn has_valid_date(row: &[Cell]) -> bool {
    row.first().and_then(parse_isracard_date).is_some()
}

/// Any card's section header: `<label> - <last four digits>`.
fn card_section_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^.+ - \d{4}").expect("card section pattern is valid"))
}

// ---------------------------------------------------------------------------
// Bank Hapoalim
// ---------------------------------------------------------------------------

/// Every row after the fixed header block is a transaction.
pub fn poalim_rows(table: &RawTable) -> Vec<SourceRow> {
    table
        .iter()
        .enumerate()
        .skip(POALIM_HEADER_ROWS)
        .map(|(idx, row)| SourceRow::new(idx, row.clone()))
        .collect()
}

// ---------------------------------------------------------------------------
// Isracard
// ---------------------------------------------------------------------------

/// Scans an Isracard export for the charges of one card.
#[derive(Debug, Clone, PartialEq)]
pub struct IsracardExtractor {
    card_number: String,
}

impl IsracardExtractor {
    pub fn new(card_number: impl Into<String>) -> Self {
        Self {
            card_number: card_number.into(),
        }
    }

    fn card_marker(&self) -> String {
        format!("{CARD_SECTION_LABEL} - {}", self.card_number)
    }

    /// Domestic charges followed by foreign charges.
    pub fn relevant_rows(&self, table: &RawTable) -> Result<Vec<SourceRow>> {
        let card_rows = self.mastercard_rows(table);
        let mut rows = israel_charges(&card_rows)?;
        let domestic = rows.len();
        rows.extend(foreign_charges(&card_rows)?);
        debug!(
            card = %self.card_number,
            card_rows = card_rows.len(),
            domestic,
            foreign = rows.len() - domestic,
            "extracted isracard charges"
        );
        Ok(rows)
    }

    /// Rows inside the target card's section. Another card's header ends it.
    pub fn mastercard_rows(&self, table: &RawTable) -> Vec<SourceRow> {
        let marker = self.card_marker();
        let mut in_card = false;
        let mut rows = Vec::new();
        for (idx, row) in table.iter().enumerate() {
            let first = cell_text(row, 0);
            if first.contains(&marker) {
                in_card = true;
            } else if card_section_re().is_match(&first) {
                in_card = false;
            } else if in_card {
                rows.push(SourceRow::new(idx, row.clone()));
            }
        }
        rows
    }
}

/// Charges from the domestic section, reshaped to the Isracard row layout.
pub fn israel_charges(card_rows: &[SourceRow]) -> Result<Vec<SourceRow>> {
    let mut in_domestic = false;
    let mut rows = Vec::new();
    for source in card_rows {
        let row = &source.cells;
        if cell_text(row, 0).trim_start().starts_with(DOMESTIC_MARKER) {
            in_domestic = true;
            continue;
        }
        if !in_domestic {
            continue;
        }
        if cell_text(row, 1).trim_start().starts_with(TOTAL_CHARGE_MARKER) {
            in_domestic = false;
            continue;
        }
        if !has_valid_date(row) {
            continue;
        }
        let cells = pick_columns(row, &DOMESTIC_COLUMNS)
            .map_err(|e| e.at_row(source.index, source.describe()))?;
        rows.push(SourceRow::new(source.index, cells));
    }
    Ok(rows)
}

/// Charges from the foreign section, which has no total row and runs until the
/// end of the card or the next domestic section. The purchase date and the
/// original currency amount go into the memo; the posting date becomes the
/// row date.
pub fn foreign_charges(card_rows: &[SourceRow]) -> Result<Vec<SourceRow>> {
    let mut in_foreign = false;
    let mut rows = Vec::new();
    for source in card_rows {
        let row = &source.cells;
        let first = cell_text(row, 0);
        if first.trim_start().starts_with(FOREIGN_MARKER) {
            in_foreign = true;
            continue;
        }
        if first.trim_start().starts_with(DOMESTIC_MARKER) {
            in_foreign = false;
            continue;
        }
        if !in_foreign || !has_valid_date(row) {
            continue;
        }
        if row.len() < FOREIGN_FIELDS.len() {
            let err = ConvertError::MalformedRow {
                expected: FOREIGN_FIELDS.len(),
                found: row.len(),
                missing: FOREIGN_FIELDS[row.len()],
            };
            return Err(err.at_row(source.index, source.describe()));
        }
        let memo = format!(
            "Transaction date: {}. Original amt: {}{}",
            row[0], row[4], row[3]
        );
        let cells = vec![
            row[1].clone(),
            row[2].clone(),
            row[5].clone(),
            Cell::Text(memo),
            Cell::text("N/A"),
        ];
        rows.push(SourceRow::new(source.index, cells));
    }
    Ok(rows)
}

fn pick_columns(row: &[Cell], columns: &[usize; 5]) -> Result<RawRow> {
    columns
        .iter()
        .zip(IsracardRow::FIELDS)
        .map(|(&col, field)| {
            row.get(col).cloned().ok_or(ConvertError::MalformedRow {
                expected: col + 1,
                found: row.len(),
                missing: field,
            })
        })
        .collect()
}
