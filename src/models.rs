use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

/// Column order of the ledger CSV.
pub const LEDGER_COLUMNS: [&str; 4] = ["Date", "Payee", "Memo", "Amount"];

/// One untyped cell as it came out of the loader.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    /// Spreadsheet cells formatted as dates.
    Date(NaiveDate),
    Missing,
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Missing cells and whitespace-only text count as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(n) => n.is_nan(),
            Self::Date(_) => false,
            Self::Missing => true,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{}", d.format("%d/%m/%Y")),
            Self::Missing => Ok(()),
        }
    }
}

pub type RawRow = Vec<Cell>;
pub type RawTable = Vec<RawRow>;

/// A relevant row plus its zero-based position in the loaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    pub index: usize,
    pub cells: RawRow,
}

impl SourceRow {
    pub fn new(index: usize, cells: RawRow) -> Self {
        Self { index, cells }
    }

    /// Raw content rendered for error messages.
    pub fn describe(&self) -> String {
        let cells: Vec<String> = self.cells.iter().map(|c| c.to_string()).collect();
        format!("{cells:?}")
    }
}

/// A mapping-typed output record keyed by column name.
pub type Record = BTreeMap<String, String>;

/// One normalized transaction of the output ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    pub payee: String,
    pub memo: String,
    /// Negative is money out.
    pub amount: f64,
}

impl LedgerEntry {
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("Date".to_string(), self.date.clone());
        record.insert("Payee".to_string(), self.payee.clone());
        record.insert("Memo".to_string(), self.memo.clone());
        record.insert("Amount".to_string(), self.amount.to_string());
        record
    }
}
