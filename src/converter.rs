use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConvertError, Result};
use crate::extractor::{poalim_rows, IsracardExtractor};
use crate::models::{LedgerEntry, RawTable, SourceRow, LEDGER_COLUMNS};
use crate::rows::{IsracardRow, PoalimRow, StatementRow};
use crate::table::{load_table, write_csv};

// ---------------------------------------------------------------------------
// Source formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceFormat {
    Poalim,
    Isracard,
}

impl SourceFormat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Poalim => "poalim",
            Self::Isracard => "isracard",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Poalim => "Bank Hapoalim checking account",
            Self::Isracard => "Isracard credit card",
        }
    }

    pub fn needs_card_number(&self) -> bool {
        matches!(self, Self::Isracard)
    }
}

pub const ALL_FORMATS: &[SourceFormat] = &[SourceFormat::Poalim, SourceFormat::Isracard];

pub fn get_by_key(key: &str) -> Option<SourceFormat> {
    ALL_FORMATS.iter().find(|f| f.key() == key).copied()
}

/// Per-run options gathered from the command line and settings. Each format
/// picks out what it needs.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub card_number: Option<String>,
}

/// A format together with its typed construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ConverterConfig {
    Poalim,
    Isracard { card_number: String },
}

impl ConverterConfig {
    pub fn new(format: SourceFormat, options: &ConvertOptions) -> Self {
        match format {
            SourceFormat::Poalim => Self::Poalim,
            SourceFormat::Isracard => Self::Isracard {
                card_number: options.card_number.clone().unwrap_or_default(),
            },
        }
    }

    pub fn from_key(key: &str, options: &ConvertOptions) -> Result<Self> {
        let format = get_by_key(key).ok_or_else(|| ConvertError::UnknownFormat(key.to_string()))?;
        Ok(Self::new(format, options))
    }

    pub fn format(&self) -> SourceFormat {
        match self {
            Self::Poalim => SourceFormat::Poalim,
            Self::Isracard { .. } => SourceFormat::Isracard,
        }
    }
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ConversionReport {
    pub format: SourceFormat,
    pub entries: usize,
    pub output: PathBuf,
}

pub struct Converter {
    config: ConverterConfig,
    rows: RawTable,
}

impl Converter {
    pub fn new(config: ConverterConfig, rows: RawTable) -> Self {
        Self { config, rows }
    }

    pub fn from_file(config: ConverterConfig, file_path: &Path) -> Result<Self> {
        Ok(Self::new(config, load_table(file_path)?))
    }

    fn relevant_rows(&self) -> Result<Vec<SourceRow>> {
        match &self.config {
            ConverterConfig::Poalim => Ok(poalim_rows(&self.rows)),
            ConverterConfig::Isracard { card_number } => {
                IsracardExtractor::new(card_number.as_str()).relevant_rows(&self.rows)
            }
        }
    }

    /// Relevant rows bound to the format's row model, in output order.
    pub fn rows_to_convert(&self) -> Result<Vec<(SourceRow, StatementRow)>> {
        self.relevant_rows()?
            .into_iter()
            .map(|source| {
                let row = match self.config {
                    ConverterConfig::Poalim => PoalimRow::from_cells(&source.cells).map(StatementRow::Poalim),
                    ConverterConfig::Isracard { .. } => {
                        IsracardRow::from_cells(&source.cells).map(StatementRow::Isracard)
                    }
                };
                match row {
                    Ok(row) => Ok((source, row)),
                    Err(e) => Err(e.at_row(source.index, source.describe())),
                }
            })
            .collect()
    }

    pub fn ledger_entries(&self) -> Result<Vec<LedgerEntry>> {
        self.rows_to_convert()?
            .iter()
            .map(|(source, row)| {
                row.serialize()
                    .map_err(|e| e.at_row(source.index, source.describe()))
            })
            .collect()
    }

    pub fn convert(&self, out_path: &Path) -> Result<ConversionReport> {
        let entries = self.ledger_entries()?;
        debug!(format = self.config.format().key(), entries = entries.len(), "converted rows");
        let records: Vec<_> = entries.iter().map(LedgerEntry::to_record).collect();
        write_csv(out_path, &LEDGER_COLUMNS, &records)?;
        Ok(ConversionReport {
            format: self.config.format(),
            entries: entries.len(),
            output: out_path.to_path_buf(),
        })
    }
}

/// Resolve the format, load `in_path` and write the ledger to `out_path`.
/// An unknown format fails before any file is touched.
pub fn convert_file(
    in_path: &Path,
    out_path: &Path,
    source: &str,
    options: &ConvertOptions,
) -> Result<ConversionReport> {
    let config = ConverterConfig::from_key(source, options)?;
    let converter = Converter::from_file(config, in_path)?;
    let report = converter.convert(out_path)?;
    info!(
        input = %in_path.display(),
        output = %out_path.display(),
        entries = report.entries,
        "conversion finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn table(rows: &[&[&str]]) -> RawTable {
        rows.iter()
            .map(|r| r.iter().map(|c| Cell::text(*c)).collect())
            .collect()
    }

    fn poalim_table() -> RawTable {
        let mut rows: Vec<&[&str]> = vec![&["header"][..]; 6];
        rows.push(&["02.07.2023", "מסטרקרד", "חיוב כרטיס", "4321", "454", "", "9,546", "02.07.2023", "", ""]);
        rows.push(&["03.07.2023", "משכורת", "salary", "", "", "454", "10,000", "03.07.2023", "", ""]);
        rows.push(&["04.07.2023", "העברה", "rent", "", "3,000", "", "7,000", "04.07.2023", "Landlord", ""]);
        table(&rows)
    }

    fn isracard_table() -> RawTable {
        table(&[
            &["מסטרקארד - 4321", "", "", ""],
            &["עסקאות בארץ", "", "", ""],
            &["תאריך רכישה", "", "", ""],
            &["02/07/2023", "shuk hair", "454", "NIS", "454", "NIS", "123456", "תשלום 2 מתוך 3"],
            &["03/07/2023", "PAYBOX", "454", "NIS", "-45", "NIS", "654321", ""],
            &["03/07/2023", "booze", "454", "NIS", "5000", "NIS", "111111", ""],
            &["05/07/2023", "סך חיוב בש\"ח:", "05/07/2023", "", "15000", "NIS", "", ""],
            &["עסקאות בחו˝ל", "", "", ""],
            &["03/07/2023", "04/07/2023", "AMAZON", "123", "USD", "4623", "NIS", ""],
        ])
    }

    #[test]
    fn test_get_by_key() {
        assert_eq!(get_by_key("poalim"), Some(SourceFormat::Poalim));
        assert_eq!(get_by_key("isracard"), Some(SourceFormat::Isracard));
        assert_eq!(get_by_key("leumi"), None);
    }

    #[test]
    fn test_config_forwards_card_number() {
        let options = ConvertOptions {
            card_number: Some("4321".to_string()),
        };
        assert_eq!(ConverterConfig::from_key("poalim", &options).unwrap(), ConverterConfig::Poalim);
        assert_eq!(
            ConverterConfig::from_key("isracard", &options).unwrap(),
            ConverterConfig::Isracard {
                card_number: "4321".to_string()
            }
        );
        assert_eq!(
            ConverterConfig::from_key("isracard", &ConvertOptions::default()).unwrap(),
            ConverterConfig::Isracard {
                card_number: String::new()
            }
        );
    }

    #[test]
    fn test_unknown_format() {
        let err = ConverterConfig::from_key("leumi", &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::UnknownFormat(ref k) if k == "leumi"));
    }

    #[test]
    fn test_poalim_entries() {
        let entries = Converter::new(ConverterConfig::Poalim, poalim_table())
            .ledger_entries()
            .unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].date, "2023-07-02");
        assert_eq!(entries[0].payee, "מסטרקרד 4321");
        assert_eq!(entries[0].memo, "חיוב כרטיס");
        assert_eq!(entries[0].amount, -454.0);
        assert_eq!(entries[1].payee, "משכורת");
        assert_eq!(entries[1].amount, 454.0);
        assert_eq!(entries[2].payee, "Landlord");
        assert_eq!(entries[2].amount, -3000.0);
    }

    #[test]
    fn test_poalim_short_row_aborts() {
        let mut rows = poalim_table();
        rows.push(vec![Cell::text("05.07.2023"), Cell::text("x")]);
        let err = Converter::new(ConverterConfig::Poalim, rows)
            .ledger_entries()
            .unwrap_err();
        match err {
            ConvertError::AtRow { index, source, .. } => {
                assert_eq!(index, 9);
                assert!(matches!(*source, ConvertError::MalformedRow { found: 2, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_isracard_entries() {
        let config = ConverterConfig::Isracard {
            card_number: "4321".to_string(),
        };
        let entries = Converter::new(config, isracard_table()).ledger_entries().unwrap();
        assert_eq!(entries.len(), 4);

        assert_eq!(entries[0].date, "2023-08-02");
        assert_eq!(entries[0].payee, "shuk hair");
        assert_eq!(entries[0].amount, -454.0);
        assert_eq!(entries[1].payee, "PAYBOX 654321");
        assert_eq!(entries[1].amount, 45.0);
        assert_eq!(entries[2].amount, -5000.0);

        let amazon = &entries[3];
        assert_eq!(amazon.payee, "AMAZON");
        assert!(amazon.memo.starts_with("Transaction date: 03/07/2023. Original amt: USD123"));
        assert_eq!(amazon.amount, -4623.0);
        assert_eq!(amazon.date, "2023-07-04");
    }

    #[test]
    fn test_isracard_bad_posting_date_is_hard_error() {
        let mut rows = isracard_table();
        rows[8][1] = Cell::text("not a date");
        let config = ConverterConfig::Isracard {
            card_number: "4321".to_string(),
        };
        let err = Converter::new(config, rows).ledger_entries().unwrap_err();
        match err {
            ConvertError::AtRow { index, source, .. } => {
                assert_eq!(index, 8);
                assert!(matches!(*source, ConvertError::DateParse(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_convert_writes_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("ledger.csv");
        let report = Converter::new(ConverterConfig::Poalim, poalim_table())
            .convert(&out)
            .unwrap();
        assert_eq!(report.entries, 3);
        assert_eq!(report.format, SourceFormat::Poalim);
        let content = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Date,Payee,Memo,Amount");
        assert_eq!(lines[1], "2023-07-02,מסטרקרד 4321,חיוב כרטיס,-454");
        assert_eq!(lines[3], "2023-07-04,Landlord,rent,-3000");
    }

    #[test]
    fn test_convert_empty_poalim_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("ledger.csv");
        let rows = table(&[&["only"], &["metadata"]]);
        let report = Converter::new(ConverterConfig::Poalim, rows).convert(&out).unwrap();
        assert_eq!(report.entries, 0);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "Date,Payee,Memo,Amount\n");
    }

    #[test]
    fn test_convert_file_unknown_format_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("ledger.csv");
        let err = convert_file(
            &dir.path().join("missing.csv"),
            &out,
            "leumi",
            &ConvertOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::UnknownFormat(_)));
        assert!(!out.exists());
    }

    #[test]
    fn test_convert_file_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("isracard.csv");
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(&input).unwrap();
        for row in isracard_table() {
            wtr.write_record(row.iter().map(|c| c.to_string())).unwrap();
        }
        wtr.flush().unwrap();
        let out = dir.path().join("ledger.csv");
        let options = ConvertOptions {
            card_number: Some("4321".to_string()),
        };
        let report = convert_file(&input, &out, "isracard", &options).unwrap();
        assert_eq!(report.entries, 4);
        let written = std::fs::read_to_string(&out).unwrap();
        assert!(written.contains("PAYBOX 654321"));
        assert!(written.contains("2023-07-04,AMAZON,"));
    }
}
