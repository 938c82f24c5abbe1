use std::path::Path;

use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::models::{Cell, RawTable, Record};

#[cfg(feature = "xlsx")]
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a statement export into a raw table, dispatching on the file extension.
pub fn load_table(file_path: &Path) -> Result<RawTable> {
    let ext = file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let table = match ext.as_str() {
        "csv" => load_csv(file_path)?,
        #[cfg(feature = "xlsx")]
        e if SPREADSHEET_EXTENSIONS.contains(&e) => load_spreadsheet(file_path)?,
        _ => return Err(ConvertError::UnsupportedFileType(file_path.to_path_buf())),
    };
    debug!(rows = table.len(), path = %file_path.display(), "loaded table");
    Ok(table)
}

fn load_csv(file_path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::text).collect());
    }
    Ok(rows)
}

#[cfg(feature = "xlsx")]
fn load_spreadsheet(file_path: &Path) -> Result<RawTable> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| ConvertError::Spreadsheet(format!("Failed to open {}: {e}", file_path.display())))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| ConvertError::Spreadsheet(e.to_string()))?,
        None => return Ok(Vec::new()),
    };

    // calamine trims the range to the used cells. The first used row holds the
    // column titles and is dropped along with any blank rows above it; leading
    // blank columns are padded back so cell positions match the sheet.
    let start_col = range.start().map_or(0, |(_, col)| col);
    let mut grid = RawTable::new();
    for row in range.rows().skip(1) {
        let mut cells: Vec<Cell> = (0..start_col).map(|_| Cell::Missing).collect();
        cells.extend(row.iter().map(|data| match data {
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(_) | Data::Empty => Cell::Missing,
        }));
        grid.push(cells);
    }
    Ok(grid)
}

#[cfg(feature = "xlsx")]
fn excel_serial_to_date(serial: f64) -> Cell {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    chrono::NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|base| base.checked_add_signed(chrono::Duration::days(serial as i64)))
        .map(Cell::Date)
        .unwrap_or(Cell::Number(serial))
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write `records` as CSV with `columns` as the header. Keys a record lacks
/// are written as empty cells.
pub fn write_csv(file_path: &Path, columns: &[&str], records: &[Record]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(file_path)?;
    wtr.write_record(columns)?;
    for record in records {
        wtr.write_record(
            columns
                .iter()
                .map(|col| record.get(*col).map(String::as_str).unwrap_or("")),
        )?;
    }
    wtr.flush()?;
    debug!(rows = records.len(), path = %file_path.display(), "wrote csv");
    Ok(())
}
