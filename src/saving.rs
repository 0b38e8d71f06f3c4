use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use std::fs::create_dir_all;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::entry::{COLUMNS, Entry};
use crate::error::{Error, Result};

/// Render the keystroke table as an XLSX workbook held in memory.
///
/// Row 0 carries the column headers; every entry follows in table order.
/// List columns are stored as JSON text so they survive a reload unchanged.
///
/// # Arguments
/// * `entries` - Rows to write, in order
///
/// # Returns
/// * `Result<Vec<u8>>` - The workbook bytes or an error
pub fn to_xlsx(entries: &[Entry]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in COLUMNS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }

    for (i, entry) in entries.iter().enumerate() {
        write_entry(worksheet, (i + 1) as u32, entry)?;
    }

    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}

/// Most characters a single xlsx text cell may hold.
pub const MAX_CELL_CHARS: usize = 32_767;

fn write_entry(worksheet: &mut Worksheet, row: u32, entry: &Entry) -> Result<()> {
    worksheet.write_number(row, 0, f64::from(entry.id))?;
    for (col, text) in text_cells(entry)? {
        worksheet.write_string(row, col, &text)?;
    }
    worksheet.write_number(row, 7, entry.total_hold_time)?;
    worksheet.write_number(row, 8, entry.total_flight_time)?;
    worksheet.write_number(row, 9, entry.total_press_release_timings as f64)?;
    worksheet.write_number(row, 10, entry.total_key_combinations as f64)?;
    Ok(())
}

// Text columns of a row, each within the cell limit
fn text_cells(entry: &Entry) -> Result<[(u16, String); 6]> {
    let cells = [
        (1, entry.username.clone()),
        (2, entry.email.clone()),
        (3, list_cell(&entry.hold_times)?),
        (4, list_cell(&entry.flight_times)?),
        (5, list_cell(&entry.press_release_timings)?),
        (6, list_cell(&entry.key_combinations)?),
    ];

    for (col, text) in &cells {
        let length = text.chars().count();
        if length > MAX_CELL_CHARS {
            return Err(Error::CellTooLong {
                column: COLUMNS[usize::from(*col)],
                length,
            });
        }
    }
    Ok(cells)
}

/// Check that `entry` fits in a worksheet row.
///
/// # Errors
/// * `Error::CellTooLong` if any text or list cell is over [`MAX_CELL_CHARS`]
pub fn check_entry(entry: &Entry) -> Result<()> {
    text_cells(entry).map(|_| ())
}

fn list_cell<T: Serialize>(values: &[T]) -> Result<String> {
    serde_json::to_string(values).map_err(|e| Error::internal(format!("list encoding: {e}")))
}

/// Overwrite `path` with the full keystroke table.
///
/// The workbook is written to a temporary file next to `path` and renamed
/// into place, so readers only ever see a complete file.
pub fn save_entries(entries: &[Entry], path: &Path) -> Result<()> {
    let buffer = to_xlsx(entries)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(&buffer)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| Error::Io(e.error))?;

    debug!(rows = entries.len(), bytes = buffer.len(), path = %path.display(), "wrote spreadsheet");
    Ok(())
}
