use calamine::{Data, Reader, Xlsx, open_workbook};
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;
use tracing::{debug, warn};

use crate::entry::{COLUMNS, Entry};
use crate::error::{Error, Result};

/// Load the keystroke table from an Excel file
///
/// Reads the first worksheet. The first row must hold the column headers;
/// columns are matched by name so their order in the file does not matter.
/// Only `ID` and `Email` are required. Other columns may be absent, and a
/// list cell that cannot be read loads as an empty list with a warning.
/// Missing totals are recomputed from the lists. Fully blank rows are
/// skipped.
///
/// # Arguments
/// * `path` - Path to the `.xlsx` file to load
///
/// # Returns
/// * `Result<Vec<Entry>>` - Rows in sheet order or an error
///
/// # Examples
/// ```no_run
/// use keystroke_form::loader::from_excel;
///
/// match from_excel("keystrokes.xlsx".as_ref()) {
///     Ok(entries) => println!("Loaded {} rows", entries.len()),
///     Err(e) => eprintln!("Error loading Excel: {}", e),
/// }
/// ```
pub fn from_excel(path: &Path) -> Result<Vec<Entry>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::malformed_sheet(path, "no sheets found"))??;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| Error::malformed_sheet(path, "missing header row"))?;
    let columns = column_positions(header).map_err(|message| Error::malformed_sheet(path, message))?;

    let mut entries = Vec::new();
    for (i, row) in rows.enumerate() {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        // Sheet rows are 1-based and the header takes row 1
        let sheet_row = i + 2;
        let entry = parse_row(row, &columns, sheet_row)
            .map_err(|message| Error::malformed_sheet(path, format!("row {sheet_row}: {message}")))?;
        entries.push(entry);
    }

    debug!(rows = entries.len(), path = %path.display(), "read spreadsheet");
    Ok(entries)
}

static EMPTY_CELL: Data = Data::Empty;

const ID: usize = 0;
const EMAIL: usize = 2;

// Position of each of COLUMNS within the header row, if present
fn column_positions(
    header: &[Data],
) -> std::result::Result<[Option<usize>; COLUMNS.len()], String> {
    let mut positions = [None; COLUMNS.len()];
    for (slot, name) in positions.iter_mut().zip(COLUMNS) {
        *slot = header
            .iter()
            .position(|cell| cell_text(cell).trim() == name);
    }
    for required in [ID, EMAIL] {
        if positions[required].is_none() {
            return Err(format!("missing column '{}'", COLUMNS[required]));
        }
    }
    Ok(positions)
}

fn parse_row(
    row: &[Data],
    columns: &[Option<usize>; COLUMNS.len()],
    sheet_row: usize,
) -> std::result::Result<Entry, String> {
    let cell = |col: usize| {
        columns[col]
            .and_then(|pos| row.get(pos))
            .unwrap_or(&EMPTY_CELL)
    };
    let hold_times: Vec<f64> = lenient_list(cell(3), COLUMNS[3], sheet_row);
    let flight_times: Vec<f64> = lenient_list(cell(4), COLUMNS[4], sheet_row);
    let press_release_timings: Vec<(f64, f64)> = lenient_list(cell(5), COLUMNS[5], sheet_row);
    let key_combinations: Vec<(String, String)> = lenient_list(cell(6), COLUMNS[6], sheet_row);

    Ok(Entry {
        id: cell_integer(cell(ID)).ok_or("invalid ID")?,
        username: cell_text(cell(1)),
        email: cell_text(cell(EMAIL)),
        total_hold_time: cell_number(cell(7)).unwrap_or_else(|| hold_times.iter().sum()),
        total_flight_time: cell_number(cell(8)).unwrap_or_else(|| flight_times.iter().sum()),
        total_press_release_timings: cell_integer(cell(9))
            .unwrap_or(press_release_timings.len()),
        total_key_combinations: cell_integer(cell(10)).unwrap_or(key_combinations.len()),
        hold_times,
        flight_times,
        press_release_timings,
        key_combinations,
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        Data::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// Whole, non-negative numbers only
fn cell_integer<T: TryFrom<u64>>(cell: &Data) -> Option<T> {
    let value = cell_number(cell)?;
    if value < 0.0 || value.fract() != 0.0 || value > u64::MAX as f64 {
        return None;
    }
    T::try_from(value as u64).ok()
}

fn cell_list<T: DeserializeOwned>(cell: &Data) -> Option<Vec<T>> {
    match cell {
        Data::Empty => Some(Vec::new()),
        Data::String(s) if s.trim().is_empty() => Some(Vec::new()),
        Data::String(s) => serde_json::from_str(s)
            .ok()
            .or_else(|| serde_json::from_value(literal_value(s)?).ok()),
        _ => None,
    }
}

fn lenient_list<T: DeserializeOwned>(cell: &Data, column: &str, sheet_row: usize) -> Vec<T> {
    cell_list(cell).unwrap_or_else(|| {
        warn!(row = sheet_row, column, "unreadable list cell, loading it as empty");
        Vec::new()
    })
}

// Reads list cells written as Python literals, such as `[(0, 100)]` or
// `[('A', 'A')]`, into the equivalent JSON value.
fn literal_value(text: &str) -> Option<Value> {
    let mut chars = text.trim().chars().peekable();
    let value = literal(&mut chars)?;
    skip_space(&mut chars);
    chars.peek().is_none().then_some(value)
}

fn literal(chars: &mut Peekable<Chars<'_>>) -> Option<Value> {
    skip_space(chars);
    match *chars.peek()? {
        '[' | '(' => {
            let close = if chars.next()? == '[' { ']' } else { ')' };
            let mut items = Vec::new();
            loop {
                skip_space(chars);
                if chars.next_if_eq(&close).is_some() {
                    return Some(Value::Array(items));
                }
                items.push(literal(chars)?);
                skip_space(chars);
                if chars.next_if_eq(&',').is_none() {
                    return chars.next_if_eq(&close).map(|_| Value::Array(items));
                }
            }
        }
        quote @ ('\'' | '"') => {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next()? {
                    c if c == quote => return Some(Value::String(text)),
                    '\\' => text.push(match chars.next()? {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    }),
                    c => text.push(c),
                }
            }
        }
        _ => {
            let mut number = String::new();
            while let Some(c) = chars.next_if(|c| c.is_ascii_digit() || "+-.eE".contains(*c)) {
                number.push(c);
            }
            if let Ok(int) = number.parse::<i64>() {
                return Some(Value::from(int));
            }
            Number::from_f64(number.parse().ok()?).map(Value::Number)
        }
    }
}

fn skip_space(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}
