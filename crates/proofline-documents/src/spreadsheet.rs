//! Spreadsheet documents via calamine
//!
//! Each sheet yields a `Sheet: <name>` paragraph, then one paragraph per data
//! row in the form `header: value, header: value`.

use crate::error::DocumentError;
use crate::format::DocumentFormat;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use tracing::warn;

/// Paragraphs of a workbook, sheet by sheet
pub(crate) fn paragraphs(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| DocumentError::failure(DocumentFormat::Spreadsheet, e.to_string()))?;

    let mut paragraphs = Vec::new();
    for name in workbook.sheet_names().to_vec() {
        match workbook.worksheet_range(&name) {
            Ok(range) => paragraphs.extend(sheet_paragraphs(&name, rows(&range))),
            Err(e) => warn!("Skipping unreadable sheet '{}': {}", name, e),
        }
    }

    Ok(paragraphs)
}

fn rows(range: &Range<Data>) -> Vec<Vec<String>> {
    range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect()
}

/// Render a cell value as text
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

/// Turn a sheet's rows into paragraphs, pairing values with the header row
fn sheet_paragraphs(name: &str, rows: Vec<Vec<String>>) -> Vec<String> {
    let mut rows = rows
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.is_empty()));

    let Some(header) = rows.next() else {
        return Vec::new();
    };

    let mut paragraphs = vec![format!("Sheet: {}", name)];
    for row in rows {
        let pairs: Vec<String> = row
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.is_empty())
            .map(|(col, value)| match header.get(col).filter(|h| !h.is_empty()) {
                Some(title) => format!("{}: {}", title, value),
                None => format!("Column {}: {}", col + 1, value),
            })
            .collect();
        paragraphs.push(pairs.join(", "));
    }

    paragraphs
}
