//! CSV documents: one paragraph per non-empty record

use crate::error::DocumentError;
use crate::format::DocumentFormat;
use crate::text::decode;

/// Paragraphs of a CSV document
///
/// The header row is kept as the first paragraph; every following record
/// becomes `a, b, c` with empty cells left out.
pub(crate) fn paragraphs(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    let text = decode(bytes, DocumentFormat::Csv)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut paragraphs = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| DocumentError::failure(DocumentFormat::Csv, format!("record {}: {}", line + 1, e)))?;

        let cells: Vec<&str> = record
            .iter()
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .collect();
        if !cells.is_empty() {
            paragraphs.push(cells.join(", "));
        }
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_joined() {
        let csv = b"name,comment\nAnn,\"Good work, mostly\"\n,,\nBob,fine\n";
        assert_eq!(
            paragraphs(csv).unwrap(),
            vec!["name, comment", "Ann, Good work, mostly", "Bob, fine"]
        );
    }

    #[test]
    fn test_ragged_rows_allowed() {
        let csv = b"a,b,c\nonly one\n";
        assert_eq!(paragraphs(csv).unwrap(), vec!["a, b, c", "only one"]);
    }
}
