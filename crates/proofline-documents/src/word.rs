//! Word processing documents (DOCX family)
//!
//! Reads `word/document.xml` from the OOXML package. Each `w:p` element is one
//! paragraph; text runs (`w:t`), tabs and breaks inside it are joined.
//! Drawings, pictures, embedded objects, field instructions and tracked
//! deletions contribute no text.

use crate::error::DocumentError;
use crate::format::DocumentFormat;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Elements whose whole subtree is skipped
const SKIPPED: &[&[u8]] = &[b"drawing", b"pict", b"object", b"instrText", b"delText", b"fldSimple"];

/// Open an OOXML package and read one part as a string
pub(crate) fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
    format: DocumentFormat,
) -> Result<String, DocumentError> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| DocumentError::failure(format, format!("missing {}: {}", name, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| DocumentError::failure(format, format!("cannot read {}: {}", name, e)))?;
    Ok(content)
}

/// Open bytes as a zip package
pub(crate) fn open_package(bytes: &[u8], format: DocumentFormat) -> Result<ZipArchive<Cursor<&[u8]>>, DocumentError> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DocumentError::failure(format, format!("not a valid package: {}", e)))
}

/// Paragraphs of a word processing document
pub(crate) fn paragraphs(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    let format = DocumentFormat::WordProcessing;
    let mut archive = open_package(bytes, format)?;
    let xml = read_part(&mut archive, "word/document.xml", format)?;
    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<Vec<String>, DocumentError> {
    let format = DocumentFormat::WordProcessing;
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                if skip_depth > 0 || SKIPPED.contains(&name) {
                    skip_depth += 1;
                } else {
                    match name {
                        b"p" => {
                            in_paragraph = true;
                            current.clear();
                        }
                        b"t" => in_text = true,
                        _ => {}
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                if skip_depth == 0 && in_paragraph {
                    match e.local_name().as_ref() {
                        b"tab" => current.push('\t'),
                        b"br" | b"cr" => current.push(' '),
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if skip_depth == 0 && in_text {
                    let text = e
                        .unescape()
                        .map_err(|err| DocumentError::failure(format, format!("bad text node: {}", err)))?;
                    current.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                } else {
                    match e.local_name().as_ref() {
                        b"t" => in_text = false,
                        b"p" => {
                            in_paragraph = false;
                            if !current.trim().is_empty() {
                                paragraphs.push(std::mem::take(&mut current));
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocumentError::failure(
                    format,
                    format!("malformed XML at position {}: {}", reader.buffer_position(), e),
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}
