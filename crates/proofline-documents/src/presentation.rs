//! Presentation documents (PPTX family)

use crate::error::DocumentError;
use crate::format::DocumentFormat;
use crate::word::{open_package, read_part};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Slide number from a part name like `ppt/slides/slide12.xml`
fn slide_number(name: &str) -> Option<usize> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// Paragraphs of a presentation, slide by slide in slide order
pub(crate) fn paragraphs(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    let format = DocumentFormat::Presentation;
    let mut archive = open_package(bytes, format)?;

    let mut slides: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
        .collect();
    slides.sort_by_key(|(n, _)| *n);

    let mut paragraphs = Vec::new();
    for (_, name) in slides {
        let xml = read_part(&mut archive, &name, format)?;
        paragraphs.extend(parse_slide_xml(&xml)?);
    }

    Ok(paragraphs)
}

/// One paragraph per DrawingML `a:p`
fn parse_slide_xml(xml: &str) -> Result<Vec<String>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => current.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"br" {
                    current.push(' ');
                }
            }
            Ok(Event::Text(e)) => {
                if in_text {
                    let text = e.unescape().map_err(|err| {
                        DocumentError::failure(DocumentFormat::Presentation, format!("bad text node: {}", err))
                    })?;
                    current.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if !current.trim().is_empty() {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocumentError::failure(
                    DocumentFormat::Presentation,
                    format!("malformed XML at position {}: {}", reader.buffer_position(), e),
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}
