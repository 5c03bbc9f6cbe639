//! Plain text decoding and blank-line paragraph splitting

use crate::error::DocumentError;
use crate::format::DocumentFormat;
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

/// Share of replacement characters above which decoded text is rejected
const MAX_REPLACEMENT_RATIO: f64 = 0.25;

/// Decode bytes to text
///
/// A byte-order mark wins; otherwise valid UTF-8 is taken as is, and
/// anything else is decoded with the encoding `chardetng` guesses (GBK,
/// Shift_JIS, windows-1252, ...).
///
/// # Errors
///
/// Returns `ExtractionFailure` for `format` when the result is mostly
/// replacement characters.
pub(crate) fn decode(bytes: &[u8], format: DocumentFormat) -> Result<String, DocumentError> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None if std::str::from_utf8(bytes).is_ok() => (UTF_8, bytes),
        None => {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            let guess = detector.guess(None, true);
            debug!("Input is not UTF-8, decoding as {}", guess.name());
            (guess, bytes)
        }
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(body);
    if had_errors && mostly_replacement(&text) {
        return Err(DocumentError::failure(
            format,
            format!("text is not readable as {}", encoding.name()),
        ));
    }

    Ok(text.into_owned())
}

fn mostly_replacement(text: &str) -> bool {
    let visible = text.chars().filter(|c| !c.is_whitespace()).count();
    let replaced = text.chars().filter(|c| *c == char::REPLACEMENT_CHARACTER).count();
    visible > 0 && replaced as f64 / visible as f64 > MAX_REPLACEMENT_RATIO
}

/// Split text into paragraphs on blank lines, joining the lines inside each
pub(crate) fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs
}

/// Paragraphs of a plain text document
pub(crate) fn paragraphs(bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
    Ok(split_paragraphs(&decode(bytes, DocumentFormat::PlainText)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_text(bytes: &[u8]) -> Result<String, DocumentError> {
        decode(bytes, DocumentFormat::PlainText)
    }

    #[test]
    fn test_utf8_bom_stripped() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFhello").unwrap(), "hello");
    }

    #[test]
    fn test_utf16_le_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "héllo".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_text(&bytes).unwrap(), "héllo");
    }

    #[test]
    fn test_utf16_be_with_bom() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "数据".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_text(&bytes).unwrap(), "数据");
    }

    #[test]
    fn test_gbk_essay_is_detected() {
        let essay = "本文研究了城市交通拥堵的主要原因，并提出了相应的解决方案。\
                     我们通过问卷调查和实地观察收集数据，分析结果表明，公共交通的发展对缓解拥堵具有重要作用。\
                     最后，本文对未来的研究方向进行了展望。";
        let (bytes, _, _) = encoding_rs::GBK.encode(essay);
        assert!(std::str::from_utf8(&bytes).is_err());

        assert_eq!(decode_text(&bytes).unwrap(), essay);
        assert_eq!(paragraphs(&bytes).unwrap(), vec![essay]);
    }

    #[test]
    fn test_windows_1252_is_detected() {
        let text = "Le café était très agréable, et la crème brûlée était délicieuse à côté du théâtre.";
        let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(text);
        assert_eq!(decode_text(&bytes).unwrap(), text);
    }

    #[test]
    fn test_unreadable_text_fails() {
        let bytes = [0xEF, 0xBB, 0xBF, 0xFF, 0xFE, 0xFD, 0xFC, 0xC0, 0xC1, b'a'];
        let result = decode(&bytes, DocumentFormat::Markdown);
        assert!(matches!(
            result,
            Err(DocumentError::ExtractionFailure {
                format: DocumentFormat::Markdown,
                ..
            })
        ));
    }

    #[test]
    fn test_split_on_blank_lines() {
        let text = "line one\nline two\n\n\n  \nthird\r\nfourth\n";
        assert_eq!(split_paragraphs(text), vec!["line one line two", "third fourth"]);
    }
}
