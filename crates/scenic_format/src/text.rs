//! Document text: parsing and writing
//!
//! The canonical form on disk is plain JSON. Older exporters produced
//! single-quoted keys and strings, which [`normalize_quotes`] rewrites into
//! JSON before parsing.

use crate::document::{Document, SUPPORTED_MAJOR_VERSION};
use crate::error::{FormatError, Result};
use serde::Serialize;

/// Rewrite single-quoted string literals as double-quoted JSON strings.
///
/// Double-quoted literals are copied untouched, so apostrophes inside them
/// survive. Double quotes inside a single-quoted literal are escaped.
pub fn normalize_quotes(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices();

    while let Some((start, c)) = chars.next() {
        match c {
            '"' => {
                out.push('"');
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    out.push(c);
                    match c {
                        '\\' => {
                            if let Some((_, escaped)) = chars.next() {
                                out.push(escaped);
                            }
                        }
                        '"' => {
                            closed = true;
                            break;
                        }
                        _ => {}
                    }
                }
                if !closed {
                    return Err(FormatError::UnterminatedString(start));
                }
            }
            '\'' => {
                out.push('"');
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some((_, '\'')) => out.push('\''),
                            Some((_, escaped)) => {
                                out.push('\\');
                                out.push(escaped);
                            }
                            None => {}
                        },
                        '"' => out.push_str("\\\""),
                        '\'' => {
                            closed = true;
                            break;
                        }
                        _ => out.push(c),
                    }
                }
                if !closed {
                    return Err(FormatError::UnterminatedString(start));
                }
                out.push('"');
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

/// Parse a document from raw bytes
pub fn parse_document(bytes: &[u8]) -> Result<Document> {
    let text = std::str::from_utf8(bytes)?;
    parse_document_str(text)
}

/// Parse a document from text, accepting the single-quoted legacy form
pub fn parse_document_str(text: &str) -> Result<Document> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let document: Document = if text.contains('\'') {
        serde_json::from_str(&normalize_quotes(text)?)?
    } else {
        serde_json::from_str(text)?
    };

    let version = document.metadata.format_version;
    if !version.is_finite() || version.trunc() as u32 != SUPPORTED_MAJOR_VERSION {
        return Err(FormatError::UnsupportedVersion {
            found: version,
            expected: SUPPORTED_MAJOR_VERSION,
        });
    }

    log::debug!(
        "Parsed document v{}: {} objects, {} materials, {} embeds",
        version,
        document.object_count(),
        document.materials.len(),
        document.embeds.len()
    );
    Ok(document)
}

/// Serialize a document as JSON.
///
/// An empty `indent` produces compact output.
pub fn write_document(document: &Document, indent: &str) -> Result<String> {
    if indent.is_empty() {
        return Ok(serde_json::to_string(document)?);
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_single_quotes() {
        let raw = "{'name': 'Box', 'say': 'a \"b\"', 'it\\'s': 1}";
        let json = normalize_quotes(raw).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "Box");
        assert_eq!(value["say"], "a \"b\"");
        assert_eq!(value["it's"], 1);
    }

    #[test]
    fn test_double_quoted_apostrophe_kept() {
        let raw = r#"{"Bob's Mat": 'x'}"#;
        let json = normalize_quotes(raw).unwrap();
        assert_eq!(json, r#"{"Bob's Mat": "x"}"#);
    }

    #[test]
    fn test_unterminated() {
        assert!(matches!(
            normalize_quotes("{'open: 1}"),
            Err(FormatError::UnterminatedString(1))
        ));
    }

    #[test]
    fn test_version_check() {
        let text = r#"{
            "metadata": { "formatVersion": 4.0, "type": "scene" },
            "objects": {}, "geometries": {}, "materials": {}, "embeds": {},
            "textures": {}, "cameras": {}, "lights": {}, "defaults": {}
        }"#;
        assert!(matches!(
            parse_document_str(text),
            Err(FormatError::UnsupportedVersion { expected: 3, .. })
        ));
    }

    #[test]
    fn test_bad_utf8() {
        assert!(matches!(parse_document(&[0xff, 0xfe, 0x00]), Err(FormatError::Utf8(_))));
    }

    #[test]
    fn test_write_uses_tabs() {
        let text = write_document(&Document::new(), "\t").unwrap();
        assert!(text.contains("\n\t\"metadata\""));
        let back = parse_document_str(&text).unwrap();
        assert_eq!(back, Document::new());
    }
}
