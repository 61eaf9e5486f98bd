//! Text decoding and normalisation for benchmark reports
//!
//! Harness output reaches us through CI logs, so it may be UTF-8 with or
//! without a BOM, UTF-16 (PowerShell redirection), and sprinkled with ANSI
//! colour codes and non-breaking spaces.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

fn ansi_escape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\x1B\[[0-9;]*[A-Za-z]").expect("Failed to compile ANSI escape pattern")
    })
}

fn utf16_units(bytes: &[u8], big_endian: bool) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect()
}

/// Decode report bytes, replacing undecodable sequences with U+FFFD
///
/// A byte-order mark selects UTF-8 or UTF-16 (LE/BE); without one the input
/// is read as UTF-8.
pub fn decode_lossy(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return String::from_utf16_lossy(&utf16_units(rest, false));
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return String::from_utf16_lossy(&utf16_units(rest, true));
    }
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8_lossy(body).into_owned()
}

/// Decode strictly: BOM-selected encoding, then UTF-8, then BOM-less UTF-16LE
///
/// Returns `None` when no candidate encoding decodes the whole input.
pub fn decode_strict(bytes: &[u8]) -> Option<String> {
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return String::from_utf16(&utf16_units(rest, false)).ok();
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return String::from_utf16(&utf16_units(rest, true)).ok();
    }
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return std::str::from_utf8(rest).ok().map(str::to_owned);
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some(text.to_owned());
    }
    if bytes.len() % 2 == 0 {
        return String::from_utf16(&utf16_units(bytes, false)).ok();
    }
    None
}

/// Strip ANSI escape sequences and turn non-breaking spaces into spaces
pub fn normalize(text: &str) -> Cow<'_, str> {
    let text: Cow<'_, str> = if text.contains('\u{a0}') {
        Cow::Owned(text.replace('\u{a0}', " "))
    } else {
        Cow::Borrowed(text)
    };

    let stripped = match ansi_escape().replace_all(&text, "") {
        Cow::Owned(stripped) => Some(stripped),
        Cow::Borrowed(_) => None,
    };
    match stripped {
        Some(stripped) => Cow::Owned(stripped),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le_with_bom(text: &str) -> Vec<u8> {
        let mut bytes = UTF16_LE_BOM.to_vec();
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_decode_plain_utf8() {
        assert_eq!(decode_lossy("| ADD |".as_bytes()), "| ADD |");
    }

    #[test]
    fn test_decode_strips_utf8_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"Mean");
        assert_eq!(decode_lossy(&bytes), "Mean");
        assert_eq!(decode_strict(&bytes).as_deref(), Some("Mean"));
    }

    #[test]
    fn test_decode_utf16_le_bom() {
        let bytes = utf16le_with_bom("12.5 μs");
        assert_eq!(decode_lossy(&bytes), "12.5 μs");
        assert_eq!(decode_strict(&bytes).as_deref(), Some("12.5 μs"));
    }

    #[test]
    fn test_decode_utf16_be_bom() {
        let mut bytes = UTF16_BE_BOM.to_vec();
        for unit in "Opcode".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_lossy(&bytes), "Opcode");
    }

    #[test]
    fn test_decode_lossy_replaces_invalid_bytes() {
        let decoded = decode_lossy(&[b'a', 0xFF, b'b']);
        assert_eq!(decoded, "a\u{FFFD}b");
    }

    #[test]
    fn test_decode_strict_bomless_utf16() {
        // 0xE9 0x00 is not valid UTF-8, so this only decodes as UTF-16LE
        let bytes: Vec<u8> = "Café.Bench"
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        assert_eq!(decode_strict(&bytes).as_deref(), Some("Café.Bench"));
    }

    #[test]
    fn test_decode_strict_rejects_garbage() {
        assert_eq!(decode_strict(&[0xFF, 0xFF, 0xFF]), None);
    }

    #[test]
    fn test_normalize_strips_ansi() {
        let text = "\x1B[1m| ADD |\x1B[0m \x1B[32m1.0 ns\x1B[39m";
        assert_eq!(normalize(text), "| ADD | 1.0 ns");
    }

    #[test]
    fn test_normalize_replaces_nbsp() {
        assert_eq!(normalize("12.3\u{a0}ns"), "12.3 ns");
    }

    #[test]
    fn test_normalize_borrows_clean_input() {
        assert!(matches!(normalize("| ADD |"), Cow::Borrowed(_)));
    }
}
