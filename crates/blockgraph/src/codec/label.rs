//! `\uXXXX` escaping for labels of genera that ask for it.
//!
//! Non-ASCII characters are written as UTF-16 code units, so characters
//! outside the BMP take two escapes. The backslash itself is escaped too.

use std::fmt::Write;

pub fn encode_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii() && c != '\\' {
            out.push(c);
            continue;
        }
        let mut units = [0u16; 2];
        for unit in c.encode_utf16(&mut units) {
            let _ = write!(out, "\\u{:04x}", unit);
        }
    }
    out
}

/// Inverse of [`encode_label`]. Text that is not a well-formed escape is kept
/// as is; unpaired surrogates become U+FFFD.
pub fn decode_label(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut units: Vec<u16> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(unit) = escape_at(text, i) {
            units.push(unit);
            i += 6;
            continue;
        }
        flush_units(&mut units, &mut out);
        // Advance one whole character.
        let c = text[i..].chars().next().unwrap_or('\u{fffd}');
        out.push(c);
        i += c.len_utf8().max(1);
    }
    flush_units(&mut units, &mut out);
    out
}

fn escape_at(text: &str, i: usize) -> Option<u16> {
    let rest = text.get(i..i + 6)?;
    let hex = rest.strip_prefix("\\u")?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(hex, 16).ok()
}

fn flush_units(units: &mut Vec<u16>, out: &mut String) {
    if units.is_empty() {
        return;
    }
    out.extend(char::decode_utf16(units.drain(..)).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_unchanged() {
        assert_eq!(encode_label("hello world"), "hello world");
        assert_eq!(decode_label("hello world"), "hello world");
    }

    #[test]
    fn test_escapes_non_ascii() {
        assert_eq!(encode_label("café"), "caf\\u00e9");
        assert_eq!(decode_label("caf\\u00e9"), "café");
        assert_eq!(encode_label("a\\b"), "a\\u005cb");
    }

    #[test]
    fn test_surrogate_pairs() {
        let encoded = encode_label("🎉");
        assert_eq!(encoded, "\\ud83c\\udf89");
        assert_eq!(decode_label(&encoded), "🎉");
        assert_eq!(decode_label("\\ud83c"), "\u{fffd}");
    }

    #[test]
    fn test_malformed_escape_is_literal() {
        assert_eq!(decode_label("\\uzz12"), "\\uzz12");
        assert_eq!(decode_label("tail\\u12"), "tail\\u12");
    }

    #[test]
    fn test_round_trip() {
        for label in ["", "plain", "ünïcödé", "日本語", "mixed \\ 𝄞 end"] {
            assert_eq!(decode_label(&encode_label(label)), label);
        }
    }
}
