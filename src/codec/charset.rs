//! Text-safe representation of raw bytes.
//!
//! Bytes are stored as decoded text plus the name of the encoding that
//! reproduces them exactly.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

pub const ASCII: &str = "ascii";
pub const UTF_8: &str = "utf-8";
pub const LATIN_1: &str = "latin-1";

/// Picks the best-fit encoding and returns `(text, encoding name)`.
pub fn to_text(raw: &[u8]) -> (String, String) {
    if raw.is_ascii() {
        return (String::from_utf8_lossy(raw).into_owned(), ASCII.to_string());
    }
    if let Ok(text) = std::str::from_utf8(raw) {
        return (text.to_string(), UTF_8.to_string());
    }

    let mut detector = EncodingDetector::new();
    detector.feed(raw, true);
    let encoding = detector.guess(None, true);

    let (text, had_errors) = encoding.decode_without_bom_handling(raw);
    if !had_errors {
        let (back, _, unmappable) = encoding.encode(&text);
        if !unmappable && back.as_ref() == raw {
            return (text.into_owned(), encoding.name().to_lowercase());
        }
    }

    // Every byte maps to the code point of the same value.
    (raw.iter().map(|&b| char::from(b)).collect(), LATIN_1.to_string())
}

/// Re-encodes text with the recorded encoding name.
pub fn from_text(text: &str, encoding: &str) -> Result<Vec<u8>, String> {
    match encoding.to_lowercase().as_str() {
        ASCII if text.is_ascii() => Ok(text.as_bytes().to_vec()),
        ASCII => Err("text is not ascii".to_string()),
        UTF_8 | "utf8" => Ok(text.as_bytes().to_vec()),
        // WHATWG maps the iso-8859-1 label to windows-1252.
        LATIN_1 | "latin1" | "iso-8859-1" | "iso8859-1" | "iso_8859_1" | "l1" => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).map_err(|_| format!("{c:?} is not latin-1")))
            .collect(),
        other => {
            let encoding = Encoding::for_label(other.as_bytes())
                .ok_or_else(|| format!("unknown encoding {other:?}"))?;
            let (bytes, _, unmappable) = encoding.encode(text);
            if unmappable {
                return Err(format!("text is not representable in {other}"));
            }
            Ok(bytes.into_owned())
        }
    }
}
