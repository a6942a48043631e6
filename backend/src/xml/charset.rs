//! Latin-1 text codec.
//!
//! TISS documents are ISO-8859-1. Reading goes through windows-1252, the
//! WHATWG target of the `iso-8859-1` label, so stray smart quotes from
//! spreadsheet exports still read as text. Writing is strict Latin-1: only
//! U+0000..U+00FF become single bytes.

use encoding_rs::{mem, WINDOWS_1252};
use std::fmt::Write as _;

/// Encoding name written in the XML declaration of generated documents.
pub const DECLARED_ENCODING: &str = "ISO-8859-1";

/// Decode raw document bytes.
///
/// A UTF-8 byte-order mark, if present, switches decoding to UTF-8.
pub fn decode(bytes: &[u8]) -> String {
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text.into_owned()
}

/// Encode text to Latin-1 bytes.
///
/// Characters outside the charset become numeric character references
/// (`&#NNNN;`), which keeps generated XML valid.
pub fn encode(text: &str) -> Vec<u8> {
    if text.chars().all(is_latin1) {
        return mem::encode_latin1_lossy(text).into_owned();
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        if is_latin1(c) {
            escaped.push(c);
        } else {
            let _ = write!(escaped, "&#{};", c as u32);
        }
    }
    mem::encode_latin1_lossy(&escaped).into_owned()
}

fn is_latin1(c: char) -> bool {
    (c as u32) <= 0xFF
}
