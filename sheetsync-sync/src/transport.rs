//! Transport encoding applied to file bytes on the way to and from a store.

use base64::prelude::{Engine as _, BASE64_STANDARD};

use crate::store::Payload;

/// Base64-encode `bytes` for a write.
pub fn encode(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

/// Decode a read payload into raw bytes.
///
/// Line breaks and other ASCII whitespace inside base64 text are ignored;
/// the contents API wraps its output every 60 characters.
pub fn decode(payload: &Payload) -> Result<Vec<u8>, base64::DecodeError> {
    match payload {
        Payload::Raw(bytes) => Ok(bytes.clone()),
        Payload::Base64(text) => {
            let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            BASE64_STANDARD.decode(compact)
        }
    }
}

/// Wrap base64 text at `width` columns the way the contents API does.
pub fn wrap(encoded: &str, width: usize) -> String {
    let width = width.max(1);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / width + 1);
    for (i, c) in encoded.chars().enumerate() {
        if i > 0 && i % width == 0 {
            out.push('\n');
        }
        out.push(c);
    }
    out.push('\n');
    out
}
