//! Names.

use crate::reader::Reader;
use std::borrow::Cow;

/// Decode the `#HH` escapes of a name token.
///
/// Works on the raw token with or without its leading solidus; bytes other
/// than well-formed `#HH` sequences pass through untouched. Escape-free
/// names are returned borrowed.
pub fn unescape(bytes: &[u8]) -> Cow<'_, [u8]> {
    if !bytes.contains(&b'#') {
        return Cow::Borrowed(bytes);
    }

    let mut result = Vec::with_capacity(bytes.len());
    let mut r = Reader::new(bytes);

    while let Some(b) = r.read_byte() {
        if b == b'#' {
            match (r.peek_byte().and_then(hex_digit), second_digit(&r)) {
                (Some(hi), Some(lo)) => {
                    result.push(hi << 4 | lo);
                    r.forward();
                    r.forward();
                }
                _ => result.push(b),
            }
        } else {
            result.push(b);
        }
    }

    Cow::Owned(result)
}

fn second_digit(r: &Reader<'_>) -> Option<u8> {
    let mut r = r.clone();
    r.forward();
    r.peek_byte().and_then(hex_digit)
}

#[inline(always)]
pub(crate) fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}
