//! Arrays.

use crate::reader::Reader;
use crate::token::ref_token;
use log::warn;

/// Parsing stops after this many elements; PDFs in the wild don't exceed
/// it, malformed ones shouldn't get to allocate unboundedly.
pub const MAX_ARRAY_LEN: usize = 1024;

/// Parse an array from a `[..]` token slice into its raw elements.
///
/// Elements stay unresolved; an element may be an indirect reference.
/// Returns `None` if the slice is not bracketed by `[` and `]` or holds no
/// elements.
pub fn parse(bytes: &[u8]) -> Option<Vec<&[u8]>> {
    if bytes.len() < 2 || bytes[0] != b'[' || bytes[bytes.len() - 1] != b']' {
        return None;
    }

    let mut r = Reader::new(&bytes[1..bytes.len() - 1]);
    let mut elements = vec![];

    while let Some((v, _)) = ref_token(&mut r) {
        if elements.len() == MAX_ARRAY_LEN {
            warn!("array exceeds {MAX_ARRAY_LEN} elements, truncating");

            break;
        }

        elements.push(v);
    }

    if elements.is_empty() {
        return None;
    }

    Some(elements)
}
