//! Dictionaries.

use crate::reader::Reader;
use crate::token::{ref_token, token};
use rustc_hash::FxHashMap;
use std::fmt::{Debug, Formatter};

/// A dictionary: raw `/Name` key bytes mapped to raw, unresolved value
/// bytes.
///
/// Values may be indirect references; nothing is resolved at parse time.
/// Keys are unique, insertion order is irrelevant.
#[derive(Clone, Default, PartialEq)]
pub struct Dict<'a>(FxHashMap<&'a [u8], &'a [u8]>);

impl<'a> Dict<'a> {
    /// Create an empty dictionary.
    pub fn empty() -> Dict<'a> {
        Dict(FxHashMap::default())
    }

    /// Parse a dictionary from a `<<..>>` token slice.
    ///
    /// Returns `None` if the slice is not bracketed by `<<` and `>>` or if
    /// an entry key is not a name.
    pub fn parse(bytes: &'a [u8]) -> Option<Dict<'a>> {
        let e = bytes.len().checked_sub(2)?;

        if bytes.len() < 4 || &bytes[..2] != b"<<" || &bytes[e..] != b">>" {
            return None;
        }

        let mut map = FxHashMap::default();
        let mut r = Reader::new(&bytes[2..e]);

        while let Some((key, _)) = token(&mut r) {
            if key[0] != b'/' {
                return None;
            }

            let value = ref_token(&mut r).map(|(v, _)| v).unwrap_or(&[]);
            map.insert(key, value);
        }

        Some(Dict(map))
    }

    /// Look up the raw value for a key (including the leading solidus).
    pub fn get(&self, key: &[u8]) -> Option<&'a [u8]> {
        self.0.get(key).copied()
    }

    /// Whether the dictionary has an entry for the key.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.0.contains_key(key)
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// An iterator over raw `(key, value)` entries.
    pub fn entries(&self) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

impl Debug for Dict<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();

        for (k, v) in &self.0 {
            map.entry(
                &String::from_utf8_lossy(k),
                &String::from_utf8_lossy(v),
            );
        }

        map.finish()
    }
}

/// The dictionary keys the reader cares about, in their raw serialized
/// form.
#[allow(missing_docs)]
pub mod keys {
    macro_rules! key {
        ($i:ident, $e:expr) => {
            pub const $i: &[u8] = $e;
        };
    }

    key!(BITS_PER_COMPONENT, b"/BitsPerComponent");
    key!(COLORS, b"/Colors");
    key!(COLUMNS, b"/Columns");
    key!(COUNT, b"/Count");
    key!(DECODE_PARMS, b"/DecodeParms");
    key!(DEST, b"/Dest");
    key!(EARLY_CHANGE, b"/EarlyChange");
    key!(FILTER, b"/Filter");
    key!(FIRST, b"/First");
    key!(FONT, b"/Font");
    key!(INDEX, b"/Index");
    key!(KIDS, b"/Kids");
    key!(LENGTH, b"/Length");
    key!(N, b"/N");
    key!(NEXT, b"/Next");
    key!(OUTLINES, b"/Outlines");
    key!(PAGE_MODE, b"/PageMode");
    key!(PAGES, b"/Pages");
    key!(PARENT, b"/Parent");
    key!(PREDICTOR, b"/Predictor");
    key!(PREV, b"/Prev");
    key!(RESOURCES, b"/Resources");
    key!(ROOT, b"/Root");
    key!(SIZE, b"/Size");
    key!(TITLE, b"/Title");
    key!(TYPE, b"/Type");
    key!(W, b"/W");

    // Filter names.
    key!(ASCII85_DECODE, b"/ASCII85Decode");
    key!(ASCII_HEX_DECODE, b"/ASCIIHexDecode");
    key!(FLATE_DECODE, b"/FlateDecode");
    key!(LZW_DECODE, b"/LZWDecode");

    // Values compared against.
    key!(USE_OUTLINES, b"/UseOutlines");
}
