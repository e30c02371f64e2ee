//! Decoding stream payloads.
//!
//! A stream dictionary names zero or more filters; the payload is piped
//! through them in order, each with its own decode parameters and an
//! optional PNG predictor pass afterwards.

mod ascii_85;
mod ascii_hex;
mod flate;
mod lzw;
mod predictor;

use crate::object::array;
use crate::object::dict::keys::{
    ASCII85_DECODE, ASCII_HEX_DECODE, DECODE_PARMS, EARLY_CHANGE, FILTER, FLATE_DECODE, LZW_DECODE,
    PREDICTOR,
};
use crate::object::dict::Dict;
use crate::object::num;
use log::error;
use std::borrow::Cow;

/// A stream filter the reader can decode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `/FlateDecode`, zlib or raw deflate.
    Flate,
    /// `/LZWDecode`, variable-width LZW.
    Lzw,
    /// `/ASCII85Decode`.
    Ascii85,
    /// `/ASCIIHexDecode`.
    AsciiHex,
}

impl Filter {
    /// Map a raw filter name to a known filter.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            FLATE_DECODE => Some(Filter::Flate),
            LZW_DECODE => Some(Filter::Lzw),
            ASCII85_DECODE => Some(Filter::Ascii85),
            ASCII_HEX_DECODE => Some(Filter::AsciiHex),
            _ => None,
        }
    }

    fn apply(&self, data: &[u8], params: &Dict<'_>) -> Option<Vec<u8>> {
        match self {
            Filter::Flate => flate::decode(data),
            Filter::Lzw => {
                let early_change = match params.get(EARLY_CHANGE) {
                    Some(v) => num(v) != 0,
                    None => true,
                };

                lzw::decode(data, early_change)
            }
            Filter::Ascii85 => ascii_85::decode(data),
            Filter::AsciiHex => ascii_hex::decode(data),
        }
    }
}

/// Decode a stream payload through the filter chain of its dictionary.
///
/// A missing `/Filter` entry passes the payload through unchanged. Decode
/// failures, unknown filters and unsupported predictors yield an empty
/// payload; the cause is reported to the logging sink.
pub fn decode_stream<'a>(dict: &Dict<'_>, data: &'a [u8]) -> Cow<'a, [u8]> {
    let Some(filter_value) = dict.get(FILTER) else {
        return Cow::Borrowed(data);
    };

    let filters = forced_list(filter_value);
    let params = decode_parms(dict, filters.len());

    let mut current = Cow::Borrowed(data);

    for (name, parm) in filters.iter().zip(params.iter()) {
        let Some(filter) = Filter::from_name(name) else {
            error!("unsupported filter {}", String::from_utf8_lossy(name));

            return Cow::Owned(vec![]);
        };

        let Some(mut decoded) = filter.apply(&current, parm) else {
            error!("failed to decode {filter:?} stream");

            return Cow::Owned(vec![]);
        };

        if parm.contains_key(PREDICTOR) {
            match predictor::apply(parm, decoded) {
                Some(d) => decoded = d,
                None => return Cow::Owned(vec![]),
            }
        }

        current = Cow::Owned(decoded);
    }

    current
}

/// Treat a raw value as a list: arrays parse into their elements, anything
/// else becomes a one-element list.
fn forced_list(value: &[u8]) -> Vec<&[u8]> {
    if value.starts_with(b"[") {
        array::parse(value).unwrap_or_default()
    } else {
        vec![value]
    }
}

/// The per-filter decode parameters.
///
/// A single dictionary applies to every filter in the chain; an array runs
/// parallel to `/Filter`, with missing or non-dictionary entries treated
/// as empty.
fn decode_parms<'a>(dict: &Dict<'a>, filter_count: usize) -> Vec<Dict<'a>> {
    match dict.get(DECODE_PARMS) {
        Some(value) if value.starts_with(b"[") => {
            let elements = array::parse(value).unwrap_or_default();
            (0..filter_count)
                .map(|i| {
                    elements
                        .get(i)
                        .and_then(|e| Dict::parse(e))
                        .unwrap_or_default()
                })
                .collect()
        }
        Some(value) => {
            let parm = Dict::parse(value).unwrap_or_default();
            vec![parm; filter_count]
        }
        None => vec![Dict::empty(); filter_count],
    }
}

#[cfg(test)]
mod tests {
    use crate::filter::{decode_stream, Filter};
    use crate::object::dict::Dict;
    use miniz_oxide::deflate::compress_to_vec_zlib;
    use std::borrow::Cow;

    #[test]
    fn filter_names() {
        assert_eq!(Filter::from_name(b"/FlateDecode"), Some(Filter::Flate));
        assert_eq!(Filter::from_name(b"/LZWDecode"), Some(Filter::Lzw));
        assert_eq!(Filter::from_name(b"/JPXDecode"), None);
    }

    #[test]
    fn no_filter_borrows() {
        let dict = Dict::parse(b"<< /Length 3 >>").unwrap();
        let out = decode_stream(&dict, b"abc");

        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out.as_ref(), b"abc");
    }

    #[test]
    fn flate_round_trip() {
        let compressed = compress_to_vec_zlib(b"hello world", 6);
        let dict = Dict::parse(b"<< /Filter /FlateDecode >>").unwrap();

        assert_eq!(decode_stream(&dict, &compressed).as_ref(), b"hello world");
    }

    #[test]
    fn chained_filters() {
        let compressed = compress_to_vec_zlib(b"chained", 6);
        let mut hex = compressed
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<String>()
            .into_bytes();
        hex.push(b'>');

        let dict = Dict::parse(b"<< /Filter [/ASCIIHexDecode /FlateDecode] >>").unwrap();

        assert_eq!(decode_stream(&dict, &hex).as_ref(), b"chained");
    }

    #[test]
    fn unknown_filter_empties() {
        let dict = Dict::parse(b"<< /Filter /DCTDecode >>").unwrap();

        assert_eq!(decode_stream(&dict, b"\xff\xd8").as_ref(), b"");
    }

    #[test]
    fn parallel_decode_parms() {
        let compressed = compress_to_vec_zlib(&[2, 10, 20, 2, 1, 2], 6);
        let dict = Dict::parse(
            b"<< /Filter [/FlateDecode] /DecodeParms [<< /Predictor 12 /Columns 2 >>] >>",
        )
        .unwrap();

        assert_eq!(decode_stream(&dict, &compressed).as_ref(), &[10, 20, 11, 22]);
    }

    #[test]
    fn single_parms_dict_applies() {
        let compressed = compress_to_vec_zlib(&[2, 10, 20, 2, 1, 2], 6);
        let dict =
            Dict::parse(b"<< /Filter /FlateDecode /DecodeParms << /Predictor 12 /Columns 2 >> >>")
                .unwrap();

        assert_eq!(decode_stream(&dict, &compressed).as_ref(), &[10, 20, 11, 22]);
    }
}
