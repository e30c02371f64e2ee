//! Locating, reading and merging the cross-reference index.
//!
//! A PDF file carries one xref section per revision, each chained to the
//! previous one through `/Prev`, in one of two incompatible encodings: the
//! classic 20-byte-record table with a `trailer` dictionary, or (since
//! PDF 1.5) a compressed xref stream. The chain is walked newest-to-oldest
//! first, then replayed oldest-to-newest so that newer entries override
//! older ones and explicit free records delete.

use crate::filter::decode_stream;
use crate::object::dict::keys::{INDEX, LENGTH, PREV, SIZE, W};
use crate::object::dict::Dict;
use crate::object::{array, num};
use crate::reader::Reader;
use crate::token::token;
use crate::trivia::{is_white_space, skip_line_end};
use log::warn;
use rustc_hash::FxHashMap;

pub(crate) const XREF_ENTRY_LEN: usize = 20;

/// The trailing window searched for the `startxref` marker.
const STARTXREF_WINDOW: usize = 1024;

/// Incremental updates are bounded; a longer chain means a cyclic or
/// corrupt file.
const MAX_CHAIN: usize = 1024;

/// Why the cross-reference index could not be reconstructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefError {
    /// No `startxref <offset> %%EOF` marker in the file tail.
    NoStartXref,
    /// The chain contains a section that could not be read.
    Corrupt,
}

/// An entry of the merged xref map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    /// Byte offset of the object's `N G obj` header in the file.
    Offset(usize),
    /// The object is compressed into an object stream.
    InStream {
        /// Object number of the containing object stream.
        container: i64,
        /// Index of the object within the container.
        index: i64,
    },
}

pub(crate) type XrefMap = FxHashMap<i64, XrefEntry>;

/// The merged cross-reference index of a document.
#[derive(Debug)]
pub(crate) struct Xref<'a> {
    pub(crate) map: XrefMap,
    /// The newest revision's trailer dictionary, as a raw token.
    pub(crate) trailer: &'a [u8],
    /// Object numbers of every object stream referenced by the map.
    pub(crate) containers: Vec<i64>,
    /// Offset of the most recent xref section.
    pub(crate) start: usize,
}

/// Reconstruct the merged xref from the file bytes.
pub(crate) fn load(data: &[u8]) -> Result<Xref<'_>, XrefError> {
    let start = find_startxref(data).ok_or(XrefError::NoStartXref)?;

    let mut r = Reader::new(data);
    r.jump(start);

    let is_table = matches!(token(&mut r), Some((b"xref", _)));

    let (map, containers, trailer) = if is_table {
        let (map, trailer) = read_table_chain(data, start).ok_or(XrefError::Corrupt)?;
        (map, vec![], trailer)
    } else {
        read_stream_chain(data, start).ok_or(XrefError::Corrupt)?
    };

    Ok(Xref {
        map,
        trailer,
        containers,
        start,
    })
}

/// Find the offset announced by the last `startxref <offset> %%EOF` in the
/// file's trailing window.
pub(crate) fn find_startxref(data: &[u8]) -> Option<usize> {
    let window_base = data.len().saturating_sub(STARTXREF_WINDOW);
    let window = &data[window_base..];
    let needle = b"startxref";

    let mut pos = window.len().checked_sub(needle.len())?;

    loop {
        if window[pos..].starts_with(needle) {
            if let Some(offset) = parse_startxref(&window[pos + needle.len()..]) {
                return Some(offset);
            }
        }

        pos = pos.checked_sub(1)?;
    }
}

/// Parse `\s+<digits>\s+%%EOF` after a `startxref` keyword.
fn parse_startxref(data: &[u8]) -> Option<usize> {
    let mut r = Reader::new(data);

    r.eat(is_white_space)?;
    r.forward_while(is_white_space);

    let start = r.offset();
    r.forward_while(|b| b.is_ascii_digit());
    let digits = r.range(start..r.offset())?;

    if digits.is_empty() {
        return None;
    }

    r.eat(is_white_space)?;
    r.forward_while(is_white_space);
    r.peek_tag(b"%%EOF")?;

    usize::try_from(num(digits)).ok()
}

/// Walk a `/Prev` chain starting at `start`, newest first.
///
/// `section_trailer` must yield the raw trailer dictionary token of the
/// section at the given offset without touching the map.
fn walk_chain<'a>(
    data: &'a [u8],
    start: usize,
    section_trailer: impl Fn(&'a [u8], usize) -> Option<&'a [u8]>,
) -> Option<(Vec<usize>, &'a [u8])> {
    let mut chain = vec![];
    let mut trailer = None;
    let mut pos = start;

    loop {
        if chain.len() >= MAX_CHAIN {
            warn!("xref chain exceeds {MAX_CHAIN} sections");

            return None;
        }

        chain.push(pos);

        let dict_tok = section_trailer(data, pos)?;

        if trailer.is_none() {
            trailer = Some(dict_tok);
        }

        match Dict::parse(dict_tok)?.get(PREV) {
            Some(prev) => pos = usize::try_from(num(prev)).ok()?,
            None => break,
        }
    }

    Some((chain, trailer?))
}

// Table form.

fn read_table_chain(data: &[u8], start: usize) -> Option<(XrefMap, &[u8])> {
    let (chain, trailer) = walk_chain(data, start, table_trailer)?;

    let mut map = XrefMap::default();

    for pos in chain.iter().rev() {
        read_table_section(data, *pos, &mut map)?;
    }

    Some((map, trailer))
}

/// Skip over the subsections of a table at `pos` and return its trailer
/// dictionary token.
fn table_trailer(data: &[u8], pos: usize) -> Option<&[u8]> {
    let mut r = Reader::new(data);
    r.jump(pos);

    let (kw, _) = token(&mut r)?;
    if kw != b"xref" {
        return None;
    }

    loop {
        let (first, p) = token(&mut r)?;

        if !first[0].is_ascii_digit() {
            r.jump(p);

            break;
        }

        let (count, _) = token(&mut r)?;
        skip_line_end(&mut r);
        r.jump(
            r.offset()
                .checked_add(usize::try_from(num(count)).ok()?.checked_mul(XREF_ENTRY_LEN)?)?,
        );
    }

    let (kw, _) = token(&mut r)?;
    if kw != b"trailer" {
        warn!("xref table without trailer");

        return None;
    }

    token(&mut r).map(|(dict_tok, _)| dict_tok)
}

fn read_table_section(data: &[u8], pos: usize, map: &mut XrefMap) -> Option<()> {
    let mut r = Reader::new(data);
    r.jump(pos);

    let (kw, _) = token(&mut r)?;
    if kw != b"xref" {
        return None;
    }

    loop {
        let (first_tok, _) = token(&mut r)?;

        if first_tok == b"trailer" {
            return Some(());
        }

        let (count_tok, _) = token(&mut r)?;
        skip_line_end(&mut r);

        let first = num(first_tok);
        let count = usize::try_from(num(count_tok)).ok()?;
        let records = r.read_bytes(count.checked_mul(XREF_ENTRY_LEN)?)?;

        for (i, record) in records.chunks_exact(XREF_ENTRY_LEN).enumerate() {
            let obj_num = first + i as i64;

            // `oooooooooo ggggg n` plus a two-byte end-of-line.
            if record[17] == b'n' {
                map.insert(
                    obj_num,
                    XrefEntry::Offset(usize::try_from(num(&record[0..10])).ok()?),
                );
            } else {
                map.remove(&obj_num);
            }
        }
    }
}

// Stream form.

fn read_stream_chain(data: &[u8], start: usize) -> Option<(XrefMap, Vec<i64>, &[u8])> {
    let (chain, trailer) = walk_chain(data, start, stream_trailer)?;

    let mut map = XrefMap::default();
    let mut containers = vec![];

    for pos in chain.iter().rev() {
        read_stream_section(data, *pos, &mut map)?;
    }

    // Deduplicated so expansion decodes each container once.
    for entry in map.values() {
        if let XrefEntry::InStream { container, .. } = entry {
            if !containers.contains(container) {
                containers.push(*container);
            }
        }
    }
    containers.sort_unstable();

    Some((map, containers, trailer))
}

fn stream_trailer(data: &[u8], pos: usize) -> Option<&[u8]> {
    let mut r = Reader::new(data);
    r.jump(pos);

    let (obj_num, _) = token(&mut r)?;
    if !obj_num[0].is_ascii_digit() {
        return None;
    }

    token(&mut r)?;

    let (kw, _) = token(&mut r)?;
    if kw != b"obj" {
        return None;
    }

    token(&mut r).map(|(dict_tok, _)| dict_tok)
}

fn read_stream_section(data: &[u8], pos: usize, map: &mut XrefMap) -> Option<()> {
    let dict_tok = stream_trailer(data, pos)?;
    let dict = Dict::parse(dict_tok)?;

    // Reposition after the dictionary and slice the payload.
    let mut r = Reader::new(data);
    r.jump(pos);
    for _ in 0..4 {
        token(&mut r)?;
    }

    let (kw, _) = token(&mut r)?;
    if kw != b"stream" {
        warn!("xref stream section without stream payload");

        return None;
    }
    skip_line_end(&mut r);

    let length = usize::try_from(num(dict.get(LENGTH)?)).ok()?;
    let payload = r.read_bytes(length)?;
    let decoded = decode_stream(&dict, payload);

    let size = num(dict.get(SIZE)?);
    let widths = field_widths(&dict)?;
    let record_len: usize = widths.iter().sum();

    if record_len == 0 {
        return None;
    }

    let ranges = match dict.get(INDEX) {
        Some(value) => {
            let elements = array::parse(value)?;
            elements
                .chunks_exact(2)
                .map(|pair| (num(pair[0]), num(pair[1])))
                .collect()
        }
        None => vec![(0, size)],
    };

    let mut records = Reader::new(&decoded);

    for (first, count) in ranges {
        for i in 0..count {
            let obj_num = first + i;

            // A zero-width type field defaults to a regular entry.
            let entry_type = if widths[0] == 0 {
                1
            } else {
                bnum(records.read_bytes(widths[0])?)
            };
            let field2 = read_field(&mut records, widths[1])?;
            let field3 = read_field(&mut records, widths[2])?;

            match entry_type {
                0 => {
                    map.remove(&obj_num);
                }
                1 => {
                    map.insert(obj_num, XrefEntry::Offset(usize::try_from(field2).ok()?));
                }
                2 => {
                    map.insert(
                        obj_num,
                        XrefEntry::InStream {
                            container: field2,
                            index: field3,
                        },
                    );
                }
                t => {
                    warn!("unknown xref stream entry type {t}");

                    return None;
                }
            }
        }
    }

    Some(())
}

fn field_widths(dict: &Dict<'_>) -> Option<[usize; 3]> {
    let w = array::parse(dict.get(W)?)?;

    if w.len() != 3 {
        warn!("unexpected /W length {}", w.len());

        return None;
    }

    let mut widths = [0; 3];

    for (out, value) in widths.iter_mut().zip(&w) {
        let width = usize::try_from(num(value)).ok()?;

        // Wider fields can't be addressed anyway.
        if width > 8 {
            warn!("xref stream field width {width} out of range");

            return None;
        }

        *out = width;
    }

    Some(widths)
}

/// Read one big-endian field; zero-width fields default to 0.
fn read_field(r: &mut Reader<'_>, width: usize) -> Option<i64> {
    if width == 0 {
        return Some(0);
    }

    r.read_bytes(width).map(bnum)
}

fn bnum(bytes: &[u8]) -> i64 {
    bytes.iter().fold(0, |acc, b| (acc << 8) + *b as i64)
}
