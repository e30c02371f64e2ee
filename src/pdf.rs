//! The starting point for reading PDF files.

use crate::cache::{promote_dict, Caches};
use crate::data::Data;
use crate::object::dict::keys::{FIRST, LENGTH, N, PAGE_MODE, ROOT};
use crate::object::dict::Dict;
use crate::object::{array, is_ref, make_ref, num};
use crate::reader::Reader;
use crate::token::{ref_token, token};
use crate::trivia::{is_eol, skip_line_end};
use crate::xref::{self, XrefEntry, XrefMap};
use crate::PdfData;
use log::{error, warn};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::cell::RefCell;

/// A PDF document, opened for random access to its object graph.
///
/// Nothing beyond the cross-reference index is parsed at load time;
/// objects resolve lazily and memoize. A document is cheap to query
/// repeatedly but is not safe for concurrent use; separate documents may
/// live on separate threads.
pub struct Pdf {
    data: Data,
    pub(crate) caches: Caches,
    /// Containers that have been (or failed to be) expanded.
    expanded: RefCell<FxHashSet<i64>>,
    xref: XrefMap,
    trailer: Dict<'static>,
    version: String,
    startxref: usize,
    page_mode: Vec<u8>,
}

impl Pdf {
    /// Try to read the given PDF file.
    ///
    /// Parses the header, locates and merges the cross-reference index,
    /// reads the trailer and expands object streams. Returns `None` on any
    /// fatal structural error, releasing the byte view.
    pub fn new(data: PdfData) -> Option<Pdf> {
        let bytes = data.as_ref().as_ref();

        let Some(version) = find_version(bytes) else {
            error!("missing %PDF header, not a PDF file");

            return None;
        };

        let xref = match xref::load(bytes) {
            Ok(xref) => xref,
            Err(e) => {
                error!("failed to reconstruct the xref: {e:?}");

                return None;
            }
        };

        let Some(trailer) = Dict::parse(xref.trailer) else {
            error!("trailer dictionary did not parse");

            return None;
        };

        // SAFETY: the trailer's slices point into the `Arc`ed file buffer,
        // whose heap allocation outlives the document.
        let trailer = unsafe { promote_dict(trailer) };

        let pdf = Pdf {
            data: Data::new(data.clone()),
            caches: Caches::new(),
            expanded: RefCell::new(FxHashSet::default()),
            xref: xref.map,
            trailer,
            version,
            startxref: xref.start,
            page_mode: vec![],
        };

        for container in &xref.containers {
            if pdf.expand_container(*container).is_none() {
                warn!("failed to expand object stream {container}");
            }
        }

        let page_mode = {
            let root = pdf.trailer.get(ROOT).unwrap_or_default();
            pdf.dict(root)
                .get(PAGE_MODE)
                .map(|v| v.to_vec())
                .unwrap_or_default()
        };

        Some(Pdf { page_mode, ..pdf })
    }

    /// The version string from the header, e.g. `%PDF-1.4`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The size of the underlying byte view.
    pub fn size(&self) -> usize {
        self.data.get().len()
    }

    /// The offset of the most recent xref section.
    pub fn startxref(&self) -> usize {
        self.startxref
    }

    /// The trailer dictionary of the newest revision.
    pub fn trailer(&self) -> &Dict<'_> {
        &self.trailer
    }

    /// The catalog's raw `/PageMode` value, empty when absent.
    pub fn page_mode(&self) -> &[u8] {
        &self.page_mode
    }

    /// The canonical reference of every object the xref knows about, in
    /// object-number order.
    pub fn object_refs(&self) -> Vec<Vec<u8>> {
        let mut numbers: Vec<_> = self.xref.keys().copied().collect();
        numbers.sort_unstable();

        numbers.into_iter().map(make_ref).collect()
    }

    /// Resolve a raw value to its final form.
    ///
    /// Anything that is not a reference comes back unchanged. For a
    /// reference, returns the offset just past the object's value token
    /// (`None` for objects expanded out of object streams) and the value
    /// bytes; the result is memoized. A missing or cyclic reference
    /// resolves to empty bytes.
    pub fn resolve<'a>(&'a self, bytes: &'a [u8]) -> (Option<usize>, &'a [u8]) {
        if !is_ref(bytes) {
            return (None, bytes);
        }

        let mut visited = SmallVec::new();

        self.resolve_impl(bytes, &mut visited)
    }

    fn resolve_impl<'a>(
        &'a self,
        reference: &'a [u8],
        visited: &mut SmallVec<[i64; 8]>,
    ) -> (Option<usize>, &'a [u8]) {
        if !is_ref(reference) {
            return (None, reference);
        }

        let obj_num = num(reference);

        if visited.contains(&obj_num) {
            warn!("cycle while resolving object {obj_num}");

            return (None, &[]);
        }

        visited.push(obj_num);

        if let Some((offset, value)) = self.caches.resolved(reference) {
            // Entries seeded by object-stream expansion may themselves be
            // references; resolution must run to the end.
            if is_ref(value) {
                return self.resolve_impl(value, visited);
            }

            return (offset, value);
        }

        let (offset, value) = self.read_object(obj_num).unwrap_or((None, &[]));

        let (offset, value) = if is_ref(value) {
            self.resolve_impl(value, visited)
        } else {
            (offset, value)
        };

        self.caches.insert_resolved(reference, offset, value);

        (offset, value)
    }

    /// Read the raw value of a file-resident object, or seed the cache
    /// from its container for compressed ones.
    fn read_object(&self, obj_num: i64) -> Option<(Option<usize>, &[u8])> {
        match *self.xref.get(&obj_num)? {
            XrefEntry::Offset(offset) => {
                let mut r = Reader::new(self.data.get());
                r.jump(offset);

                let (num_tok, _) = token(&mut r)?;

                if num(num_tok) != obj_num {
                    warn!("object number mismatch at offset {offset}, expected {obj_num}");

                    return None;
                }

                token(&mut r)?;

                let (kw, _) = token(&mut r)?;
                if kw != b"obj" {
                    warn!("missing obj keyword for object {obj_num}");

                    return None;
                }

                let (value, _) = ref_token(&mut r)?;

                Some((Some(r.offset()), value))
            }
            XrefEntry::InStream { container, .. } => {
                self.expand_container(container)?;
                self.caches.resolved(&make_ref(obj_num))
            }
        }
    }

    /// Decode an object stream and seed the reference cache with its
    /// members.
    fn expand_container(&self, container: i64) -> Option<()> {
        if !self.expanded.borrow_mut().insert(container) {
            return Some(());
        }

        // A container must be file-resident; the format forbids nesting
        // object streams.
        if !matches!(self.xref.get(&container), Some(XrefEntry::Offset(_))) {
            warn!("object stream {container} is not a file-resident object");

            return None;
        }

        let reference = make_ref(container);
        let (dict, payload) = self.decoded_stream(&reference)?;

        let first = dict.get(FIRST).map(num).unwrap_or(0);
        let count = dict.get(N).map(num).unwrap_or(0);

        let mut r = Reader::new(payload);
        let mut members = Vec::with_capacity(count.max(0) as usize);

        for _ in 0..count {
            let (member_tok, _) = token(&mut r)?;
            let (offset_tok, _) = token(&mut r)?;
            members.push((num(member_tok), first + num(offset_tok)));
        }

        for (member, offset) in members {
            let Ok(offset) = usize::try_from(offset) else {
                continue;
            };

            let mut r = Reader::new(payload);
            r.jump(offset);

            let Some((value, _)) = ref_token(&mut r) else {
                warn!("no object at offset {offset} of object stream {container}");

                continue;
            };

            self.caches.insert_resolved(&make_ref(member), None, value);
        }

        Some(())
    }

    /// The resolved raw bytes of a value; empty for missing or cyclic
    /// references.
    pub fn obj<'a>(&'a self, reference: &'a [u8]) -> &'a [u8] {
        self.resolve(reference).1
    }

    /// The resolved value as an integer; 0 when missing or non-numeric.
    pub fn num(&self, reference: &[u8]) -> i64 {
        num(self.obj(reference))
    }

    /// The resolved value as a dictionary; empty when it is not one.
    ///
    /// Parsed dictionaries are memoized by reference, which keeps repeated
    /// walks over the page tree cheap.
    pub fn dict<'a>(&'a self, reference: &'a [u8]) -> Dict<'a> {
        if !is_ref(reference) {
            return Dict::parse(reference).unwrap_or_default();
        }

        if let Some(dict) = self.caches.dict(reference) {
            return dict;
        }

        let dict = Dict::parse(self.obj(reference)).unwrap_or_default();
        self.caches.insert_dict(reference, dict.clone());

        dict
    }

    /// The resolved value as an array of raw elements; empty when it is
    /// not an array.
    pub fn arr<'a>(&'a self, reference: &'a [u8]) -> Vec<&'a [u8]> {
        array::parse(self.obj(reference)).unwrap_or_default()
    }

    /// Like [`arr`](Self::arr), but a non-array value yields the original
    /// reference as a one-element list.
    ///
    /// Callers rely on getting the reference form back, not the resolved
    /// value.
    pub fn forced_array<'a>(&'a self, reference: &'a [u8]) -> Vec<&'a [u8]> {
        let resolved = self.obj(reference);

        if resolved.first() != Some(&b'[') {
            return vec![reference];
        }

        array::parse(resolved).unwrap_or_default()
    }

    /// A stream's dictionary and raw payload.
    ///
    /// Returns `None` when the reference does not lead to a file-resident
    /// stream object.
    pub fn stream<'a>(&'a self, reference: &'a [u8]) -> Option<(Dict<'a>, &'a [u8])> {
        let (offset, value) = self.resolve(reference);

        let Some(offset) = offset else {
            warn!(
                "{} is not a file-resident stream",
                String::from_utf8_lossy(reference)
            );

            return None;
        };

        let dict = Dict::parse(value)?;
        let length = usize::try_from(self.num(dict.get(LENGTH).unwrap_or_default())).ok()?;

        let mut r = Reader::new(self.data.get());
        r.jump(offset);

        let (kw, _) = token(&mut r)?;
        if kw != b"stream" {
            warn!(
                "{} is not a stream",
                String::from_utf8_lossy(reference)
            );

            return None;
        }

        skip_line_end(&mut r);

        Some((dict, r.read_bytes(length)?))
    }

    /// A stream's dictionary and decoded payload.
    ///
    /// The payload is piped through the stream's filter chain; decode
    /// failures yield an empty payload and a diagnostic.
    pub fn decoded_stream<'a>(&'a self, reference: &'a [u8]) -> Option<(Dict<'a>, &'a [u8])> {
        let (dict, payload) = self.stream(reference)?;

        let decoded = match crate::filter::decode_stream(&dict, payload) {
            Cow::Borrowed(bytes) => bytes,
            Cow::Owned(bytes) => self.data.stash(bytes),
        };

        Some((dict, decoded))
    }

    /// Consume the document, releasing the byte view and all caches.
    pub fn close(self) {}
}

/// Extract the version string from the header.
fn find_version(data: &[u8]) -> Option<String> {
    let head = &data[..data.len().min(16)];

    if !head.starts_with(b"%PDF-") {
        return None;
    }

    let end = head
        .iter()
        .position(|b| is_eol(*b))
        .unwrap_or(head.len());

    Some(String::from_utf8_lossy(&head[..end]).into_owned())
}
