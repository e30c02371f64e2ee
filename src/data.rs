//! Storage for the file bytes and decoded payloads.

use crate::PdfData;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};

/// The byte sources a document reads from.
///
/// Most values are slices of the original file buffer, but objects that
/// live in object streams sit inside lazily decoded payloads. `Data` owns
/// both and hands out slices with the document's lifetime for either, so
/// the rest of the crate never cares where a value physically lives.
pub(crate) struct Data {
    raw: PdfData,
    // Append-only: entries are never mutated, removed or reordered until
    // the document is dropped.
    decoded: RefCell<Vec<Box<[u8]>>>,
}

impl Data {
    pub(crate) fn new(raw: PdfData) -> Self {
        Self {
            raw,
            decoded: RefCell::new(vec![]),
        }
    }

    /// The original file bytes.
    #[inline]
    pub(crate) fn get(&self) -> &[u8] {
        self.raw.as_ref().as_ref()
    }

    /// Store a decoded payload and return a slice of it with the lifetime
    /// of `self`.
    pub(crate) fn stash(&self, bytes: Vec<u8>) -> &[u8] {
        let boxed = bytes.into_boxed_slice();

        // SAFETY: the box owns a stable heap allocation; growing the outer
        // vector moves the box itself but not the bytes it points to, and
        // the append-only discipline above means the allocation lives
        // exactly as long as `self`.
        let slice = unsafe { std::slice::from_raw_parts(boxed.as_ptr(), boxed.len()) };

        self.decoded.borrow_mut().push(boxed);

        slice
    }
}

impl Debug for Data {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Data {{ {} bytes }}", self.get().len())
    }
}
