//! Memoization for resolved references, parsed dictionaries and the page
//! list.
//!
//! All three caches key on the serialized reference bytes (`12 0 R`). The
//! stored slices are rooted in the document's [`Data`](crate::data::Data)
//! (the file buffer or the decoded-payload arena), which strictly outlives
//! the caches; internally they are stored as `'static` and handed back out
//! shortened to the borrow of the document.

use crate::object::dict::Dict;
use rustc_hash::FxHashMap;
use std::cell::RefCell;

/// A resolved reference: the offset just past the object's value token
/// (`None` for objects expanded out of object streams) and the raw value.
type Resolved = (Option<usize>, &'static [u8]);

#[derive(Default)]
pub(crate) struct Caches {
    resolved: RefCell<FxHashMap<Vec<u8>, Resolved>>,
    dicts: RefCell<FxHashMap<Vec<u8>, Dict<'static>>>,
    pages: RefCell<Option<Vec<&'static [u8]>>>,
}

impl Caches {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn resolved(&self, reference: &[u8]) -> Option<(Option<usize>, &[u8])> {
        self.resolved.borrow().get(reference).copied()
    }

    /// Memoize a resolved reference.
    ///
    /// `value` must be rooted in the document's `Data`.
    pub(crate) fn insert_resolved(&self, reference: &[u8], offset: Option<usize>, value: &[u8]) {
        self.resolved
            .borrow_mut()
            .insert(reference.to_vec(), (offset, unsafe { promote(value) }));
    }

    pub(crate) fn dict(&self, reference: &[u8]) -> Option<Dict<'_>> {
        self.dicts.borrow().get(reference).cloned()
    }

    /// Memoize a parsed dictionary.
    ///
    /// Every slice in `dict` must be rooted in the document's `Data`.
    pub(crate) fn insert_dict(&self, reference: &[u8], dict: Dict<'_>) {
        // SAFETY: same argument as `promote`, entry-wise.
        let dict = unsafe { promote_dict(dict) };

        self.dicts.borrow_mut().insert(reference.to_vec(), dict);
    }

    pub(crate) fn pages(&self) -> Option<Vec<&[u8]>> {
        self.pages
            .borrow()
            .as_ref()
            .map(|p| p.iter().map(|r| &**r).collect())
    }

    /// Memoize the flattened page list.
    ///
    /// Every reference must be rooted in the document's `Data`.
    pub(crate) fn set_pages(&self, pages: &[&[u8]]) {
        let promoted = pages.iter().map(|p| unsafe { promote(p) }).collect();

        *self.pages.borrow_mut() = Some(promoted);
    }
}

/// Extend a slice to the `'static` lifetime used for storage.
///
/// # Safety
///
/// `bytes` must be rooted in the document's `Data`, which is dropped only
/// after the caches and is append-only in the meantime.
unsafe fn promote(bytes: &[u8]) -> &'static [u8] {
    unsafe { std::slice::from_raw_parts(bytes.as_ptr(), bytes.len()) }
}

/// Extend every slice in a dictionary to the `'static` lifetime used for
/// storage.
///
/// # Safety
///
/// Same requirement as [`promote`], entry-wise.
pub(crate) unsafe fn promote_dict(dict: Dict<'_>) -> Dict<'static> {
    unsafe { std::mem::transmute::<Dict<'_>, Dict<'static>>(dict) }
}
