/*!
A lazy, random-access reader for the PDF object graph.

This crate turns a byte-addressable view of a PDF file into a resolvable
graph of indirect objects: it reconstructs the cross-reference index from
xref tables and xref streams (including incremental updates), tokenizes PDF
syntax, resolves indirect references on demand with cycle protection and
memoization, decodes stream payloads through a filter pipeline, and expands
object streams. Nothing is parsed up front; every value stays a raw byte
slice over the file buffer until an accessor asks for a dictionary, an
array, a number or a decoded stream.

# Example

```no_run
use pdfseek::Pdf;
use std::sync::Arc;

let data = std::fs::read("document.pdf").unwrap();
let pdf = Pdf::new(Arc::new(data)).unwrap();

for page in pdf.pages().unwrap() {
    let media_box = pdf.att(b"/MediaBox", page);
    println!("{}", String::from_utf8_lossy(media_box));
}
```

# Value representation

Dictionaries map raw `/Name` bytes to raw value bytes; arrays are lists of
raw value bytes; a value may itself be an unresolved reference (`12 0 R`).
[`Pdf::obj`], [`Pdf::dict`], [`Pdf::arr`] and friends resolve references as
needed. All returned slices borrow the document and stay valid until it is
dropped.

# Safety

The only usage of `unsafe` sits in the caching layer, which hands out
document-lifetime slices of lazily decoded payloads from an append-only
arena and memoizes values borrowed from it. None of the parser code uses
`unsafe`.

# Limitations

Encrypted documents, content-stream interpretation, fonts, and any form of
writing are out of scope. The reader is tolerant of malformed files: a
broken reference degrades to an empty result instead of an error.
*/

#![deny(missing_docs)]

use std::sync::Arc;

pub(crate) mod cache;
pub(crate) mod data;
pub(crate) mod reader;
#[cfg(test)]
pub(crate) mod testutil;
pub(crate) mod token;
pub(crate) mod trivia;

pub mod filter;
pub mod object;
pub mod page;
pub mod pdf;
pub mod xref;

pub use object::dict::Dict;
pub use page::Outline;
pub use pdf::Pdf;

/// A container for the bytes of a PDF file.
pub type PdfData = Arc<dyn AsRef<[u8]> + Send + Sync>;
