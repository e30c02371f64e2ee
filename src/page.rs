//! Navigating pages, outlines and inherited page attributes.

use crate::object::dict::keys::{
    COUNT, DEST, FIRST, FONT, KIDS, NEXT, OUTLINES, PAGES, PARENT, RESOURCES, ROOT, TITLE,
    USE_OUTLINES,
};
use crate::object::dict::Dict;
use crate::object::string;
use crate::pdf::Pdf;
use log::{error, warn};
use rustc_hash::FxHashSet;

/// An entry of the document outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    /// The decoded `/Title`.
    pub title: Vec<u8>,
    /// Index of the destination in [`Pdf::pages`], `None` when it points
    /// at no known page.
    pub page: Option<usize>,
    /// The raw first element of `/Dest`, usually a page reference.
    pub dest: Vec<u8>,
}

impl Pdf {
    /// The references of the document's pages, in document order.
    ///
    /// The `/Pages` tree is flattened on first use and the list memoized.
    /// A node visited twice or a flattened length that contradicts the
    /// root node's `/Count` means the tree cannot be paged reliably;
    /// `None` is returned and the caller is expected to give up on the
    /// document.
    pub fn pages(&self) -> Option<Vec<&[u8]>> {
        if let Some(pages) = self.caches.pages() {
            return Some(pages);
        }

        let root = self.trailer().get(ROOT)?;
        let pages_ref = self.dict(root).get(PAGES)?;
        let tree = self.dict(pages_ref);
        let count = usize::try_from(self.num(tree.get(COUNT).unwrap_or_default())).ok()?;

        let mut pages = vec![];
        let mut seen = FxHashSet::default();
        seen.insert(pages_ref);

        self.collect_pages(&self.arr(tree.get(KIDS)?), &mut pages, &mut seen)?;

        if pages.len() != count {
            error!("page tree has {} leaves, /Count says {count}", pages.len());

            return None;
        }

        self.caches.set_pages(&pages);

        Some(pages)
    }

    fn collect_pages<'a>(
        &'a self,
        kids: &[&'a [u8]],
        pages: &mut Vec<&'a [u8]>,
        seen: &mut FxHashSet<&'a [u8]>,
    ) -> Option<()> {
        for kid in kids.iter().copied() {
            if !seen.insert(kid) {
                error!(
                    "page tree visits {} twice",
                    String::from_utf8_lossy(kid)
                );

                return None;
            }

            match self.dict(kid).get(KIDS) {
                Some(sub_kids) => self.collect_pages(&self.arr(sub_kids), pages, seen)?,
                None => pages.push(kid),
            }
        }

        Some(())
    }

    /// The document outline, in reading order.
    ///
    /// Empty unless the catalog asks for outlines with
    /// `/PageMode /UseOutlines`. Each entry carries the decoded title, the
    /// destination reference and its index in [`Pdf::pages`].
    pub fn outlines(&self) -> Vec<Outline> {
        if self.page_mode() != USE_OUTLINES {
            return vec![];
        }

        let Some(root) = self.trailer().get(ROOT) else {
            return vec![];
        };
        let Some(outlines_ref) = self.dict(root).get(OUTLINES) else {
            return vec![];
        };

        let pages = self.pages().unwrap_or_default();
        let directory = self.dict(outlines_ref);

        let mut outlines = vec![];
        let mut seen = FxHashSet::default();
        let mut next = directory.get(FIRST);

        while let Some(reference) = next {
            if !seen.insert(reference) {
                warn!("outline /Next chain loops");

                break;
            }

            let node = self.dict(reference);
            if node.is_empty() {
                break;
            }

            let dest = self
                .arr(node.get(DEST).unwrap_or_default())
                .first()
                .copied()
                .unwrap_or_default();

            outlines.push(Outline {
                title: string::decode(self.obj(node.get(TITLE).unwrap_or_default())),
                page: pages.iter().position(|page| *page == dest),
                dest: dest.to_vec(),
            });

            next = node.get(NEXT);
        }

        outlines
    }

    /// Look up an attribute on a page, walking the `/Parent` chain for
    /// inherited values.
    ///
    /// The returned bytes are not resolved, so a reference may come back;
    /// empty when the attribute is defined nowhere along the chain.
    pub fn attribute<'a>(&'a self, name: &[u8], page: &'a [u8]) -> &'a [u8] {
        let mut dict = self.dict(page);
        let mut seen = FxHashSet::default();

        loop {
            if let Some(value) = dict.get(name) {
                return value;
            }

            let Some(parent) = dict.get(PARENT) else {
                return &[];
            };

            if !seen.insert(parent) {
                warn!("/Parent chain loops at {}", String::from_utf8_lossy(parent));

                return &[];
            }

            dict = self.dict(parent);
        }
    }

    /// The resolved form of [`attribute`](Self::attribute).
    pub fn att<'a>(&'a self, name: &[u8], page: &'a [u8]) -> &'a [u8] {
        self.obj(self.attribute(name, page))
    }

    /// The fonts of a page: the resolved `/Resources -> /Font` dictionary.
    pub fn page_fonts<'a>(&'a self, page: &'a [u8]) -> Option<Dict<'a>> {
        let resources = self.attribute(RESOURCES, page);
        let fonts = self.dict(resources).get(FONT)?;

        Some(self.dict(fonts))
    }
}

#[cfg(test)]
mod tests {
    use crate::pdf::Pdf;
    use crate::testutil::PdfBuilder;
    use std::sync::Arc;

    fn load(data: Vec<u8>) -> Pdf {
        Pdf::new(Arc::new(data)).unwrap()
    }

    fn one_page() -> Pdf {
        load(
            PdfBuilder::new()
                .obj(1, "<< /Type /Catalog /Pages 2 0 R >>")
                .obj(
                    2,
                    "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 612 792] >>",
                )
                .obj(3, "<< /Type /Page /Parent 2 0 R >>")
                .build(),
        )
    }

    #[test]
    fn single_page() {
        let pdf = one_page();
        let pages = pdf.pages().unwrap();

        assert_eq!(pages, vec![b"3 0 R".as_ref()]);
        assert_eq!(pdf.att(b"/MediaBox", pages[0]), b"[0 0 612 792]");
    }

    #[test]
    fn pages_memoize() {
        let pdf = one_page();

        assert_eq!(pdf.pages().unwrap(), pdf.pages().unwrap());
    }

    #[test]
    fn nested_tree_flattens_in_order() {
        let pdf = load(
            PdfBuilder::new()
                .obj(1, "<< /Type /Catalog /Pages 2 0 R >>")
                .obj(2, "<< /Type /Pages /Kids [3 0 R 6 0 R] /Count 3 >>")
                .obj(3, "<< /Type /Pages /Parent 2 0 R /Kids [4 0 R 5 0 R] /Count 2 >>")
                .obj(4, "<< /Type /Page /Parent 3 0 R >>")
                .obj(5, "<< /Type /Page /Parent 3 0 R >>")
                .obj(6, "<< /Type /Page /Parent 2 0 R >>")
                .build(),
        );

        let pages = pdf.pages().unwrap();

        assert_eq!(pages, vec![b"4 0 R".as_ref(), b"5 0 R", b"6 0 R"]);

        // Every leaf is a page dictionary, and no two compare equal.
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(pdf.dict(page).get(b"/Type"), Some(b"/Page".as_ref()));
            assert!(!pages[..i].contains(page));
        }
    }

    #[test]
    fn duplicate_page_node_is_fatal() {
        let pdf = load(
            PdfBuilder::new()
                .obj(1, "<< /Type /Catalog /Pages 2 0 R >>")
                .obj(2, "<< /Type /Pages /Kids [3 0 R 3 0 R] /Count 2 >>")
                .obj(3, "<< /Type /Page /Parent 2 0 R >>")
                .build(),
        );

        assert!(pdf.pages().is_none());
    }

    #[test]
    fn cyclic_page_tree_is_fatal() {
        let pdf = load(
            PdfBuilder::new()
                .obj(1, "<< /Type /Catalog /Pages 2 0 R >>")
                .obj(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
                .obj(3, "<< /Type /Pages /Parent 2 0 R /Kids [2 0 R] /Count 1 >>")
                .build(),
        );

        assert!(pdf.pages().is_none());
    }

    #[test]
    fn count_mismatch_is_fatal() {
        let pdf = load(
            PdfBuilder::new()
                .obj(1, "<< /Type /Catalog /Pages 2 0 R >>")
                .obj(2, "<< /Type /Pages /Kids [3 0 R] /Count 5 >>")
                .obj(3, "<< /Type /Page /Parent 2 0 R >>")
                .build(),
        );

        assert!(pdf.pages().is_none());
    }

    #[test]
    fn inherited_attribute_walks_up() {
        let pdf = load(
            PdfBuilder::new()
                .obj(1, "<< /Type /Catalog /Pages 2 0 R >>")
                .obj(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 /Rotate 90 >>")
                .obj(3, "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 10 10] >>")
                .build(),
        );

        // Defined on the page itself, defined on the parent, and absent.
        assert_eq!(pdf.attribute(b"/MediaBox", b"3 0 R"), b"[0 0 10 10]");
        assert_eq!(pdf.attribute(b"/Rotate", b"3 0 R"), b"90");
        assert_eq!(pdf.attribute(b"/CropBox", b"3 0 R"), b"");
    }

    #[test]
    fn attribute_survives_parent_cycle() {
        let pdf = load(
            PdfBuilder::new()
                .obj(1, "<< /Type /Catalog /Pages 2 0 R >>")
                .obj(2, "<< /Parent 3 0 R >>")
                .obj(3, "<< /Parent 2 0 R >>")
                .build(),
        );

        assert_eq!(pdf.attribute(b"/MediaBox", b"2 0 R"), b"");
    }

    #[test]
    fn page_fonts_resolve() {
        let pdf = load(
            PdfBuilder::new()
                .obj(1, "<< /Type /Catalog /Pages 2 0 R >>")
                .obj(
                    2,
                    "<< /Type /Pages /Kids [3 0 R] /Count 1 /Resources << /Font 4 0 R >> >>",
                )
                .obj(3, "<< /Type /Page /Parent 2 0 R >>")
                .obj(4, "<< /F1 5 0 R >>")
                .obj(5, "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>")
                .build(),
        );

        let fonts = pdf.page_fonts(b"3 0 R").unwrap();

        assert_eq!(fonts.get(b"/F1"), Some(b"5 0 R".as_ref()));
    }

    fn outlined() -> Pdf {
        load(
            PdfBuilder::new()
                .obj(
                    1,
                    "<< /Type /Catalog /Pages 2 0 R /PageMode /UseOutlines /Outlines 5 0 R >>",
                )
                .obj(2, "<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 >>")
                .obj(3, "<< /Type /Page /Parent 2 0 R >>")
                .obj(4, "<< /Type /Page /Parent 2 0 R >>")
                .obj(5, "<< /Count 2 /First 6 0 R >>")
                .obj(6, "<< /Title (Second page) /Dest [4 0 R /Fit] /Next 7 0 R >>")
                .obj(7, "<< /Title <FEFF00410042> /Dest [3 0 R /Fit] >>")
                .build(),
        )
    }

    #[test]
    fn outlines_follow_next_chain() {
        let pdf = outlined();
        let outlines = pdf.outlines();

        assert_eq!(outlines.len(), 2);
        assert_eq!(outlines[0].title, b"Second page");
        assert_eq!(outlines[0].page, Some(1));
        assert_eq!(outlines[0].dest, b"4 0 R");
        // The UTF-16BE title comes back as UTF-8.
        assert_eq!(outlines[1].title, b"AB");
        assert_eq!(outlines[1].page, Some(0));
    }

    #[test]
    fn outlines_need_page_mode() {
        let pdf = load(
            PdfBuilder::new()
                .obj(1, "<< /Type /Catalog /Pages 2 0 R /Outlines 5 0 R >>")
                .obj(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
                .obj(3, "<< /Type /Page /Parent 2 0 R >>")
                .obj(5, "<< /Count 1 /First 6 0 R >>")
                .obj(6, "<< /Title (Hidden) /Dest [3 0 R /Fit] >>")
                .build(),
        );

        assert!(pdf.outlines().is_empty());
    }

    #[test]
    fn outline_next_loop_stops() {
        let pdf = load(
            PdfBuilder::new()
                .obj(
                    1,
                    "<< /Type /Catalog /Pages 2 0 R /PageMode /UseOutlines /Outlines 5 0 R >>",
                )
                .obj(2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>")
                .obj(3, "<< /Type /Page /Parent 2 0 R >>")
                .obj(5, "<< /Count 1 /First 6 0 R >>")
                .obj(6, "<< /Title (Loop) /Dest [3 0 R /Fit] /Next 6 0 R >>")
                .build(),
        );

        assert_eq!(pdf.outlines().len(), 1);
    }
}
