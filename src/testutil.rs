//! Builders for the synthetic documents the tests load.
//!
//! Offsets are always computed while the file is assembled, never
//! hard-coded, so tests stay valid when their fixtures change.

/// Builds a classic one-revision PDF: header, numbered objects, a single
/// xref table with one subsection per object, and a trailer whose `/Root`
/// points at object 1.
pub(crate) struct PdfBuilder {
    objects: Vec<(i64, Vec<u8>)>,
}

impl PdfBuilder {
    pub(crate) fn new() -> Self {
        Self { objects: vec![] }
    }

    pub(crate) fn obj(mut self, num: i64, body: &str) -> Self {
        self.objects.push((num, body.as_bytes().to_vec()));
        self
    }

    pub(crate) fn stream_obj(mut self, num: i64, dict: &str, payload: &[u8]) -> Self {
        let mut body = dict.as_bytes().to_vec();
        body.extend_from_slice(b"\nstream\n");
        body.extend_from_slice(payload);
        body.extend_from_slice(b"\nendstream");

        self.objects.push((num, body));
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut data = b"%PDF-1.4\n".to_vec();
        let mut offsets = vec![];

        for (num, body) in &self.objects {
            offsets.push((*num, data.len()));
            data.extend_from_slice(format!("{num} 0 obj\n").as_bytes());
            data.extend_from_slice(body);
            data.extend_from_slice(b"\nendobj\n");
        }

        let xref_pos = data.len();
        data.extend_from_slice(b"xref\n0 1\n0000000000 65535 f\r\n");

        for (num, offset) in &offsets {
            data.extend_from_slice(format!("{num} 1\n{offset:010} 00000 n\r\n").as_bytes());
        }

        let size = self.objects.iter().map(|(n, _)| *n).max().unwrap_or(0) + 1;
        data.extend_from_slice(format!("trailer\n<< /Size {size} /Root 1 0 R >>\n").as_bytes());
        data.extend_from_slice(format!("startxref\n{xref_pos}\n%%EOF\n").as_bytes());

        data
    }
}

/// A document indexed by an xref stream, with objects 20 and 21 held in
/// the object stream 4: object 20 is `(alpha)`, object 21 is `42`.
pub(crate) fn file_with_stream_xref() -> Vec<u8> {
    let mut data = b"%PDF-1.4\n".to_vec();

    let container_pos = data.len();
    let header = "20 0 21 8 ";
    let payload = format!("{header}(alpha) 42");
    data.extend_from_slice(
        format!(
            "4 0 obj\n<< /Type /ObjStm /N 2 /First {} /Length {} >>\nstream\n{payload}\nendstream\nendobj\n",
            header.len(),
            payload.len()
        )
        .as_bytes(),
    );

    let xref_pos = data.len();
    let records: Vec<u8> = [
        vec![0, 0, 0, 0],
        entry(1, container_pos, 0),
        entry(1, xref_pos, 0),
        entry(2, 4, 0),
        entry(2, 4, 1),
    ]
    .concat();

    data.extend_from_slice(
        format!(
            "9 0 obj\n<< /Type /XRef /Size 22 /W [1 2 1] /Index [0 1 4 1 9 1 20 2] /Length {} >>\nstream\n",
            records.len()
        )
        .as_bytes(),
    );
    data.extend_from_slice(&records);
    data.extend_from_slice(b"\nendstream\nendobj\n");
    data.extend_from_slice(format!("startxref\n{xref_pos}\n%%EOF\n").as_bytes());

    data
}

/// One `/W [1 2 1]` record.
fn entry(entry_type: u8, field2: usize, field3: u8) -> Vec<u8> {
    vec![
        entry_type,
        (field2 >> 8) as u8,
        (field2 & 0xff) as u8,
        field3,
    ]
}
