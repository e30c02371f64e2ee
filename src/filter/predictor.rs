//! The PNG predictor pass.
//!
//! Xref streams and flate-compressed image data commonly run the PNG
//! row predictor over the decoded bytes. Each row starts with one filter
//! type byte; rows are reconstructed against the previous reconstructed
//! row, which starts out as all zeros.

use crate::object::dict::keys::{BITS_PER_COMPONENT, COLORS, COLUMNS, PREDICTOR};
use crate::object::dict::Dict;
use crate::object::num;
use itertools::izip;
use log::warn;

/// Apply the predictor named by the decode parameters.
///
/// Predictor 1 passes the data through; values of 10 and up run the PNG
/// predictor. Anything else (including TIFF predictor 2) is unsupported
/// and yields `None`, as do row filter types beyond Average.
pub(crate) fn apply(params: &Dict<'_>, data: Vec<u8>) -> Option<Vec<u8>> {
    let predictor = num(params.get(PREDICTOR).unwrap_or(b"1"));

    match predictor {
        1 => Some(data),
        p if p >= 10 => {
            let colors = default(params.get(COLORS), 1);
            let columns = default(params.get(COLUMNS), 1);
            let bits = default(params.get(BITS_PER_COMPONENT), 8);

            if bits != 8 {
                warn!("unsupported {bits} bits per component in predictor");

                return None;
            }

            png(colors as usize, columns as usize, data)
        }
        p => {
            warn!("unsupported predictor {p}");

            None
        }
    }
}

fn default(value: Option<&[u8]>, def: i64) -> i64 {
    value.map(num).unwrap_or(def)
}

fn png(colors: usize, columns: usize, data: Vec<u8>) -> Option<Vec<u8>> {
    let row_len = colors * columns;
    // One filter-type byte leads every row.
    let stride = row_len + 1;

    if row_len == 0 || !data.len().is_multiple_of(stride) {
        warn!("predictor data does not divide into rows");

        return None;
    }

    let mut out = Vec::with_capacity(data.len() / stride * row_len);
    // The first row predicts against an all-zero row.
    let mut prev_row = vec![0u8; row_len];

    for in_row in data.chunks_exact(stride) {
        let mut out_row = vec![0u8; row_len];
        reconstruct(in_row[0], &in_row[1..], &prev_row, &mut out_row, colors)?;

        out.extend_from_slice(&out_row);
        prev_row = out_row;
    }

    Some(out)
}

fn reconstruct(
    filter_type: u8,
    in_row: &[u8],
    prev_row: &[u8],
    out_row: &mut [u8],
    colors: usize,
) -> Option<()> {
    match filter_type {
        // None
        0 => out_row.copy_from_slice(in_row),
        // Sub: add the byte one pixel to the left.
        1 => {
            for i in 0..in_row.len() {
                let left = if i >= colors { out_row[i - colors] } else { 0 };
                out_row[i] = in_row[i].wrapping_add(left);
            }
        }
        // Up: add the byte straight above.
        2 => {
            for (out, cur, up) in izip!(out_row.iter_mut(), in_row, prev_row) {
                *out = cur.wrapping_add(*up);
            }
        }
        // Average of left and above.
        3 => {
            for i in 0..in_row.len() {
                let left = if i >= colors { out_row[i - colors] } else { 0 };
                let up = prev_row[i];
                out_row[i] = in_row[i].wrapping_add(((left as u16 + up as u16) / 2) as u8);
            }
        }
        t => {
            warn!("unsupported PNG row filter {t}");

            return None;
        }
    }

    Some(())
}
