//! Flate (zlib/deflate) decoding.

pub(crate) fn decode(data: &[u8]) -> Option<Vec<u8>> {
    // Streams are supposed to carry a zlib header, but plenty of writers
    // emit raw deflate data.
    zlib(data).or_else(|| deflate(data))
}

fn zlib(data: &[u8]) -> Option<Vec<u8>> {
    miniz_oxide::inflate::decompress_to_vec_zlib(data).ok()
}

fn deflate(data: &[u8]) -> Option<Vec<u8>> {
    miniz_oxide::inflate::decompress_to_vec(data).ok()
}
