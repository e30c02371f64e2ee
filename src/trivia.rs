//! Character classes and comments.

use crate::reader::Reader;

#[inline(always)]
pub(crate) fn is_white_space(byte: u8) -> bool {
    matches!(byte, 0x00 | 0x09 | 0x0a | 0x0c | 0x0d | 0x20)
}

#[inline(always)]
pub(crate) fn is_delimiter(byte: u8) -> bool {
    matches!(
        byte,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// A regular character is anything that continues a name, number or keyword.
#[inline(always)]
pub(crate) fn is_regular(byte: u8) -> bool {
    !is_white_space(byte) && !is_delimiter(byte)
}

#[inline(always)]
pub(crate) fn is_eol(byte: u8) -> bool {
    matches!(byte, 0x0a | 0x0d)
}

/// Skip white spaces and `%`-comments up to the next token start.
#[inline]
pub(crate) fn skip_trivia(r: &mut Reader<'_>) {
    while let Some(b) = r.peek_byte() {
        if is_white_space(b) {
            r.forward();
        } else if b == b'%' {
            r.forward_while(|b| !is_eol(b));
        } else {
            return;
        }
    }
}

/// Skip spaces and one end-of-line marker, landing on the first byte of
/// the next line. Xref records and stream payloads start there.
pub(crate) fn skip_line_end(r: &mut Reader<'_>) {
    r.forward_while(|b| b == b' ' || b == b'\t');
    skip_eol(r);
}

/// Skip a single end-of-line marker (LF, CR, or CR LF).
pub(crate) fn skip_eol(r: &mut Reader<'_>) {
    match r.peek_byte() {
        Some(b'\r') => {
            r.forward();
            if r.peek_byte() == Some(b'\n') {
                r.forward();
            }
        }
        Some(b'\n') => r.forward(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::reader::Reader;
    use crate::trivia::{skip_eol, skip_trivia};

    #[test]
    fn trivia_with_comment() {
        let mut r = Reader::new(b"  % a comment\n\t /Name");
        skip_trivia(&mut r);

        assert_eq!(r.peek_byte(), Some(b'/'));
    }

    #[test]
    fn eol_crlf() {
        let mut r = Reader::new(b"\r\nrest");
        skip_eol(&mut r);

        assert_eq!(r.offset(), 2);
    }

    #[test]
    fn eol_lf_only() {
        let mut r = Reader::new(b"\n\nrest");
        skip_eol(&mut r);

        assert_eq!(r.offset(), 1);
    }
}
