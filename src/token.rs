//! Tokenizing PDF syntax.
//!
//! A token is a raw byte slice plus the absolute offset it starts at.
//! Composite tokens (literal strings, hex strings, arrays, dictionaries)
//! are returned as a single slice spanning their delimiters, so that they
//! can be handed to the dictionary/array parsers later, if at all.

use crate::reader::Reader;
use crate::trivia::{is_regular, skip_trivia};

/// Read the next token, skipping white space and comments before it.
///
/// Returns the token bytes and the offset they start at, or `None` at the
/// end of the data.
pub(crate) fn token<'a>(r: &mut Reader<'a>) -> Option<(&'a [u8], usize)> {
    skip_trivia(r);

    let start = r.offset();

    match r.peek_byte()? {
        b'/' => {
            r.forward();
            r.forward_while(is_regular);
        }
        b'(' => skip_literal(r)?,
        b'<' => {
            if r.peek_tag(b"<<").is_some() {
                skip_dict(r)?;
            } else {
                skip_hex(r)?;
            }
        }
        b'[' => skip_array(r)?,
        b'>' => {
            if r.forward_tag(b">>").is_none() {
                r.forward();
            }
        }
        b')' | b']' | b'{' | b'}' => r.forward(),
        _ => r.forward_while(is_regular),
    }

    if r.offset() == start {
        return None;
    }

    Some((r.range(start..r.offset())?, start))
}

/// Read the next token, combining `<int> <int> R` into a single reference
/// token.
///
/// When the next token starts with a digit, the two following tokens are
/// read speculatively; unless they complete a reference, the reader rewinds
/// to just after the integer.
pub(crate) fn ref_token<'a>(r: &mut Reader<'a>) -> Option<(&'a [u8], usize)> {
    let (tok, start) = token(r)?;

    if tok[0].is_ascii_digit() {
        let after = r.offset();

        if let Some((gen, _)) = token(r) {
            if gen[0].is_ascii_digit() {
                if let Some((kw, _)) = token(r) {
                    if kw == b"R" {
                        return Some((r.range(start..r.offset())?, start));
                    }
                }
            }
        }

        r.jump(after);
    }

    Some((tok, start))
}

/// Skip a `(..)` string, honoring backslash escapes and balanced inner
/// parentheses.
fn skip_literal(r: &mut Reader<'_>) -> Option<()> {
    r.forward_tag(b"(")?;
    let mut depth = 1;

    while depth > 0 {
        match r.read_byte()? {
            b'\\' => {
                r.read_byte()?;
            }
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }
    }

    Some(())
}

/// Skip a `<..>` string. Content is validated at decode time, not here.
fn skip_hex(r: &mut Reader<'_>) -> Option<()> {
    r.forward_tag(b"<")?;
    r.forward_while(|b| b != b'>');
    r.forward_tag(b">")
}

fn skip_dict(r: &mut Reader<'_>) -> Option<()> {
    r.forward_tag(b"<<")?;

    loop {
        skip_trivia(r);

        if r.forward_tag(b">>").is_some() {
            return Some(());
        }

        token(r)?;
    }
}

fn skip_array(r: &mut Reader<'_>) -> Option<()> {
    r.forward_tag(b"[")?;

    loop {
        skip_trivia(r);

        if r.forward_tag(b"]").is_some() {
            return Some(());
        }

        token(r)?;
    }
}

#[cfg(test)]
mod tests {
    use crate::reader::Reader;
    use crate::token::{ref_token, token};

    fn all(data: &[u8]) -> Vec<&[u8]> {
        let mut r = Reader::new(data);
        let mut out = vec![];

        while let Some((t, _)) = token(&mut r) {
            out.push(t);
        }

        out
    }

    #[test]
    fn simple_tokens() {
        assert_eq!(
            all(b"12 0 obj /Name -4.5 endobj"),
            vec![
                b"12".as_ref(),
                b"0",
                b"obj",
                b"/Name",
                b"-4.5",
                b"endobj"
            ]
        );
    }

    #[test]
    fn offsets() {
        let mut r = Reader::new(b"  12 obj");

        assert_eq!(token(&mut r), Some((b"12".as_ref(), 2)));
        assert_eq!(token(&mut r), Some((b"obj".as_ref(), 5)));
    }

    #[test]
    fn comment_skipped() {
        assert_eq!(all(b"12 % ignored\n13"), vec![b"12".as_ref(), b"13"]);
    }

    #[test]
    fn dict_is_one_token() {
        assert_eq!(
            all(b"<< /A 1 /B << /C (x) >> >> trailer"),
            vec![b"<< /A 1 /B << /C (x) >> >>".as_ref(), b"trailer"]
        );
    }

    #[test]
    fn array_is_one_token() {
        assert_eq!(
            all(b"[0 0 612 792] 7"),
            vec![b"[0 0 612 792]".as_ref(), b"7"]
        );
    }

    #[test]
    fn literal_string_nesting() {
        assert_eq!(all(b"(a (b) \\) c) x"), vec![b"(a (b) \\) c)".as_ref(), b"x"]);
    }

    #[test]
    fn hex_string() {
        assert_eq!(all(b"<FEFF 00 41>/X"), vec![b"<FEFF 00 41>".as_ref(), b"/X"]);
    }

    #[test]
    fn unterminated_string() {
        assert_eq!(token(&mut Reader::new(b"(never closed")), None);
    }

    #[test]
    fn reference_combined() {
        let mut r = Reader::new(b"12 0 R /Next");

        assert_eq!(ref_token(&mut r), Some((b"12 0 R".as_ref(), 0)));
        assert_eq!(ref_token(&mut r), Some((b"/Next".as_ref(), 7)));
    }

    #[test]
    fn reference_rewinds() {
        let mut r = Reader::new(b"12 0 obj");

        assert_eq!(ref_token(&mut r), Some((b"12".as_ref(), 0)));
        assert_eq!(ref_token(&mut r), Some((b"0".as_ref(), 3)));
        assert_eq!(ref_token(&mut r), Some((b"obj".as_ref(), 5)));
    }

    #[test]
    fn reference_needs_integer_generation() {
        let mut r = Reader::new(b"12 /G R");

        assert_eq!(ref_token(&mut r), Some((b"12".as_ref(), 0)));
    }
}
