//! Strings.

use crate::object::name::hex_digit;
use crate::reader::Reader;
use crate::trivia::{is_eol, is_white_space};
use log::warn;

/// Decode a string token into its content bytes.
///
/// Literal strings (`(..)`) get their backslash escapes and line
/// continuations processed; hex strings (`<..>`) are nibble-decoded with an
/// odd trailing nibble padded by `0`. A decoded string starting with the
/// UTF-16BE byte order mark is converted to UTF-8. Anything that is not a
/// string token is returned as a copy of the input.
pub fn decode(bytes: &[u8]) -> Vec<u8> {
    let decoded = match (bytes.first(), bytes.last()) {
        (Some(b'('), Some(b')')) => decode_literal(&bytes[1..bytes.len() - 1]),
        (Some(b'<'), Some(b'>')) => decode_hex(&bytes[1..bytes.len() - 1]),
        _ => bytes.to_vec(),
    };

    if decoded.starts_with(&[0xfe, 0xff]) {
        decode_utf16_be(&decoded[2..])
    } else {
        decoded
    }
}

fn decode_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut r = Reader::new(bytes);

    while let Some(byte) = r.read_byte() {
        match byte {
            b'\\' => {
                let Some(next) = r.read_byte() else {
                    break;
                };

                if is_octal(next) {
                    let mut value = (next - b'0') as u16;

                    for _ in 0..2 {
                        match r.eat(is_octal) {
                            Some(d) => value = value * 8 + (d - b'0') as u16,
                            None => break,
                        }
                    }

                    if value > 255 {
                        warn!("octal escape overflows a byte, dropping it");
                    } else {
                        out.push(value as u8);
                    }
                } else {
                    match next {
                        b'n' => out.push(0x0a),
                        b'r' => out.push(0x0d),
                        b't' => out.push(0x09),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0c),
                        // An escaped end-of-line continues the string on
                        // the next line without a break.
                        b'\n' | b'\r' => {
                            r.forward_while(is_eol);
                        }
                        other => out.push(other),
                    }
                }
            }
            // A bare end-of-line marker reads as a single LF, whatever its
            // on-disk form.
            b'\n' | b'\r' => {
                out.push(b'\n');
                r.forward_while(is_eol);
            }
            other => out.push(other),
        }
    }

    out
}

fn decode_hex(bytes: &[u8]) -> Vec<u8> {
    let mut nibbles = Vec::with_capacity(bytes.len());

    for b in bytes.iter().copied() {
        if is_white_space(b) {
            continue;
        }

        match hex_digit(b) {
            Some(n) => nibbles.push(n),
            None => {
                warn!("invalid hex string digit {b:#04x}");

                return vec![];
            }
        }
    }

    if nibbles.len() % 2 == 1 {
        nibbles.push(0);
    }

    nibbles.chunks_exact(2).map(|c| c[0] << 4 | c[1]).collect()
}

fn decode_utf16_be(bytes: &[u8]) -> Vec<u8> {
    if bytes.len() % 2 == 1 {
        warn!("UTF-16 string with odd byte length");

        return vec![];
    }

    let units = bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]));

    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect::<String>()
        .into_bytes()
}

fn is_octal(byte: u8) -> bool {
    matches!(byte, b'0'..=b'7')
}
