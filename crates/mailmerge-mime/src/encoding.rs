//! Header and body transfer encodings.
//!
//! Only the encoders needed for outgoing mail are provided: RFC 2047 "B"
//! words for header values and RFC 2045 Quoted-Printable for bodies.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum encoded line length for Quoted-Printable, excluding CRLF.
const MAX_LINE_LENGTH: usize = 76;

/// Longest run of UTF-8 bytes packed into one RFC 2047 word. 45 bytes
/// encode to 60 base64 characters, keeping each word under 75 characters.
const MAX_WORD_BYTES: usize = 45;

/// Returns true if `text` can be sent without any transfer encoding.
#[must_use]
pub fn is_7bit_safe(text: &str) -> bool {
    text.bytes().all(|b| b.is_ascii() && b != 0)
}

/// Encodes a header value using RFC 2047 if it contains non-ASCII text.
///
/// Long values are split into several encoded words separated by a space,
/// never breaking a UTF-8 sequence.
#[must_use]
pub fn encode_rfc2047(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }

    let mut words = Vec::new();
    let mut chunk_start = 0;
    let mut chunk_len = 0;
    for (idx, ch) in text.char_indices() {
        if chunk_len + ch.len_utf8() > MAX_WORD_BYTES {
            words.push(encoded_word(&text[chunk_start..idx]));
            chunk_start = idx;
            chunk_len = 0;
        }
        chunk_len += ch.len_utf8();
    }
    words.push(encoded_word(&text[chunk_start..]));

    words.join(" ")
}

fn encoded_word(chunk: &str) -> String {
    format!("=?utf-8?B?{}?=", STANDARD.encode(chunk.as_bytes()))
}

/// Encodes a text body using Quoted-Printable (RFC 2045).
///
/// Input line breaks (LF or CRLF) become CRLF hard breaks; long lines get
/// soft breaks so no output line exceeds 76 characters.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::with_capacity(text.len() * 3 / 2);

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        encode_qp_line(line.as_bytes(), &mut result);
    }

    result
}

fn encode_qp_line(line: &[u8], out: &mut String) {
    let mut line_length = 0;

    for (i, &byte) in line.iter().enumerate() {
        let last = i + 1 == line.len();
        let literal = match byte {
            b'!'..=b'<' | b'>'..=b'~' => true,
            // Trailing whitespace would be stripped in transit
            b' ' | b'\t' => !last,
            _ => false,
        };
        let width = if literal { 1 } else { 3 };

        // Leave room for the '=' of a soft break
        if line_length + width > MAX_LINE_LENGTH - 1 {
            out.push_str("=\r\n");
            line_length = 0;
        }

        if literal {
            out.push(byte as char);
        } else {
            let _ = write!(out, "={byte:02X}");
        }
        line_length += width;
    }
}
