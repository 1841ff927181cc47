//! Self-describing metadata header placed in front of the payload.
//!
//! Layout (schema version 1):
//!
//! ```text
//! [3 bytes  ] header_length      (big-endian, includes itself)
//! [1 byte   ] padding_count      (zero bytes appended after the payload)
//! [50 bytes ] signature          (UTF-8, zero right-padded)
//! [256 bytes] original_filename  (UTF-8, zero right-padded)
//! [2 bytes  ] zero alignment     (header length becomes a multiple of 3)
//! ```
//!
//! Total header size is [`HEADER_LEN`] = 312 bytes, i.e. exactly 104 pixels.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// How a field's bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Unsigned big-endian integer, at most 4 bytes wide.
    UInt,
    /// UTF-8 text right-padded with zero bytes.
    Text,
}

/// One entry of the fixed header schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
    pub kind: FieldKind,
}

/// A decoded field value, tagged by the field's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    UInt(u32),
    Text(String),
}

pub const HEADER_LENGTH: Field = Field {
    name: "header_length",
    offset: 0,
    width: 3,
    kind: FieldKind::UInt,
};

pub const PADDING_COUNT: Field = Field {
    name: "padding_count",
    offset: 3,
    width: 1,
    kind: FieldKind::UInt,
};

pub const SIGNATURE: Field = Field {
    name: "signature",
    offset: 4,
    width: 50,
    kind: FieldKind::Text,
};

pub const FILENAME: Field = Field {
    name: "original_filename",
    offset: 54,
    width: 256,
    kind: FieldKind::Text,
};

/// All header fields in byte order.
pub const SCHEMA: [Field; 4] = [HEADER_LENGTH, PADDING_COUNT, SIGNATURE, FILENAME];

/// Bytes covered by schema fields; a parser needs at least this much.
pub const FIXED_LEN: usize = FILENAME.offset + FILENAME.width;

/// Serialized header size, zero-padded up to a whole number of pixels.
pub const HEADER_LEN: usize = FIXED_LEN + (3 - FIXED_LEN % 3) % 3;

// Schema sanity, checked at compile time.
const _: () = {
    let mut expected = 0;
    let mut i = 0;
    while i < SCHEMA.len() {
        let field = SCHEMA[i];
        assert!(field.offset == expected, "header fields must be contiguous");
        assert!(field.width > 0);
        if let FieldKind::UInt = field.kind {
            assert!(field.width <= 4, "integer fields are at most 32 bits");
        }
        expected += field.width;
        i += 1;
    }
    assert!(expected == FIXED_LEN);
    assert!(HEADER_LEN % 3 == 0);
    assert!(HEADER_LEN < 1 << (8 * HEADER_LENGTH.width));
};

impl Field {
    fn bytes<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.offset..self.offset + self.width]
    }

    /// Decode this field from the start of a header buffer.
    pub fn decode(&self, data: &[u8]) -> Result<FieldValue> {
        if data.len() < self.offset + self.width {
            return Err(CodecError::TruncatedStream {
                needed: self.offset + self.width,
                available: data.len(),
            });
        }
        let raw = self.bytes(data);
        match self.kind {
            FieldKind::UInt => Ok(FieldValue::UInt(
                raw.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)),
            )),
            FieldKind::Text => {
                let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
                String::from_utf8(raw[..end].to_vec())
                    .map(FieldValue::Text)
                    .map_err(|e| {
                        CodecError::MalformedHeader(format!("{} is not UTF-8: {e}", self.name))
                    })
            }
        }
    }

    fn decode_uint(&self, data: &[u8]) -> Result<u32> {
        match self.decode(data)? {
            FieldValue::UInt(v) => Ok(v),
            FieldValue::Text(_) => Err(CodecError::MalformedHeader(format!(
                "{} is not an integer field",
                self.name
            ))),
        }
    }

    fn decode_text(&self, data: &[u8]) -> Result<String> {
        match self.decode(data)? {
            FieldValue::Text(s) => Ok(s),
            FieldValue::UInt(_) => Err(CodecError::MalformedHeader(format!(
                "{} is not a text field",
                self.name
            ))),
        }
    }

    fn write_uint(&self, out: &mut [u8], value: u32) {
        debug_assert_eq!(self.kind, FieldKind::UInt);
        let be = value.to_be_bytes();
        out[self.offset..self.offset + self.width].copy_from_slice(&be[be.len() - self.width..]);
    }

    fn write_text(&self, out: &mut [u8], value: &[u8]) {
        debug_assert_eq!(self.kind, FieldKind::Text);
        debug_assert!(value.len() <= self.width);
        out[self.offset..self.offset + value.len()].copy_from_slice(value);
    }
}

/// Options controlling how text fields are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderOptions {
    /// Fail instead of truncating an over-long field; also rejects NUL bytes.
    pub strict: bool,
    /// Reject any non-ASCII character in text fields.
    pub ascii_only: bool,
}

impl HeaderOptions {
    pub fn strict() -> Self {
        HeaderOptions {
            strict: true,
            ..Default::default()
        }
    }
}

/// Parsed header of an encoded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub header_length: u32,
    pub padding_count: u8,
    pub signature: String,
    pub original_filename: String,
}

impl Header {
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }
}

/// Number of zero bytes needed to bring `payload_len` to a multiple of 3.
pub fn padding_for(payload_len: usize) -> u8 {
    ((3 - payload_len % 3) % 3) as u8
}

fn fit_text<'a>(value: &'a str, field: &Field, options: &HeaderOptions) -> Result<&'a [u8]> {
    if options.ascii_only && !value.is_ascii() {
        return Err(CodecError::Encoding(format!(
            "{} {value:?} contains non-ASCII characters",
            field.name
        )));
    }
    if options.strict && value.contains('\0') {
        return Err(CodecError::Encoding(format!("{} contains a NUL byte", field.name)));
    }
    if value.len() <= field.width {
        return Ok(value.as_bytes());
    }
    if options.strict {
        return Err(CodecError::Encoding(format!(
            "{} is {} bytes, field holds {}",
            field.name,
            value.len(),
            field.width
        )));
    }
    // cut on a char boundary so the stored text stays valid UTF-8
    let mut end = field.width;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    trace!("truncating {} from {} to {} bytes", field.name, value.len(), end);
    Ok(&value.as_bytes()[..end])
}

/// Build the header for a payload of `payload_len` bytes, truncating long text silently.
pub fn serialize_header(payload_len: usize, filename: &str, signature: &str) -> Result<Vec<u8>> {
    serialize_header_with(payload_len, filename, signature, &HeaderOptions::default())
}

/// Build the header for a payload of `payload_len` bytes.
pub fn serialize_header_with(
    payload_len: usize,
    filename: &str,
    signature: &str,
    options: &HeaderOptions,
) -> Result<Vec<u8>> {
    let signature = fit_text(signature, &SIGNATURE, options)?;
    let filename = fit_text(filename, &FILENAME, options)?;

    let mut out = vec![0u8; HEADER_LEN];
    HEADER_LENGTH.write_uint(&mut out, HEADER_LEN as u32);
    PADDING_COUNT.write_uint(&mut out, u32::from(padding_for(payload_len)));
    SIGNATURE.write_text(&mut out, signature);
    FILENAME.write_text(&mut out, filename);
    Ok(out)
}

/// Parse a header from the start of a decoded byte stream.
pub fn parse_header(data: &[u8]) -> Result<Header> {
    if data.len() < FIXED_LEN {
        return Err(CodecError::TruncatedStream {
            needed: FIXED_LEN,
            available: data.len(),
        });
    }
    let header_length = HEADER_LENGTH.decode_uint(data)?;
    if (header_length as usize) < FIXED_LEN {
        return Err(CodecError::MalformedHeader(format!(
            "header length {header_length} is below the minimum {FIXED_LEN}"
        )));
    }
    let padding_count = PADDING_COUNT.decode_uint(data)?;
    if padding_count > 2 {
        return Err(CodecError::MalformedHeader(format!(
            "padding count {padding_count} is larger than a pixel"
        )));
    }
    Ok(Header {
        header_length,
        padding_count: padding_count as u8,
        signature: SIGNATURE.decode_text(data)?,
        original_filename: FILENAME.decode_text(data)?,
    })
}
