// Byte <-> pixel codec: stream = header + payload + padding, 3 bytes per pixel.

use log::debug;

use crate::error::{CodecError, Result};
use crate::grid::{ImageGrid, BYTES_PER_PIXEL};
use crate::header::{padding_for, parse_header, serialize_header_with, Header, HeaderOptions};

/// Result of decoding an image: the original bytes and the header that described them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub payload: Vec<u8>,
    pub header: Header,
}

/// Encode `bytes` into a pixel grid, truncating over-long text fields silently.
pub fn encode(bytes: &[u8], filename: &str, signature: &str) -> Result<ImageGrid> {
    encode_with(bytes, filename, signature, &HeaderOptions::default())
}

/// Encode `bytes` into a pixel grid using the given header options.
pub fn encode_with(
    bytes: &[u8],
    filename: &str,
    signature: &str,
    options: &HeaderOptions,
) -> Result<ImageGrid> {
    let header = serialize_header_with(bytes.len(), filename, signature, options)?;
    let padding = padding_for(bytes.len()) as usize;

    let mut stream = Vec::with_capacity(header.len() + bytes.len() + padding);
    stream.extend_from_slice(&header);
    stream.extend_from_slice(bytes);
    stream.resize(stream.len() + padding, 0);
    debug_assert_eq!(stream.len() % BYTES_PER_PIXEL, 0);

    let grid = ImageGrid::from_stream(&stream);
    debug!(
        "encoded {} payload bytes (+{} padding) into {}x{} pixels",
        bytes.len(),
        padding,
        grid.width(),
        grid.height()
    );
    Ok(grid)
}

/// Decode a pixel grid produced by [`encode`].
pub fn decode(grid: &ImageGrid) -> Result<Decoded> {
    decode_stream(&grid.to_stream())
}

/// Decode an already flattened byte stream.
pub fn decode_stream(stream: &[u8]) -> Result<Decoded> {
    let header = parse_header(stream)?;
    let start = header.header_length as usize;
    let needed = start + header.padding_count as usize;
    if needed > stream.len() {
        return Err(CodecError::TruncatedStream {
            needed,
            available: stream.len(),
        });
    }
    let end = stream.len() - header.padding_count as usize;
    let payload = stream[start..end].to_vec();
    debug!(
        "decoded {} payload bytes for {:?}",
        payload.len(),
        header.original_filename
    );
    Ok(Decoded { payload, header })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HEADER_LEN;

    fn xorshift64(seed: &mut u64) -> u64 {
        let mut x = *seed;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        *seed = x;
        x
    }

    fn gen_bytes(len: usize, mut seed: u64) -> Vec<u8> {
        (0..len).map(|_| xorshift64(&mut seed) as u8).collect()
    }

    #[test]
    fn empty_payload() {
        let grid = encode(b"", "a.txt", "").unwrap();
        assert_eq!((grid.width(), grid.height()), (8, 13));
        assert_eq!(grid.pixels().len() * 3, HEADER_LEN);

        let out = decode(&grid).unwrap();
        assert!(out.payload.is_empty());
        assert_eq!(out.header.original_filename, "a.txt");
        assert_eq!(out.header.signature, "");
        assert_eq!(out.header.header_length as usize, HEADER_LEN);
    }

    #[test]
    fn hello_drops_one_padding_byte() {
        let grid = encode(b"hello", "hello.txt", "").unwrap();
        assert_eq!((grid.width(), grid.height()), (2, 53));
        let stream = grid.to_stream();
        assert_eq!(stream.len(), 318);
        assert_eq!(&stream[312..317], b"hello");
        assert_eq!(stream[317], 0);

        let out = decode(&grid).unwrap();
        assert_eq!(out.header.padding_count, 1);
        assert_eq!(out.payload, b"hello");
    }

    #[test]
    fn roundtrip_lengths_and_signature() {
        for len in [1usize, 2, 3, 4, 100, 1000, 4099] {
            let data = gen_bytes(len, 0x9E37_79B9 + len as u64);
            let grid = encode(&data, "blob.bin", "tester").unwrap();
            let out = decode(&grid).unwrap();
            assert_eq!(out.payload, data, "len={len}");
            assert_eq!(out.header.signature, "tester");
            assert_eq!(out.header.original_filename, "blob.bin");
        }
    }

    #[test]
    fn trailing_zero_payload_survives() {
        let data = [1u8, 0, 0, 0, 0];
        let out = decode(&encode(&data, "z", "").unwrap()).unwrap();
        assert_eq!(out.payload, data);
    }

    #[test]
    fn strict_options_propagate() {
        let long = "n".repeat(257);
        let err = encode_with(b"x", &long, "", &HeaderOptions::strict()).unwrap_err();
        assert!(matches!(err, CodecError::Encoding(_)));
    }

    #[test]
    fn header_length_past_end_is_truncated() {
        let mut stream = encode(b"abc", "a", "").unwrap().to_stream();
        stream[..3].copy_from_slice(&[0xFF, 0xFF, 0xFF]);
        let err = decode_stream(&stream).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedStream { .. }));
    }

    #[test]
    fn padding_past_end_is_truncated() {
        // header only, claims 2 padding bytes that are not there
        let mut stream = encode(b"", "a", "").unwrap().to_stream();
        stream[3] = 2;
        let err = decode_stream(&stream).unwrap_err();
        assert!(matches!(
            err,
            CodecError::TruncatedStream { needed: 314, available: 312 }
        ));
    }

    #[test]
    fn wide_grid_layout_still_decodes() {
        // same stream laid out wider than tall (13x8 instead of 8x13)
        let stream = encode(b"", "a.txt", "s").unwrap().to_stream();
        let pixels = stream.chunks(3).map(|c| [c[0], c[1], c[2]]).collect();
        let wide = ImageGrid::new(13, 8, pixels).unwrap();
        let out = decode(&wide).unwrap();
        assert!(out.payload.is_empty());
        assert_eq!(out.header.original_filename, "a.txt");
    }

    #[test]
    fn foreign_image_is_rejected() {
        let grid = ImageGrid::from_stream(&[0u8; 30]);
        assert!(decode(&grid).is_err());
    }
}
