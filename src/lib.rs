//! Lossless file-to-image codec.
//!
//! Raw bytes are prefixed with a fixed 312-byte [`header`], padded to a multiple
//! of three and packed straight into 24-bit RGB pixels laid out on a near-square
//! grid. Decoding flattens the grid, reads the header and slices the payload back
//! out. Nothing is compressed or encrypted; a lossy re-save destroys the data.
//!
//! ```
//! let grid = bytepix::encode(b"hello", "hello.txt", "").unwrap();
//! let decoded = bytepix::decode(&grid).unwrap();
//! assert_eq!(decoded.payload, b"hello");
//! assert_eq!(decoded.header.original_filename, "hello.txt");
//! ```

pub mod codec;
pub mod error;
pub mod grid;
pub mod header;
pub mod image_io;

pub use codec::{decode, decode_stream, encode, encode_with, Decoded};
pub use error::{CodecError, Result};
pub use grid::{grid_dimensions, ImageGrid, Pixel};
pub use header::{parse_header, serialize_header, serialize_header_with, Header, HeaderOptions};
pub use image_io::{from_png, load_image, read_file, save_image, to_png, write_file};
