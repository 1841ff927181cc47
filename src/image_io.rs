// PNG persistence for pixel grids, plus file helpers that report FileAccess errors.
// Orientation metadata is ignored on load: rotating would reorder the byte stream.

use image::codecs::png::PngEncoder;
use image::error::{ParameterError, ParameterErrorKind};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError, ImageReader, RgbImage};
use log::debug;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{CodecError, Result};
use crate::grid::ImageGrid;

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

fn dimension_error() -> CodecError {
    CodecError::Image(ImageError::Parameter(ParameterError::from_kind(
        ParameterErrorKind::DimensionMismatch,
    )))
}

fn grid_dimensions_u32(grid: &ImageGrid) -> Result<(u32, u32)> {
    if grid.is_empty() {
        return Err(CodecError::EmptyImage);
    }
    let w = u32::try_from(grid.width()).map_err(|_| dimension_error())?;
    let h = u32::try_from(grid.height()).map_err(|_| dimension_error())?;
    Ok((w, h))
}

fn grid_from_rgb(img: RgbImage) -> Result<ImageGrid> {
    let (w, h) = img.dimensions();
    let pixels = img.pixels().map(|p| p.0).collect();
    ImageGrid::new(w as usize, h as usize, pixels).ok_or_else(dimension_error)
}

/// Encode a grid as RGB8 PNG bytes.
pub fn to_png(grid: &ImageGrid) -> Result<Vec<u8>> {
    let (w, h) = grid_dimensions_u32(grid)?;
    let raw = grid.to_stream();

    let mut buf = Cursor::new(Vec::new());
    let encoder = PngEncoder::new(&mut buf);
    encoder.write_image(&raw, w, h, ExtendedColorType::Rgb8)?;
    let out = buf.into_inner();
    if out.len() < PNG_SIGNATURE.len() || out[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        return Err(CodecError::Image(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::Generic("encoder produced non-PNG output".to_string()),
        ))));
    }
    Ok(out)
}

/// Decode image bytes into a grid, dropping any alpha channel.
pub fn from_png(bytes: &[u8]) -> Result<ImageGrid> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ImageError::IoError)?;
    let img = reader.decode()?;
    grid_from_rgb(img.to_rgb8())
}

/// Write a grid to `path` as PNG.
pub fn save_image(grid: &ImageGrid, path: &Path) -> Result<()> {
    let png = to_png(grid)?;
    write_file(path, &png)?;
    debug!(
        "wrote {}x{} image to {}",
        grid.width(),
        grid.height(),
        path.display()
    );
    Ok(())
}

/// Load an image from `path` as an RGB grid.
pub fn load_image(path: &Path) -> Result<ImageGrid> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| file_access(path, e))?;
    let decoder = reader.into_decoder()?;
    let img = DynamicImage::from_decoder(decoder)?;
    debug!("loaded {}x{} image from {}", img.width(), img.height(), path.display());
    grid_from_rgb(img.to_rgb8())
}

/// Read a whole file into memory.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| file_access(path, e))
}

fn file_access(path: &Path, source: std::io::Error) -> CodecError {
    CodecError::FileAccess {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `bytes` to `path` through a temporary file in the same directory.
///
/// The target is only replaced once the data is fully written, so a failed write
/// leaves any existing file untouched and no partial output behind.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| file_access(path, e))?;
    tmp.write_all(bytes).map_err(|e| file_access(path, e))?;
    tmp.persist(path).map_err(|e| file_access(path, e.error))?;
    Ok(())
}
