// Row-major grid of RGB pixels and the near-square dimension rule.

/// One pixel: three consecutive stream bytes as (R, G, B).
pub type Pixel = [u8; 3];

pub const BYTES_PER_PIXEL: usize = 3;

/// Choose `(width, height)` for `pixel_count` pixels.
///
/// `width` is the largest divisor of `pixel_count` whose square does not exceed it,
/// so `width <= height` and the image is as close to square as an exact fit allows.
/// Prime counts fall back to a single column (`1 x N`).
///
/// Some encoders search downwards from `ceil(sqrt(N)) + 1` instead and emit wider-than-tall
/// grids (6 pixels as 3x2, 10 as 5x2). Keep `width <= height` here; decoding only reads
/// the flattened stream, so those images still decode.
pub fn grid_dimensions(pixel_count: usize) -> (usize, usize) {
    if pixel_count == 0 {
        return (0, 0);
    }
    let mut width = isqrt(pixel_count);
    while pixel_count % width != 0 {
        width -= 1;
    }
    (width, pixel_count / width)
}

fn isqrt(n: usize) -> usize {
    let mut r = (n as f64).sqrt() as usize;
    // float rounding can be off by one for large n
    while r > 0 && r.checked_mul(r).map_or(true, |sq| sq > n) {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).is_some_and(|sq| sq <= n) {
        r += 1;
    }
    r
}

/// A `width x height` image, pixels stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageGrid {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
}

impl ImageGrid {
    /// Wrap existing pixels; returns `None` if the dimensions don't match the pixel count.
    pub fn new(width: usize, height: usize, pixels: Vec<Pixel>) -> Option<Self> {
        if width.checked_mul(height)? != pixels.len() {
            return None;
        }
        Some(ImageGrid {
            width,
            height,
            pixels,
        })
    }

    /// Group a byte stream into pixels and lay them out by [`grid_dimensions`].
    ///
    /// A trailing partial pixel is zero-filled; the codec never produces one.
    pub fn from_stream(stream: &[u8]) -> Self {
        let pixels: Vec<Pixel> = stream
            .chunks(BYTES_PER_PIXEL)
            .map(|c| {
                let mut px = [0u8; 3];
                px[..c.len()].copy_from_slice(c);
                px
            })
            .collect();
        let (width, height) = grid_dimensions(pixels.len());
        ImageGrid {
            width,
            height,
            pixels,
        }
    }

    /// Flatten back into a byte stream, 3 bytes per pixel, row-major.
    pub fn to_stream(&self) -> Vec<u8> {
        self.pixels.iter().flatten().copied().collect()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Pixel at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_small_counts() {
        assert_eq!(grid_dimensions(0), (0, 0));
        assert_eq!(grid_dimensions(1), (1, 1));
        assert_eq!(grid_dimensions(2), (1, 2));
        assert_eq!(grid_dimensions(4), (2, 2));
        assert_eq!(grid_dimensions(6), (2, 3));
        assert_eq!(grid_dimensions(12), (3, 4));
        assert_eq!(grid_dimensions(104), (8, 13));
        assert_eq!(grid_dimensions(106), (2, 53));
    }

    #[test]
    fn primes_are_single_column() {
        for p in [2usize, 3, 5, 7, 13, 97, 7919] {
            assert_eq!(grid_dimensions(p), (1, p));
        }
    }

    #[test]
    fn dimension_rule_holds() {
        for n in 1..2000usize {
            let (w, h) = grid_dimensions(n);
            assert_eq!(w * h, n);
            assert!(w <= h, "n={n} w={w} h={h}");
            // no larger divisor keeps the grid at least as tall as it is wide
            assert!((w + 1..=h).all(|d| n % d != 0 || d > n / d), "n={n}");
        }
    }

    #[test]
    fn isqrt_exact() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(1 << 40), 1 << 20);
        assert_eq!(isqrt((1 << 40) - 1), (1 << 20) - 1);
    }

    #[test]
    fn stream_is_row_major() {
        let stream: Vec<u8> = (0..18).collect();
        let grid = ImageGrid::from_stream(&stream);
        assert_eq!((grid.width(), grid.height()), (2, 3));
        assert_eq!(grid.get(0, 0), Some([0, 1, 2]));
        assert_eq!(grid.get(1, 0), Some([3, 4, 5]));
        assert_eq!(grid.get(0, 1), Some([6, 7, 8]));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.to_stream(), stream);
    }

    #[test]
    fn partial_pixel_is_zero_filled() {
        let grid = ImageGrid::from_stream(&[9, 8, 7, 6]);
        assert_eq!(grid.pixels(), &[[9, 8, 7], [6, 0, 0]]);
    }

    #[test]
    fn new_checks_pixel_count() {
        assert!(ImageGrid::new(2, 2, vec![[0; 3]; 4]).is_some());
        assert!(ImageGrid::new(2, 3, vec![[0; 3]; 4]).is_none());
        assert!(ImageGrid::new(usize::MAX, 2, vec![]).is_none());
    }
}
