//! Per-image brightness and contrast.
//!
//! Brightness is the mean 8-bit luma divided by 255. Contrast is the spread
//! between the 2nd and 98th luma percentiles, also divided by 255. Both are
//! used downstream to flag dark or washed-out frames.

use image::{GrayImage, ImageReader, Luma, RgbImage};
use std::path::Path;

use crate::error::{NormalizeError, Result};

const LOW_PERCENTILE: f64 = 2.0;
const HIGH_PERCENTILE: f64 = 98.0;

/// Dimensions and luma statistics of one decoded image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageStats {
    pub width: u32,
    pub height: u32,
    pub brightness: f64,
    pub contrast: f64,
}

/// Decode the image at `path` and compute its statistics.
///
/// The file is opened and closed within this call on every path.
pub fn get_image_stats(path: &Path) -> Result<ImageStats> {
    let image = ImageReader::open(path)
        .map_err(|e| NormalizeError::io(path, e))?
        .with_guessed_format()
        .map_err(|e| NormalizeError::io(path, e))?
        .decode()
        .map_err(|source| NormalizeError::Image {
            path: path.to_path_buf(),
            source,
        })?;

    let (width, height) = (image.width(), image.height());
    let luma = rgb_to_luma(&image.to_rgb8());
    let (brightness, contrast) = luma_stats(luma.as_raw()).ok_or(NormalizeError::EmptyImage {
        path: path.to_path_buf(),
    })?;

    Ok(ImageStats {
        width,
        height,
        brightness,
        contrast,
    })
}

/// 8-bit ITU-R 601 luma, using the fixed-point weights common image libraries use.
pub fn rgb_to_luma(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let l = (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16;
        Luma([l as u8])
    })
}

/// `(brightness, contrast)` of a luma buffer, or `None` when it is empty.
pub fn luma_stats(pixels: &[u8]) -> Option<(f64, f64)> {
    let histogram = LumaHistogram::from_pixels(pixels)?;
    let brightness = histogram.mean() / 255.0;
    let p_low = histogram.percentile(LOW_PERCENTILE);
    let p_high = histogram.percentile(HIGH_PERCENTILE);
    Some((brightness, (p_high - p_low) / 255.0))
}

// 256-bin histogram; order statistics are read from cumulative counts
struct LumaHistogram {
    counts: [u64; 256],
    total: u64,
}

impl LumaHistogram {
    fn from_pixels(pixels: &[u8]) -> Option<Self> {
        if pixels.is_empty() {
            return None;
        }
        let mut counts = [0u64; 256];
        for &p in pixels {
            counts[p as usize] += 1;
        }
        Some(Self {
            counts,
            total: pixels.len() as u64,
        })
    }

    fn mean(&self) -> f64 {
        let sum: u64 = self
            .counts
            .iter()
            .enumerate()
            .map(|(value, &count)| value as u64 * count)
            .sum();
        sum as f64 / self.total as f64
    }

    // Linear interpolation between the two nearest order statistics
    fn percentile(&self, p: f64) -> f64 {
        let rank = p / 100.0 * (self.total - 1) as f64;
        let lo = rank.floor() as u64;
        let hi = rank.ceil() as u64;
        let below = self.value_at(lo);
        let above = self.value_at(hi);
        below + (above - below) * (rank - lo as f64)
    }

    // Value of the `index`-th smallest pixel (0-based)
    fn value_at(&self, index: u64) -> f64 {
        let mut seen = 0;
        for (value, &count) in self.counts.iter().enumerate() {
            seen += count;
            if index < seen {
                return value as f64;
            }
        }
        255.0
    }
}
