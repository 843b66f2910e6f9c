use std::fmt;

use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Closed texture category set. Labels are part of the cache schema and must
/// stay stable across releases so cached records remain comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureType {
    Smooth,
    Knit,
    Striped,
    Patterned,
    Textured,
}

impl TextureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextureType::Smooth => "smooth",
            TextureType::Knit => "knit",
            TextureType::Striped => "striped",
            TextureType::Patterned => "patterned",
            TextureType::Textured => "textured",
        }
    }
}

impl fmt::Display for TextureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gradients above this count as an edge (luma levels).
const EDGE_THRESHOLD: u64 = 24;

/// Classify an image into one texture category from first-order statistics of
/// the luma plane: edge density, gradient direction bias, and global contrast.
/// Deterministic for a given image.
pub fn classify_texture(luma: &GrayImage) -> TextureType {
    let (w, h) = luma.dimensions();
    if w < 2 || h < 2 {
        return TextureType::Smooth;
    }

    let px = |x: u32, y: u32| luma.get_pixel(x, y)[0] as i32;

    let (mut gx_sum, mut gy_sum) = (0u64, 0u64);
    let mut edges = 0u64;
    let (mut sum, mut sq_sum) = (0u64, 0u64);
    for y in 0..h - 1 {
        for x in 0..w - 1 {
            let p = px(x, y);
            let gx = (px(x + 1, y) - p).unsigned_abs() as u64;
            let gy = (px(x, y + 1) - p).unsigned_abs() as u64;
            gx_sum += gx;
            gy_sum += gy;
            if gx.max(gy) >= EDGE_THRESHOLD {
                edges += 1;
            }
            sum += p as u64;
            sq_sum += (p * p) as u64;
        }
    }

    let n = ((w - 1) * (h - 1)) as f64;
    let mean = sum as f64 / n;
    let std_dev = (sq_sum as f64 / n - mean * mean).max(0.0).sqrt();
    let edge_density = edges as f64 / n;
    // +1 keeps the ratio finite on gradient-free axes
    let direction = (gx_sum as f64 + 1.0) / (gy_sum as f64 + 1.0);

    if edge_density >= 0.03 && !(0.45..=2.2).contains(&direction) {
        TextureType::Striped
    } else if edge_density > 0.25 {
        TextureType::Patterned
    } else if edge_density < 0.05 {
        TextureType::Smooth
    } else if std_dev < 40.0 {
        TextureType::Knit
    } else {
        TextureType::Textured
    }
}
