use std::path::Path;

use image::imageops;
use image::{DynamicImage, RgbImage};

use crate::color;
use crate::error::{Error, Result};
use crate::record::{ColorFeatures, TextureFeatures, VisualFeatures};
use crate::texture;

/// Images are analyzed at most at this edge length; bigger inputs are
/// downscaled first. Color fractions and texture statistics are scale-stable,
/// so this only trades precision for speed.
const MAX_ANALYZED_EDGE: u32 = 256;

/// Turns one decoded image into a `VisualFeatures` record by running the
/// color analyzer and the texture classifier over the same pixels.
///
/// Has no side effects: never touches the filesystem beyond the image it is
/// given and never touches the metadata cache.
#[derive(Debug, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Decode `path` and extract features from it. Undecodable files surface
    /// as `Error::Decode` so the caller can skip them and keep indexing.
    pub fn extract_path(&self, path: &Path) -> Result<VisualFeatures> {
        let image = image::open(path)
            .map_err(|source| Error::Decode { path: path.to_path_buf(), source })?;
        self.extract(&image)
    }

    pub fn extract(&self, image: &DynamicImage) -> Result<VisualFeatures> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::EmptyImage);
        }
        let rgb = downscale(image);
        let dominant_colors = color::extract_dominant_colors(&rgb);
        let texture_type = texture::classify_texture(&imageops::grayscale(&rgb));
        Ok(VisualFeatures {
            colors: ColorFeatures { dominant_colors },
            texture: TextureFeatures { texture_type },
        })
    }
}

fn downscale(image: &DynamicImage) -> RgbImage {
    if image.width() > MAX_ANALYZED_EDGE || image.height() > MAX_ANALYZED_EDGE {
        image.thumbnail(MAX_ANALYZED_EDGE, MAX_ANALYZED_EDGE).to_rgb8()
    } else {
        image.to_rgb8()
    }
}
