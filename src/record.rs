use serde::{Deserialize, Serialize};

use crate::texture::TextureType;

/// One indexed image. The serialized field names are the on-disk cache schema
/// and must stay stable so old caches keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageRecord {
    /// Path relative to the corpus root, `/`-separated. Unique within the index.
    pub filename: String,
    /// Color names, most prominent first. Denormalized from `visual_features`
    /// for cheap query matching.
    pub colors: Vec<String>,
    pub visual_features: VisualFeatures,
}

impl ImageRecord {
    pub fn new(filename: String, visual_features: VisualFeatures) -> Self {
        let colors = visual_features
            .colors
            .dominant_colors
            .iter()
            .map(|c| c.name.clone())
            .collect();
        Self { filename, colors, visual_features }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisualFeatures {
    pub colors: ColorFeatures,
    pub texture: TextureFeatures,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorFeatures {
    /// Sorted by descending prominence, at most `color::MAX_DOMINANT_COLORS`.
    pub dominant_colors: Vec<DominantColor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DominantColor {
    pub name: String,
    pub rgb: [u8; 3],
    /// Share of sampled pixels assigned to this color, in [0, 1].
    pub fraction: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextureFeatures {
    pub texture_type: TextureType,
}

/// A query hit: the full record plus its score. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityResult {
    #[serde(flatten)]
    pub record: ImageRecord,
    pub similarity_score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ImageRecord {
        ImageRecord::new(
            "dresses/blue.png".to_string(),
            VisualFeatures {
                colors: ColorFeatures {
                    dominant_colors: vec![
                        DominantColor { name: "blue".into(), rgb: [0, 0, 255], fraction: 0.7 },
                        DominantColor { name: "white".into(), rgb: [255, 255, 255], fraction: 0.3 },
                    ],
                },
                texture: TextureFeatures { texture_type: TextureType::Smooth },
            },
        )
    }

    #[test]
    fn colors_denormalized_in_order() {
        let record = sample_record();
        assert_eq!(record.colors, vec!["blue", "white"]);
    }

    #[test]
    fn cache_schema_field_names() {
        let json = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(json["filename"], "dresses/blue.png");
        assert_eq!(json["visual_features"]["texture"]["texture_type"], "smooth");
        assert_eq!(json["visual_features"]["colors"]["dominant_colors"][0]["name"], "blue");
    }

    #[test]
    fn record_roundtrip() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: ImageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn unknown_fields_rejected() {
        let json = r#"{"filename":"a.png","colors":[],"visual_features":{"colors":{"dominant_colors":[]},"texture":{"texture_type":"smooth"}},"bogus":1}"#;
        assert!(serde_json::from_str::<ImageRecord>(json).is_err());
    }

    #[test]
    fn similarity_result_flattens_record() {
        let result = SimilarityResult { record: sample_record(), similarity_score: 0.5 };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["filename"], "dresses/blue.png");
        assert_eq!(json["similarity_score"], 0.5);
    }
}
