//! Free-text similarity scoring over indexed records.
//!
//! Scoring policy (fixed, so scores are comparable across queries):
//! every query token is matched against each record's color names and texture
//! label. A color hit is worth 1.0 for an exact name match or 0.6 for a
//! synonym-family match, scaled by `0.5 + 0.5 * fraction` so prominent colors
//! outrank incidental ones. A texture hit is worth 1.0 for the label itself or
//! 0.6 for a style-vocabulary match. Each component is averaged over all query
//! tokens and the final score is `0.6 * color + 0.4 * texture`, which keeps it
//! in [0, 1]. Blank queries are an error, never a neutral ranking.

use crate::error::{Error, Result};
use crate::record::{DominantColor, ImageRecord, SimilarityResult};

const COLOR_WEIGHT: f32 = 0.6;
const TEXTURE_WEIGHT: f32 = 0.4;
const SYNONYM_STRENGTH: f32 = 0.6;

/// Query token -> palette names it also matches, at `SYNONYM_STRENGTH`.
const COLOR_FAMILIES: &[(&str, &[&str])] = &[
    ("blue", &["navy", "teal"]),
    ("navy", &["blue"]),
    ("denim", &["blue", "navy"]),
    ("teal", &["blue", "green"]),
    ("red", &["maroon", "pink"]),
    ("maroon", &["red", "brown"]),
    ("burgundy", &["maroon", "red"]),
    ("pink", &["red", "purple"]),
    ("purple", &["pink", "navy"]),
    ("green", &["olive", "teal"]),
    ("olive", &["green", "brown"]),
    ("yellow", &["orange", "beige"]),
    ("orange", &["yellow", "red"]),
    ("brown", &["beige", "maroon"]),
    ("beige", &["brown", "white"]),
    ("tan", &["beige", "brown"]),
    ("cream", &["beige", "white"]),
    ("white", &["beige"]),
    ("black", &["gray"]),
    ("gray", &["black", "white"]),
];

/// Query token -> texture labels it implies, at `SYNONYM_STRENGTH`.
/// Exact label tokens ("knit", "striped", ...) match at full strength instead.
const STYLE_VOCABULARY: &[(&str, &[&str])] = &[
    ("casual", &["smooth", "knit"]),
    ("formal", &["smooth"]),
    ("elegant", &["smooth"]),
    ("sleek", &["smooth"]),
    ("plain", &["smooth"]),
    ("cozy", &["knit"]),
    ("warm", &["knit"]),
    ("sweater", &["knit"]),
    ("wool", &["knit"]),
    ("stripe", &["striped"]),
    ("stripes", &["striped"]),
    ("pinstripe", &["striped"]),
    ("plaid", &["patterned", "striped"]),
    ("floral", &["patterned"]),
    ("print", &["patterned"]),
    ("printed", &["patterned"]),
    ("graphic", &["patterned"]),
    ("busy", &["patterned"]),
    ("rugged", &["textured"]),
    ("rough", &["textured"]),
    ("tweed", &["textured", "knit"]),
];

/// Score every record against `query` and return them sorted by descending
/// score; ties keep index order (stable sort). `limit` truncates the output.
pub fn rank(
    query: &str,
    records: &[ImageRecord],
    limit: Option<usize>,
) -> Result<Vec<SimilarityResult>> {
    let tokens = tokenize(query);
    if tokens.is_empty() {
        return Err(Error::EmptyQuery);
    }

    let mut results: Vec<SimilarityResult> = records
        .iter()
        .map(|record| SimilarityResult {
            similarity_score: score(&tokens, record),
            record: record.clone(),
        })
        .collect();
    results.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
    if let Some(limit) = limit {
        results.truncate(limit);
    }
    Ok(results)
}

fn tokenize(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| normalize(&t.to_lowercase()).to_string())
        .collect()
}

/// Spelling variants folded onto palette names.
fn normalize(token: &str) -> &str {
    match token {
        "grey" => "gray",
        other => other,
    }
}

fn score(tokens: &[String], record: &ImageRecord) -> f32 {
    let texture = record.visual_features.texture.texture_type.as_str();
    let dominant = &record.visual_features.colors.dominant_colors;

    let mut color_total = 0.0;
    let mut texture_total = 0.0;
    for token in tokens {
        color_total += color_match(token, dominant);
        texture_total += texture_match(token, texture);
    }

    let n = tokens.len() as f32;
    (COLOR_WEIGHT * color_total / n + TEXTURE_WEIGHT * texture_total / n).clamp(0.0, 1.0)
}

fn color_match(token: &str, dominant: &[DominantColor]) -> f32 {
    let family = COLOR_FAMILIES
        .iter()
        .find(|(t, _)| *t == token)
        .map(|(_, names)| *names)
        .unwrap_or(&[]);

    let mut best = 0.0f32;
    for color in dominant {
        let strength = if color.name == token {
            1.0
        } else if family.contains(&color.name.as_str()) {
            SYNONYM_STRENGTH
        } else {
            continue;
        };
        best = best.max(strength * (0.5 + 0.5 * color.fraction.clamp(0.0, 1.0)));
    }
    best
}

fn texture_match(token: &str, texture: &str) -> f32 {
    if token == texture {
        return 1.0;
    }
    let implied = STYLE_VOCABULARY
        .iter()
        .find(|(t, _)| *t == token)
        .map(|(_, labels)| *labels)
        .unwrap_or(&[]);
    if implied.contains(&texture) { SYNONYM_STRENGTH } else { 0.0 }
}
