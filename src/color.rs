use image::RgbImage;
use rayon::prelude::*;

use crate::record::DominantColor;

/// Fixed reference palette. Declaration order is the tie-break for
/// `rgb_to_color_name`, so append-only edits keep old caches comparable.
pub const PALETTE: &[(&str, [u8; 3])] = &[
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("blue", [0, 0, 255]),
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("gray", [128, 128, 128]),
    ("yellow", [255, 255, 0]),
    ("orange", [255, 165, 0]),
    ("pink", [255, 192, 203]),
    ("purple", [128, 0, 128]),
    ("brown", [139, 69, 19]),
    ("navy", [0, 0, 128]),
    ("beige", [245, 245, 220]),
    ("teal", [0, 128, 128]),
    ("maroon", [128, 0, 0]),
    ("olive", [128, 128, 0]),
];

/// Upper bound on the dominant-color sequence length per image.
pub const MAX_DOMINANT_COLORS: usize = 5;

/// Pixel sample budget for clustering; larger images are strided down to it.
const MAX_SAMPLES: usize = 4096;

const KMEANS_MAX_ITER: usize = 20;

/// Name of the palette entry nearest to `rgb` by squared Euclidean distance.
/// Pure and deterministic; ties resolve to the earlier palette entry.
pub fn rgb_to_color_name(rgb: [u8; 3]) -> &'static str {
    let mut best = PALETTE[0].0;
    let mut best_dist = u32::MAX;
    for (name, reference) in PALETTE {
        let dist = dist2(rgb, *reference);
        if dist < best_dist {
            best_dist = dist;
            best = name;
        }
    }
    best
}

fn dist2(a: [u8; 3], b: [u8; 3]) -> u32 {
    (0..3).map(|i| (a[i] as i32 - b[i] as i32).pow(2) as u32).sum()
}

/// Cluster the image's pixels and return named dominant colors sorted by
/// descending prominence. Fractions are each in [0, 1] and sum to at most 1;
/// at most `MAX_DOMINANT_COLORS` entries are returned.
pub fn extract_dominant_colors(image: &RgbImage) -> Vec<DominantColor> {
    let total = (image.width() * image.height()) as usize;
    if total == 0 {
        return vec![];
    }
    let stride = (total.div_ceil(MAX_SAMPLES)).max(1);
    let samples: Vec<[f32; 3]> = image
        .pixels()
        .step_by(stride)
        .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
        .collect();

    let k = MAX_DOMINANT_COLORS.min(samples.len());
    // Deterministic init: evenly spaced samples, so repeated extraction of the
    // same image yields the same record.
    let mut centroids: Vec<[f32; 3]> = (0..k).map(|i| samples[i * samples.len() / k]).collect();

    let mut assignments = vec![0usize; samples.len()];
    let mut distsum = f32::MAX;
    for _ in 0..KMEANS_MAX_ITER {
        let (new_assignments, new_distsum) = update_assignments(&samples, &centroids);
        // converged once the total distance stops shrinking
        if new_distsum >= distsum {
            break;
        }
        assignments = new_assignments;
        distsum = new_distsum;
        centroids = (0..k)
            .map(|cluster| update_centroid(&samples, &assignments, &centroids, cluster))
            .collect();
    }

    let mut counts = vec![0usize; k];
    for &a in &assignments {
        counts[a] += 1;
    }

    let total = samples.len() as f32;
    let mut entries: Vec<DominantColor> = Vec::with_capacity(k);
    for (cluster, centroid) in centroids.iter().enumerate() {
        if counts[cluster] == 0 {
            continue;
        }
        let rgb = [
            centroid[0].round().clamp(0.0, 255.0) as u8,
            centroid[1].round().clamp(0.0, 255.0) as u8,
            centroid[2].round().clamp(0.0, 255.0) as u8,
        ];
        let name = rgb_to_color_name(rgb);
        let fraction = counts[cluster] as f32 / total;
        // clusters mapping to the same name collapse into one entry
        match entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.fraction += fraction,
            None => entries.push(DominantColor { name: name.to_string(), rgb, fraction }),
        }
    }

    entries.sort_by(|a, b| b.fraction.total_cmp(&a.fraction));
    entries.truncate(MAX_DOMINANT_COLORS);
    entries
}

/// Assign every sample to its nearest centroid; returns assignments and the
/// summed distance.
fn update_assignments(samples: &[[f32; 3]], centroids: &[[f32; 3]]) -> (Vec<usize>, f32) {
    let (assignments, distances): (Vec<_>, Vec<_>) = samples
        .par_iter()
        .map(|point| {
            let mut min_distance = f32::MAX;
            let mut best_cluster = 0;
            for (j, centroid) in centroids.iter().enumerate() {
                let distance: f32 = (0..3).map(|i| (point[i] - centroid[i]).powi(2)).sum();
                if distance < min_distance {
                    min_distance = distance;
                    best_cluster = j;
                }
            }
            (best_cluster, min_distance)
        })
        .unzip();
    let distance = distances.iter().sum();
    (assignments, distance)
}

/// Mean of the samples assigned to `cluster`; empty clusters keep their old
/// centroid.
fn update_centroid(
    samples: &[[f32; 3]],
    assignments: &[usize],
    centroids: &[[f32; 3]],
    cluster: usize,
) -> [f32; 3] {
    let mut acc = [0.0f64; 3];
    let mut count = 0usize;
    for (point, &assignment) in samples.iter().zip(assignments) {
        if assignment == cluster {
            for i in 0..3 {
                acc[i] += point[i] as f64;
            }
            count += 1;
        }
    }
    if count == 0 {
        return centroids[cluster];
    }
    [
        (acc[0] / count as f64) as f32,
        (acc[1] / count as f64) as f32,
        (acc[2] / count as f64) as f32,
    ]
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn palette_references_map_to_themselves() {
        for (name, rgb) in PALETTE {
            assert_eq!(rgb_to_color_name(*rgb), *name);
        }
    }

    #[test]
    fn near_reference_maps_to_reference() {
        assert_eq!(rgb_to_color_name([250, 5, 5]), "red");
        assert_eq!(rgb_to_color_name([10, 10, 240]), "blue");
        assert_eq!(rgb_to_color_name([250, 250, 250]), "white");
    }

    #[test]
    fn uniform_image_is_one_color() {
        let img = RgbImage::from_pixel(32, 32, Rgb([0, 0, 255]));
        let colors = extract_dominant_colors(&img);
        assert_eq!(colors.len(), 1);
        assert_eq!(colors[0].name, "blue");
        assert!((colors[0].fraction - 1.0).abs() < 1e-6);
    }

    #[test]
    fn two_tone_image_splits_evenly() {
        let img = RgbImage::from_fn(32, 32, |x, _| {
            if x < 16 { Rgb([255, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let colors = extract_dominant_colors(&img);
        let names: Vec<_> = colors.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"red"));
        assert!(names.contains(&"white"));
        for c in &colors {
            assert!((0.3..=0.7).contains(&c.fraction));
        }
    }

    #[test]
    fn fractions_bounded_and_sorted() {
        let img = RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
        });
        let colors = extract_dominant_colors(&img);
        assert!(colors.len() <= MAX_DOMINANT_COLORS);
        let sum: f32 = colors.iter().map(|c| c.fraction).sum();
        assert!(sum <= 1.0 + 1e-6);
        for pair in colors.windows(2) {
            assert!(pair[0].fraction >= pair[1].fraction);
        }
        for c in &colors {
            assert!((0.0..=1.0).contains(&c.fraction));
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let img = RgbImage::from_fn(48, 48, |x, y| {
            Rgb([(x * 5) as u8, (y * 3) as u8, (x + y) as u8])
        });
        assert_eq!(extract_dominant_colors(&img), extract_dominant_colors(&img));
    }

    #[test]
    fn empty_image_yields_nothing() {
        let img = RgbImage::new(0, 0);
        assert!(extract_dominant_colors(&img).is_empty());
    }
}
