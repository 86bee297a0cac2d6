//! Dominant-color extraction.
//!
//! The image is resized to a fixed square working resolution (150×150 by
//! default, linear filter) so clustering cost does not depend on the upload
//! size, then k-means++ (Hamerly engine) with a fixed seed and several
//! restarts groups the pixels. Each cluster becomes one [`ColorSwatch`].

use super::calculations::percentages_one_decimal;
use super::cluster::{Engine, KMeans, Sample};
use super::codec::RasterImage;
use super::error::{ImagingError, Result, ensure_non_empty};
use super::params::PaletteParams;
use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};

/// One dominant color and its share of the sampled pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSwatch {
    /// Lowercase `#rrggbb`.
    pub hex: String,
    pub rgb: [u8; 3],
    /// 0–100 with one decimal place.
    pub percentage: f64,
}

impl ColorSwatch {
    pub fn new(rgb: [u8; 3], percentage: f64) -> Self {
        Self {
            hex: format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2]),
            rgb,
            percentage,
        }
    }
}

/// Swatches ordered by descending percentage; length equals the requested color count.
pub type Palette = Vec<ColorSwatch>;

const MAX_ITERATIONS: usize = 300;
const EPSILON: f32 = 1e-4;

/// Extract `params.colors` dominant colors from `image`.
///
/// Deterministic for a given image and seed. Percentages always sum to 100.0;
/// clusters that receive no pixels (near-uniform images) are still reported,
/// with 0.0%.
pub fn extract_palette(image: &RasterImage, params: &PaletteParams) -> Result<Palette> {
    ensure_non_empty(image.width(), image.height())?;
    if params.colors == 0 {
        return Err(ImagingError::Processing("palette needs at least one color".into()));
    }
    if params.working_size == 0 {
        return Err(ImagingError::Processing("working size must be positive".into()));
    }

    let small = imageops::resize(
        image,
        params.working_size,
        params.working_size,
        FilterType::Triangle,
    );
    let samples: Vec<Sample> = small.pixels().map(|p| p.0).collect();

    let kmeans = KMeans {
        k: params.colors,
        max_iterations: MAX_ITERATIONS,
        epsilon: EPSILON,
        restarts: params.restarts,
        engine: Engine::Hamerly,
    };
    let clustering = kmeans.fit(&samples, params.seed)?;

    let percentages = percentages_one_decimal(&clustering.counts());
    let mut palette: Palette = clustering
        .centroids
        .iter()
        .zip(percentages)
        .map(|(&rgb, pct)| ColorSwatch::new(rgb, pct))
        .collect();
    palette.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    Ok(palette)
}
