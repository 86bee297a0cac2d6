//! Pixel-art quantization.
//!
//! ```text
//! full image ──linear──▶ W/cell × H/cell ──k-means──▶ ≤ palette_size colors ──nearest──▶ full size
//! ```
//!
//! The final upscale must be nearest-neighbour. Any smoothing filter would
//! blend neighbouring blocks and the hard edges that make the look would be lost.

use super::calculations::reduced_dimensions;
use super::cluster::{Engine, KMeans, Sample};
use super::codec::RasterImage;
use super::error::{ImagingError, Result, ensure_non_empty};
use super::params::PixelArtParams;
use super::rng_from_seed;
use image::Rgb;
use image::imageops::{self, FilterType};
use rand::Rng;

/// Render `image` as blocky low-color pixel art at its original size.
///
/// With `params.seed == None` the cluster initialisation differs per call, so
/// exact colors may vary between runs; block structure and dimensions do not.
pub fn apply_pixel_art(image: &RasterImage, params: &PixelArtParams) -> Result<RasterImage> {
    let (width, height) = image.dimensions();
    ensure_non_empty(width, height)?;
    if params.cell_size == 0 {
        return Err(ImagingError::Processing("cell size must be positive".into()));
    }
    if params.palette_size == 0 {
        return Err(ImagingError::Processing("palette size must be positive".into()));
    }

    let (small_w, small_h) = reduced_dimensions((width, height), params.cell_size);
    let small = imageops::resize(image, small_w, small_h, FilterType::Triangle);

    let samples: Vec<Sample> = small.pixels().map(|p| p.0).collect();
    let kmeans = KMeans {
        k: params.palette_size.min(samples.len()),
        max_iterations: params.max_iterations,
        epsilon: params.epsilon,
        restarts: params.restarts,
        engine: Engine::Lloyd,
    };
    let base_seed: u64 = rng_from_seed(params.seed).random();
    let clustering = kmeans.fit(&samples, base_seed)?;

    let quantized = RasterImage::from_fn(small_w, small_h, |x, y| {
        let label = clustering.labels[(y * small_w + x) as usize];
        Rgb(clustering.centroids[label])
    });

    Ok(upscale_nearest(&quantized, width, height))
}

/// Nearest-neighbour resize: destination `(x, y)` copies source
/// `(⌊x·sw/dw⌋, ⌊y·sh/dh⌋)`, so integer scale factors give exact square blocks.
/// An empty source yields a black canvas.
fn upscale_nearest(src: &RasterImage, width: u32, height: u32) -> RasterImage {
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 {
        return RasterImage::new(width, height);
    }
    let map = |d: u32, s: u32, dst: u32| ((d as u64 * s as u64 / dst as u64) as u32).min(s - 1);
    RasterImage::from_fn(width, height, |x, y| {
        *src.get_pixel(map(x, sw, width), map(y, sh, height))
    })
}
