//! Y2K film emulation.
//!
//! Five stages, each consuming the previous stage's output:
//!
//! | # | Stage | Function |
//! |---|---|---|
//! | 1 | saturation ×1.2, value ×0.95 in 8-bit HSV | [`shift_saturation_value`] |
//! | 2 | warm cast r×1.10 g×1.02 b×0.90 | [`warm_cast`] |
//! | 3 | Gaussian grain, σ = 12 | [`add_grain`] |
//! | 4 | separable Gaussian vignette, corners toward 40% | [`vignette`] |
//! | 5 | orange `'yy mm dd` stamp, bottom right | [`stamp::draw_date_stamp`] |
//!
//! Every channel is clamped to 0–255 after each stage, so no stage can wrap.
//! Grain is random unless [`FilmParams::grain_seed`] is set.

use super::calculations::gaussian_kernel;
use super::codec::RasterImage;
use super::error::{ImagingError, Result, ensure_non_empty};
use super::params::FilmParams;
use super::rng_from_seed;
use super::stamp::{self, StampFont};
use image::Rgb;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Run the whole film pipeline on `image`.
pub fn apply_y2k_film(
    image: &RasterImage,
    params: &FilmParams,
    font: &StampFont,
) -> Result<RasterImage> {
    ensure_non_empty(image.width(), image.height())?;

    let toned = shift_saturation_value(image, params.saturation, params.value);
    let warmed = warm_cast(&toned, params.warmth);
    let mut rng = rng_from_seed(params.grain_seed);
    let grainy = add_grain(&warmed, params.grain_sigma, &mut rng)?;
    let mut out = vignette(&grainy, params.vignette_floor);

    let date = params
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    stamp::draw_date_stamp(&mut out, font, date, params.stamp_color);
    Ok(out)
}

fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Scale saturation and value in 8-bit HSV space, clamping both to 0–255.
pub fn shift_saturation_value(image: &RasterImage, saturation: f32, value: f32) -> RasterImage {
    RasterImage::from_fn(image.width(), image.height(), |x, y| {
        let [h, s, v] = rgb_to_hsv8(image.get_pixel(x, y).0);
        let s = clamp_u8(s as f32 * saturation);
        let v = clamp_u8(v as f32 * value);
        Rgb(hsv8_to_rgb([h, s, v]))
    })
}

/// Multiply each channel by its factor (`[r, g, b]`), clamping to 0–255.
pub fn warm_cast(image: &RasterImage, factors: [f32; 3]) -> RasterImage {
    RasterImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y).0;
        Rgb(std::array::from_fn(|ch| clamp_u8(p[ch] as f32 * factors[ch])))
    })
}

/// Add independent zero-mean Gaussian noise to every channel of every pixel.
pub fn add_grain<R: Rng>(image: &RasterImage, sigma: f32, rng: &mut R) -> Result<RasterImage> {
    if !(sigma.is_finite() && sigma >= 0.0) {
        return Err(ImagingError::Processing(format!(
            "grain sigma must be finite and non-negative, got {sigma}"
        )));
    }
    let normal = Normal::new(0.0f32, sigma)
        .map_err(|e| ImagingError::Processing(format!("grain sigma {sigma}: {e}")))?;
    let mut out = image.clone();
    for channel in out.iter_mut() {
        *channel = clamp_u8(*channel as f32 + normal.sample(rng));
    }
    Ok(out)
}

/// Darken toward the edges by `floor + (1 - floor) × mask`.
///
/// The mask is the outer product of two Gaussian kernels sized to the width
/// and height, each with σ = half its length, rescaled so its peak is 1.0.
pub fn vignette(image: &RasterImage, floor: f32) -> RasterImage {
    let (width, height) = image.dimensions();
    let kx = gaussian_kernel(width as usize, width as f64 * 0.5);
    let ky = gaussian_kernel(height as usize, height as f64 * 0.5);
    let peak = kx.iter().cloned().fold(0.0, f64::max) * ky.iter().cloned().fold(0.0, f64::max);
    let floor = floor as f64;

    RasterImage::from_fn(width, height, |x, y| {
        let mask = kx[x as usize] * ky[y as usize] / peak;
        let factor = (floor + (1.0 - floor) * mask) as f32;
        let p = image.get_pixel(x, y).0;
        Rgb(p.map(|c| clamp_u8(c as f32 * factor)))
    })
}

/// RGB → HSV with H in 0..180 (degrees / 2), S and V in 0..=255.
pub fn rgb_to_hsv8(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb.map(|c| c as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta * 255.0 / max } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [((h / 2.0).round() as u32 % 180) as u8, clamp_u8(s), max as u8]
}

/// Inverse of [`rgb_to_hsv8`].
pub fn hsv8_to_rgb(hsv: [u8; 3]) -> [u8; 3] {
    let h = hsv[0] as f32 * 2.0 / 60.0;
    let s = hsv[1] as f32 / 255.0;
    let v = hsv[2] as f32;

    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector as u32 % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [clamp_u8(r), clamp_u8(g), clamp_u8(b)]
}
