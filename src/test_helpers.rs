//! Synthetic images shared by the unit tests.
//!
//! Every builder is deterministic, so tests can assert on exact pixels
//! without shipping fixture files.

use crate::imaging::RasterImage;
use image::Rgb;

/// Every pixel the same color.
pub fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> RasterImage {
    RasterImage::from_pixel(width, height, Rgb(rgb))
}

/// Left half `left`, right half `right`.
pub fn split_image(width: u32, height: u32, left: [u8; 3], right: [u8; 3]) -> RasterImage {
    RasterImage::from_fn(width, height, |x, _| {
        if x < width / 2 { Rgb(left) } else { Rgb(right) }
    })
}

/// Red ramps left→right, green ramps top→bottom, blue is constant.
pub fn gradient_image(width: u32, height: u32) -> RasterImage {
    RasterImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            96,
        ])
    })
}

/// Mean of all channels over a `size × size` square whose top-left is `(x0, y0)`.
pub fn mean_brightness(img: &RasterImage, x0: u32, y0: u32, size: u32) -> f64 {
    let mut sum = 0u64;
    let mut n = 0u64;
    for y in y0..(y0 + size).min(img.height()) {
        for x in x0..(x0 + size).min(img.width()) {
            let p = img.get_pixel(x, y);
            sum += p[0] as u64 + p[1] as u64 + p[2] as u64;
            n += 3;
        }
    }
    sum as f64 / n.max(1) as f64
}

/// Number of distinct RGB triples in the image.
pub fn distinct_colors(img: &RasterImage) -> usize {
    let mut seen: Vec<[u8; 3]> = img.pixels().map(|p| p.0).collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}
