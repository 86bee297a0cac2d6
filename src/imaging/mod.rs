//! Image processing: pure Rust, in memory, one call per request.
//!
//! | Operation | Module / crate |
//! |---|---|
//! | **Decode / encode / base64** | [`codec`] with `image`, `libheif-rs` (feature `heic`), `base64` |
//! | **Dominant colors** | [`palette`]: linear downscale + seeded k-means++ via `kmeans_colors` |
//! | **Pixel art** | [`pixel_art`]: linear downscale, k-means, nearest upscale |
//! | **Y2K film** | [`film`]: HSV shift, warm cast, grain, vignette, [`stamp`] |
//! | **Emo score input** | [`classify`]: 224×224 normalised tensor for a [`Classifier`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry and percentages (unit testable)
//! - **Parameters**: Data structures describing each transform
//! - **Cluster**: The `kmeans_colors` wrapper shared by palette and pixel art
//! - **Transforms**: `palette`, `pixel_art`, `film`. Each returns a new image
//!   or summary and never mutates its input
//!
//! Transforms are synchronous and CPU-bound with no shared state, so callers
//! may run any number of them concurrently. None of them limits input size:
//! clustering cost grows with pixels × clusters × iterations, and bounding
//! that is the caller's job.

pub mod calculations;
pub mod classify;
mod cluster;
pub mod codec;
pub mod error;
pub mod film;
mod params;
pub mod palette;
pub mod pixel_art;
pub mod stamp;

pub use classify::{ClassProbabilities, Classifier, InputTensor, ModelKind};
pub use codec::{OutputFormat, RasterImage, SourceHint};
pub use error::ImagingError;
pub use film::apply_y2k_film;
pub use palette::{ColorSwatch, Palette, extract_palette};
pub use params::{FilmParams, PaletteParams, PixelArtParams};
pub use pixel_art::apply_pixel_art;
pub use stamp::StampFont;

use rand::SeedableRng;
use rand::rngs::StdRng;

/// Seeded RNG when a seed is given, fresh OS entropy otherwise.
pub(crate) fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
