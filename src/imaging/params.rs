//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are built
//! from [`AppConfig`](crate::config::AppConfig) at the boundary and handed to
//! the transforms, which keeps the transforms free of any config plumbing.
//!
//! ## Types
//!
//! - [`PaletteParams`]: cluster count, working resolution, restarts, seed.
//! - [`PixelArtParams`]: block size, palette size, k-means stopping criteria, optional seed.
//! - [`FilmParams`]: tone/warmth factors, grain, vignette floor, stamp color, optional seed and date.

use chrono::NaiveDate;

/// Dominant-color extraction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteParams {
    pub colors: usize,
    /// Images are resized to `working_size × working_size` before clustering.
    pub working_size: u32,
    pub restarts: usize,
    pub seed: u64,
}

impl Default for PaletteParams {
    fn default() -> Self {
        Self {
            colors: 5,
            working_size: 150,
            restarts: 10,
            seed: 42,
        }
    }
}

/// Pixel-art quantization settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelArtParams {
    pub cell_size: u32,
    pub palette_size: usize,
    pub restarts: usize,
    pub max_iterations: usize,
    pub epsilon: f32,
    /// `None` draws fresh entropy on every call.
    pub seed: Option<u64>,
}

impl Default for PixelArtParams {
    fn default() -> Self {
        Self {
            cell_size: 8,
            palette_size: 16,
            restarts: 10,
            max_iterations: 20,
            epsilon: 1.0,
            seed: None,
        }
    }
}

/// Y2K film emulation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilmParams {
    /// Multiplier on the HSV saturation channel.
    pub saturation: f32,
    /// Multiplier on the HSV value channel.
    pub value: f32,
    /// Per-channel multipliers `[r, g, b]` for the warm cast.
    pub warmth: [f32; 3],
    /// Standard deviation of the additive Gaussian grain.
    pub grain_sigma: f32,
    /// Brightness factor at the far corners; the center stays at 1.0.
    pub vignette_floor: f32,
    pub stamp_color: [u8; 3],
    /// `None` draws fresh grain on every call.
    pub grain_seed: Option<u64>,
    /// Date printed in the stamp. `None` uses today's local date.
    pub date: Option<NaiveDate>,
}

impl Default for FilmParams {
    fn default() -> Self {
        Self {
            saturation: 1.2,
            value: 0.95,
            warmth: [1.10, 1.02, 0.90],
            grain_sigma: 12.0,
            vignette_floor: 0.4,
            stamp_color: [255, 140, 0],
            grain_seed: None,
            date: None,
        }
    }
}
