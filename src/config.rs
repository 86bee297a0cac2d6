//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `emo-check.toml`. Stock defaults
//! are serialised to a TOML table and the user file is merged over them key
//! by key, so a config file only needs the values it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [palette]
//! colors = 5                # Dominant colors to report
//! working_size = 150        # Square edge the image is reduced to first
//! restarts = 10             # k-means restarts, lowest score wins
//! seed = 42                 # Fixed so identical images give identical palettes
//!
//! [pixel_art]
//! cell_size = 8             # Source pixels per art pixel
//! palette_size = 16         # Maximum distinct colors
//! restarts = 10
//! max_iterations = 20
//! epsilon = 1.0             # Stop when the centroids move less than this
//! # seed = 7                # Unset = different initialisation every run
//!
//! [film]
//! saturation = 1.2
//! value = 0.95
//! warmth = [1.10, 1.02, 0.90]  # R, G, B multipliers
//! grain_sigma = 12.0
//! vignette_floor = 0.4      # Brightness factor at the far corners
//! stamp_color = [255, 140, 0]
//! font_candidates = [...]   # Tried in order, built-in bitmap font if none load
//! # grain_seed = 7
//!
//! [limits]
//! # max_pixels = 40000000   # Reject larger uploads at the service boundary
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::stamp::DEFAULT_FONT_CANDIDATES;
use crate::imaging::{FilmParams, PaletteParams, PixelArtParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "emo-check.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `emo-check.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Dominant-color extraction.
    pub palette: PaletteConfig,
    /// Pixel-art quantizer.
    pub pixel_art: PixelArtConfig,
    /// Y2K film filter and date stamp.
    pub film: FilmConfig,
    /// Guards applied at the service boundary.
    pub limits: LimitsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.palette;
        if !(1..=256).contains(&p.colors) {
            return invalid("palette.colors must be between 1 and 256");
        }
        if p.working_size == 0 {
            return invalid("palette.working_size must be at least 1");
        }
        if p.restarts == 0 {
            return invalid("palette.restarts must be at least 1");
        }

        let px = &self.pixel_art;
        if px.cell_size == 0 {
            return invalid("pixel_art.cell_size must be at least 1");
        }
        if !(1..=256).contains(&px.palette_size) {
            return invalid("pixel_art.palette_size must be between 1 and 256");
        }
        if px.restarts == 0 || px.max_iterations == 0 {
            return invalid("pixel_art.restarts and pixel_art.max_iterations must be at least 1");
        }
        if !(px.epsilon.is_finite() && px.epsilon >= 0.0) {
            return invalid("pixel_art.epsilon must be a non-negative number");
        }

        let f = &self.film;
        let factors = [f.saturation, f.value, f.warmth[0], f.warmth[1], f.warmth[2]];
        if factors.iter().any(|v| !(v.is_finite() && *v >= 0.0)) {
            return invalid("film.saturation, film.value and film.warmth must be non-negative");
        }
        if !(f.grain_sigma.is_finite() && f.grain_sigma >= 0.0) {
            return invalid("film.grain_sigma must be a non-negative number");
        }
        if !(0.0..=1.0).contains(&f.vignette_floor) {
            return invalid("film.vignette_floor must be 0.0-1.0");
        }

        if self.limits.max_pixels == Some(0) {
            return invalid("limits.max_pixels must be positive when set");
        }
        Ok(())
    }
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Validation(message.into()))
}

/// Dominant-color extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaletteConfig {
    pub colors: usize,
    pub working_size: u32,
    pub restarts: usize,
    pub seed: u64,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        let params = PaletteParams::default();
        Self {
            colors: params.colors,
            working_size: params.working_size,
            restarts: params.restarts,
            seed: params.seed,
        }
    }
}

impl PaletteConfig {
    pub fn to_params(&self) -> PaletteParams {
        PaletteParams {
            colors: self.colors,
            working_size: self.working_size,
            restarts: self.restarts,
            seed: self.seed,
        }
    }
}

/// Pixel-art quantizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PixelArtConfig {
    pub cell_size: u32,
    pub palette_size: usize,
    pub restarts: usize,
    pub max_iterations: usize,
    pub epsilon: f64,
    /// When absent, every run picks fresh initial centers.
    pub seed: Option<u64>,
}

impl Default for PixelArtConfig {
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

impl PixelArtConfig {
    pub fn to_params(&self) -> PixelArtParams {
        PixelArtParams {
            cell_size: self.cell_size,
            palette_size: self.palette_size,
            restarts: self.restarts,
            max_iterations: self.max_iterations,
            epsilon: self.epsilon as f32,
            seed: self.seed,
        }
    }
}

/// Y2K film filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilmConfig {
    pub saturation: f64,
    pub value: f64,
    /// Per-channel multipliers in R, G, B order.
    pub warmth: [f64; 3],
    pub grain_sigma: f64,
    pub vignette_floor: f64,
    pub stamp_color: [u8; 3],
    /// Font files tried in order for the date stamp.
    pub font_candidates: Vec<String>,
    pub grain_seed: Option<u64>,
}

impl Default for FilmConfig {
    fn default() -> Self {
        Self {
            saturation: 1.2,
            value: 0.95,
            warmth: [1.10, 1.02, 0.90],
            grain_sigma: 12.0,
            vignette_floor: 0.4,
            stamp_color: [255, 140, 0],
            font_candidates: DEFAULT_FONT_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            grain_seed: None,
        }
    }
}

impl FilmConfig {
    /// Film parameters; the stamp date is left unset so it resolves to today.
    pub fn to_params(&self) -> FilmParams {
        FilmParams {
            saturation: self.saturation as f32,
            value: self.value as f32,
            warmth: self.warmth.map(|w| w as f32),
            grain_sigma: self.grain_sigma as f32,
            vignette_floor: self.vignette_floor as f32,
            stamp_color: self.stamp_color,
            grain_seed: self.grain_seed,
            date: None,
        }
    }
}

/// Boundary guards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Largest accepted `width × height` after decoding. Unset = unlimited.
    pub max_pixels: Option<u64>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value; `Ok(None)` when it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path` over the stock defaults.
///
/// A missing file yields the defaults. Unknown keys and out-of-range values
/// are errors.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Emo-Check Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Dominant colors
# ---------------------------------------------------------------------------
[palette]
# Number of colors reported per image.
colors = 5

# The image is reduced to working_size x working_size before clustering.
working_size = 150

# k-means restarts; the run with the lowest score wins.
restarts = 10

# Fixed seed so the same image always yields the same palette.
seed = 42

# ---------------------------------------------------------------------------
# Pixel art
# ---------------------------------------------------------------------------
[pixel_art]
# Edge length in source pixels of one art pixel.
cell_size = 8

# Maximum number of distinct colors in the result.
palette_size = 16

restarts = 10
max_iterations = 20

# Clustering stops once the centers together move less than this (RGB units).
epsilon = 1.0

# Fix the seed for reproducible output. Unset = random per run.
# seed = 7

# ---------------------------------------------------------------------------
# Y2K film
# ---------------------------------------------------------------------------
[film]
# HSV saturation and value multipliers.
saturation = 1.2
value = 0.95

# Warm color cast as [R, G, B] multipliers.
warmth = [1.10, 1.02, 0.90]

# Standard deviation of the per-channel film grain.
grain_sigma = 12.0

# Brightness factor at the corners; the center is always 1.0.
vignette_floor = 0.4

# Date stamp color as [R, G, B].
stamp_color = [255, 140, 0]

# Fonts tried in order for the date stamp. When none loads, a built-in
# bitmap font is used.
font_candidates = [
    "/System/Library/Fonts/Helvetica.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    'C:\Windows\Fonts\consolab.ttf',
]

# Fix the grain seed for reproducible output. Unset = random per run.
# grain_seed = 7

# ---------------------------------------------------------------------------
# Limits
# ---------------------------------------------------------------------------
[limits]
# Largest accepted width x height after decoding. Unset = unlimited.
# max_pixels = 40000000

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
