//! Date-stamp overlay for the film filter.
//!
//! Fonts are resolved once at startup from an ordered list of candidate
//! files. The first one that loads wins; when none does, a built-in 5×7
//! bitmap font takes over, so the stamp always renders whatever fonts the
//! host has installed.

use super::calculations::{stamp_font_size, stamp_margin, stamp_origin};
use super::codec::RasterImage;
use ab_glyph::{FontVec, PxScale};
use chrono::NaiveDate;
use image::Rgb;
use imageproc::drawing::{draw_text_mut, text_size};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// System fonts tried when the config does not list any.
pub const DEFAULT_FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/Helvetica.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "C:\\Windows\\Fonts\\consolab.ttf",
];

/// Font used to draw the date stamp.
pub enum StampFont {
    TrueType { font: FontVec, source: PathBuf },
    Builtin,
}

impl fmt::Debug for StampFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TrueType { source, .. } => write!(f, "TrueType({})", source.display()),
            Self::Builtin => write!(f, "Builtin"),
        }
    }
}

impl StampFont {
    pub fn builtin() -> Self {
        Self::Builtin
    }

    /// Load the first candidate that parses as a font, else the built-in font.
    pub fn resolve<P: AsRef<Path>>(candidates: &[P]) -> Self {
        for candidate in candidates {
            let path = candidate.as_ref();
            match load_font(path) {
                Ok(font) => {
                    info!("Stamp font: {}", path.display());
                    return Self::TrueType {
                        font,
                        source: path.to_path_buf(),
                    };
                }
                Err(reason) => debug!("Skipping font {}: {}", path.display(), reason),
            }
        }
        info!("Stamp font: built-in bitmap (no candidate font could be loaded)");
        Self::Builtin
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }
}

fn load_font(path: &Path) -> Result<FontVec, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    let is_collection = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttc"));
    let font = if is_collection {
        FontVec::try_from_vec_and_index(bytes, 0)
    } else {
        FontVec::try_from_vec(bytes)
    };
    font.map_err(|e| e.to_string())
}

/// `'yy mm dd`, e.g. `'25 01 15`.
pub fn stamp_text(date: NaiveDate) -> String {
    date.format("'%y %m %d").to_string()
}

/// Draw the date near the bottom-right corner, sized and inset relative to the image.
pub fn draw_date_stamp(image: &mut RasterImage, font: &StampFont, date: NaiveDate, color: [u8; 3]) {
    let dims = image.dimensions();
    let text = stamp_text(date);
    let size = stamp_font_size(dims);
    let margin = stamp_margin(dims);

    match font {
        StampFont::TrueType { font, .. } => {
            let scale = PxScale::from(size);
            let (x, y) = stamp_origin(dims, text_size(scale, font, &text), margin);
            draw_text_mut(image, Rgb(color), x, y, scale, font, &text);
        }
        StampFont::Builtin => {
            let unit = builtin_unit(size);
            let (x, y) = stamp_origin(dims, builtin_text_size(unit, &text), margin);
            draw_builtin_text(image, Rgb(color), x, y, unit, &text);
        }
    }
}

// =============================================================================
// Built-in bitmap font
// =============================================================================

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;
const ADVANCE: u32 = GLYPH_W + 1;

/// Rows top to bottom, bit 4 is the leftmost column.
fn glyph(c: char) -> [u8; 7] {
    match c {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '\'' => [0x04, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        _ => [0; 7],
    }
}

/// Edge length of one bitmap cell so the glyph height tracks the font size.
fn builtin_unit(size: f32) -> u32 {
    ((size / GLYPH_H as f32).floor() as u32).max(1)
}

fn builtin_text_size(unit: u32, text: &str) -> (u32, u32) {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return (0, 0);
    }
    ((chars * ADVANCE - 1) * unit, GLYPH_H * unit)
}

/// Paint `text` with its top-left at `(x, y)`; cells outside the image are skipped.
fn draw_builtin_text(image: &mut RasterImage, color: Rgb<u8>, x: i32, y: i32, unit: u32, text: &str) {
    let (width, height) = (image.width() as i64, image.height() as i64);
    let unit = unit as i64;
    for (i, c) in text.chars().enumerate() {
        let left = x as i64 + i as i64 * ADVANCE as i64 * unit;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_W as i64 {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                let cell_x = left + col * unit;
                let cell_y = y as i64 + row as i64 * unit;
                for py in cell_y.max(0)..(cell_y + unit).min(height) {
                    for px in cell_x.max(0)..(cell_x + unit).min(width) {
                        image.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}
