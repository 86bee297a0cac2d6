//! Codec adapter: raw bytes ⇄ [`RasterImage`] ⇄ base64 text.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP, GIF) | `image::load_from_memory` (format sniffed from magic bytes) |
//! | Decode (HEIC/HEIF) | `libheif-rs`, only with the `heic` feature |
//! | Encode | `image::DynamicImage::write_to`, lossless containers only |
//! | Base64 | `base64` standard alphabet with padding |
//!
//! HEIF is never sniffed. Its ISO-BMFF container can look like other formats,
//! so the HEIF path is taken only when the filename or the declared content
//! type says so. Everything else goes through the `image` crate.

use super::error::{ImagingError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::LazyLock;

/// Decoded three-channel RGB raster, 8 bits per channel.
///
/// Channel order is RGB everywhere in this crate.
pub type RasterImage = RgbImage;

/// Extensions whose decoders are compiled in.
const RASTER_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("bmp", ImageFormat::Bmp),
    ("gif", ImageFormat::Gif),
];

const HEIF_EXTENSIONS: &[&str] = &["heic", "heif"];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut exts: Vec<&'static str> = RASTER_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect();
    if heif_supported() {
        exts.extend_from_slice(HEIF_EXTENSIONS);
    }
    exts
});

/// Returns the set of input file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether this build can decode HEIC/HEIF photos.
pub fn heif_supported() -> bool {
    cfg!(feature = "heic")
}

/// What the caller told us about the bytes, used only to pick a decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceHint<'a> {
    pub filename: Option<&'a str>,
    pub content_type: Option<&'a str>,
}

impl<'a> SourceHint<'a> {
    pub fn new(filename: Option<&'a str>, content_type: Option<&'a str>) -> Self {
        Self {
            filename,
            content_type,
        }
    }

    /// `true` when the filename extension or content type declares HEIC/HEIF.
    pub fn is_heif(&self) -> bool {
        let by_name = self
            .filename
            .and_then(|name| name.rsplit_once('.'))
            .is_some_and(|(_, ext)| {
                HEIF_EXTENSIONS
                    .iter()
                    .any(|heif| ext.eq_ignore_ascii_case(heif))
            });
        let by_type = self.content_type.is_some_and(|ct| {
            let ct = ct.trim().to_ascii_lowercase();
            ct.starts_with("image/heic") || ct.starts_with("image/heif")
        });
        by_name || by_type
    }
}

/// Lossless output containers. Lossy formats would smear pixel-art edges and grain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Tiff,
    Bmp,
}

impl OutputFormat {
    /// Parse a format name or extension (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "tif" | "tiff" => Ok(Self::Tiff),
            "bmp" => Ok(Self::Bmp),
            other => Err(ImagingError::UnsupportedFormat(format!(
                "output format '{other}' (expected png, tiff or bmp)"
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Tiff => ImageFormat::Tiff,
            Self::Bmp => ImageFormat::Bmp,
        }
    }
}

/// Decode an uploaded byte buffer into an RGB raster.
///
/// Alpha is dropped and higher bit depths are reduced to 8 bits per channel.
pub fn decode(bytes: &[u8], hint: &SourceHint<'_>) -> Result<RasterImage> {
    if bytes.is_empty() {
        return Err(ImagingError::Decode("input is empty".into()));
    }
    if hint.is_heif() {
        return decode_heif(bytes);
    }
    let img = image::load_from_memory(bytes).map_err(|e| ImagingError::Decode(e.to_string()))?;
    Ok(img.to_rgb8())
}

#[cfg(feature = "heic")]
fn decode_heif(bytes: &[u8]) -> Result<RasterImage> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(bytes)
        .map_err(|e| ImagingError::Decode(format!("HEIF container: {e}")))?;
    let handle = ctx
        .primary_image_handle()
        .map_err(|e| ImagingError::Decode(format!("HEIF primary image: {e}")))?;
    let image = lib
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| ImagingError::Decode(format!("HEIF decode: {e}")))?;
    let plane = image
        .planes()
        .interleaved
        .ok_or_else(|| ImagingError::Decode("HEIF image has no interleaved RGB plane".into()))?;

    // libheif pads rows; copy only the visible pixels of each stride.
    let row_bytes = plane.width as usize * 3;
    let mut pixels = Vec::with_capacity(row_bytes * plane.height as usize);
    for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
        let visible = row
            .get(..row_bytes)
            .ok_or_else(|| ImagingError::Decode("HEIF row shorter than its width".into()))?;
        pixels.extend_from_slice(visible);
    }
    RgbImage::from_raw(plane.width, plane.height, pixels)
        .ok_or_else(|| ImagingError::Decode("HEIF plane size mismatch".into()))
}

#[cfg(not(feature = "heic"))]
fn decode_heif(_bytes: &[u8]) -> Result<RasterImage> {
    Err(ImagingError::UnsupportedFormat(
        "HEIC/HEIF decoding is not available in this build (enable the `heic` feature)".into(),
    ))
}

/// Encode a raster into the given lossless container.
pub fn encode(image: &RasterImage, format: OutputFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), format.image_format())
        .map_err(|e| {
            ImagingError::Processing(format!("{} encode failed: {e}", format.extension()))
        })?;
    Ok(buf)
}

pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn from_base64(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| ImagingError::Decode(format!("invalid base64: {e}")))
}
