//! Request-level operations: what a front end calls per uploaded image.
//!
//! Each operation decodes an [`Upload`], runs one or more imaging transforms
//! with parameters taken from the shared [`Toolkit`], and returns a result the
//! caller can serialise. No HTTP types appear here; a server maps
//! [`ServiceError::is_caller_error`] to its own status codes.
//!
//! ```text
//! Upload ──check──▶ decode ──limits──▶ ┬─ boost   → PNG bytes (+ base64 response)
//!                                      ├─ analyze → Palette
//!                                      └─ predict → emo score + Palette
//! ```

use crate::config::AppConfig;
use crate::imaging::classify::InputTensor;
use crate::imaging::codec;
use crate::imaging::{
    Classifier, ImagingError, ModelKind, OutputFormat, Palette, RasterImage, SourceHint, StampFont,
    apply_pixel_art, apply_y2k_film, extract_palette,
};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Not an image: {0}")]
    NotAnImage(String),
    #[error("Image too large: {width}x{height} exceeds {max} pixels")]
    TooLarge { width: u32, height: u32, max: u64 },
    #[error(transparent)]
    Imaging(#[from] ImagingError),
    #[error("{model} classifier failed: {source}")]
    Classifier {
        model: ModelKind,
        source: ImagingError,
    },
}

impl ServiceError {
    /// `true` when the upload itself is at fault; `false` for internal failures.
    pub fn is_caller_error(&self) -> bool {
        match self {
            Self::NotAnImage(_) | Self::TooLarge { .. } => true,
            Self::Imaging(e) => e.is_caller_error(),
            Self::Classifier { .. } => false,
        }
    }
}

const ACCEPTED_CONTENT_TYPES: [&str; 2] = ["image/", "application/octet-stream"];

/// Raw bytes plus whatever the client said about them.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl Upload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            ..Self::default()
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a local file, keeping its file name as the decoder hint and
    /// deriving the content type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let content_type = ImageFormat::from_path(path)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");
        let upload = Self::new(bytes).with_content_type(content_type);
        Ok(match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => upload.with_filename(name),
            None => upload,
        })
    }

    fn hint(&self) -> SourceHint<'_> {
        SourceHint::new(self.filename.as_deref(), self.content_type.as_deref())
    }

    /// Accept HEIC/HEIF by extension (browsers often send them without an
    /// image type), any `image/*` type, and `application/octet-stream`,
    /// parameters allowed. Anything else, a missing type included, is refused.
    pub fn check_is_image(&self) -> Result<(), ServiceError> {
        if SourceHint::new(self.filename.as_deref(), None).is_heif() {
            return Ok(());
        }
        let Some(ct) = self.content_type.as_deref() else {
            return Err(ServiceError::NotAnImage("missing content type".into()));
        };
        let ct = ct.trim().to_ascii_lowercase();
        if ACCEPTED_CONTENT_TYPES.iter().any(|prefix| ct.starts_with(prefix)) {
            Ok(())
        } else {
            Err(ServiceError::NotAnImage(format!("content type '{ct}'")))
        }
    }
}

/// Filters offered by [`boost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    PixelArt,
    Y2kFilm,
}

impl FilterKind {
    /// Case-insensitive `"pixel"` or `"y2k"`.
    pub fn parse(name: &str) -> Result<Self, ImagingError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pixel" => Ok(Self::PixelArt),
            "y2k" => Ok(Self::Y2kFilm),
            other => Err(ImagingError::UnsupportedFormat(format!(
                "filter '{other}' (expected pixel or y2k)"
            ))),
        }
    }

    /// Request name, also used in output file names.
    pub fn name(self) -> &'static str {
        match self {
            Self::PixelArt => "pixel",
            Self::Y2kFilm => "y2k",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::PixelArt => "Pixel Art Mode",
            Self::Y2kFilm => "Y2K Film Mode",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Filtered image, encoded as `format`.
#[derive(Debug, Clone)]
pub struct FilterResult {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub filter: FilterKind,
}

impl FilterResult {
    pub fn to_response(&self) -> BoostResponse {
        BoostResponse {
            image_base64: codec::to_base64(&self.bytes),
            filter_applied: self.filter.display_name().to_string(),
        }
    }
}

/// JSON body returned to a client after [`boost`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostResponse {
    pub image_base64: String,
    pub filter_applied: String,
}

/// Result of [`predict`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Emo-class probability as 0–100 with one decimal.
    pub emo_score: f64,
    pub model_used: String,
    pub color_palette: Palette,
}

/// Everything the operations need that outlives a single request.
///
/// Built once at startup and shared read-only between workers.
#[derive(Debug)]
pub struct Toolkit {
    pub config: AppConfig,
    pub font: StampFont,
}

impl Toolkit {
    /// Resolve the stamp font from `config.film.font_candidates`.
    pub fn new(config: AppConfig) -> Self {
        let font = StampFont::resolve(&config.film.font_candidates);
        Self { config, font }
    }

    pub fn with_font(config: AppConfig, font: StampFont) -> Self {
        Self { config, font }
    }

    fn decode(&self, upload: &Upload) -> Result<RasterImage, ServiceError> {
        upload.check_is_image()?;
        let image = codec::decode(&upload.bytes, &upload.hint())?;
        if let Some(max) = self.config.limits.max_pixels {
            let (width, height) = image.dimensions();
            if width as u64 * height as u64 > max {
                return Err(ServiceError::TooLarge { width, height, max });
            }
        }
        debug!("Decoded {}x{}", image.width(), image.height());
        Ok(image)
    }
}

/// Apply `filter` and return the PNG-encoded result.
pub fn boost(
    upload: &Upload,
    filter: FilterKind,
    toolkit: &Toolkit,
) -> Result<FilterResult, ServiceError> {
    boost_as(upload, filter, OutputFormat::Png, toolkit)
}

/// [`boost`] with a caller-chosen output encoding.
#[instrument(skip_all, fields(filter = filter.name(), format = format.extension(), bytes = upload.bytes.len()))]
pub fn boost_as(
    upload: &Upload,
    filter: FilterKind,
    format: OutputFormat,
    toolkit: &Toolkit,
) -> Result<FilterResult, ServiceError> {
    let image = toolkit.decode(upload)?;
    let filtered = match filter {
        FilterKind::PixelArt => apply_pixel_art(&image, &toolkit.config.pixel_art.to_params())?,
        FilterKind::Y2kFilm => {
            apply_y2k_film(&image, &toolkit.config.film.to_params(), &toolkit.font)?
        }
    };
    let bytes = codec::encode(&filtered, format)?;
    Ok(FilterResult {
        bytes,
        format,
        filter,
    })
}

/// Dominant colors of the upload.
#[instrument(skip_all, fields(bytes = upload.bytes.len()))]
pub fn analyze(upload: &Upload, toolkit: &Toolkit) -> Result<Palette, ServiceError> {
    let image = toolkit.decode(upload)?;
    Ok(extract_palette(&image, &toolkit.config.palette.to_params())?)
}

/// Emo score from `classifier`, plus the upload's palette.
#[instrument(skip_all, fields(model = %classifier.kind(), bytes = upload.bytes.len()))]
pub fn predict(
    upload: &Upload,
    classifier: &dyn Classifier,
    toolkit: &Toolkit,
) -> Result<Prediction, ServiceError> {
    let image = toolkit.decode(upload)?;
    let model = classifier.kind();
    let tensor = InputTensor::from_image(&image)?;
    let probabilities = classifier
        .classify(&tensor)
        .map_err(|source| ServiceError::Classifier { model, source })?;
    let color_palette = extract_palette(&image, &toolkit.config.palette.to_params())?;
    Ok(Prediction {
        emo_score: probabilities.emo_score(),
        model_used: model.display_name().to_string(),
        color_palette,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::classify::tests::FixedClassifier;
    use crate::imaging::classify::{ClassProbabilities, InputTensor};
    use crate::test_helpers::{gradient_image, solid_image};

    fn toolkit() -> Toolkit {
        let mut config = AppConfig::default();
        config.pixel_art.seed = Some(5);
        config.film.grain_seed = Some(5);
        Toolkit::with_font(config, StampFont::builtin())
    }

    fn png_upload(image: &RasterImage) -> Upload {
        Upload::new(codec::encode(image, OutputFormat::Png).unwrap())
            .with_filename("selfie.png")
            .with_content_type("image/png")
    }

    // =========================================================================
    // Upload checks
    // =========================================================================

    #[test]
    fn content_type_gate() {
        let up = |ct: &str| Upload::new(vec![1]).with_content_type(ct);
        assert!(up("image/jpeg").check_is_image().is_ok());
        assert!(up("Image/PNG").check_is_image().is_ok());
        assert!(up("application/octet-stream").check_is_image().is_ok());
        assert!(
            up("application/octet-stream; charset=binary")
                .check_is_image()
                .is_ok()
        );
        assert!(matches!(
            Upload::new(vec![1]).check_is_image(),
            Err(ServiceError::NotAnImage(_))
        ));
        assert!(
            Upload::new(vec![1])
                .with_filename("IMG_0002.heif")
                .check_is_image()
                .is_ok()
        );

        let err = up("text/plain").check_is_image().unwrap_err();
        assert!(matches!(err, ServiceError::NotAnImage(_)));
        assert!(err.is_caller_error());
    }

    #[test]
    fn heic_filename_accepted_with_any_content_type() {
        let upload = Upload::new(vec![1])
            .with_filename("IMG_0001.HEIC")
            .with_content_type("application/x-unknown");
        assert!(upload.check_is_image().is_ok());
    }

    #[test]
    fn garbage_bytes_are_a_caller_error() {
        let upload = Upload::new(b"definitely not a png".to_vec()).with_content_type("image/png");
        let err = boost(&upload, FilterKind::PixelArt, &toolkit()).unwrap_err();
        assert!(matches!(err, ServiceError::Imaging(ImagingError::Decode(_))));
        assert!(err.is_caller_error());
    }

    #[test]
    fn from_path_keeps_file_name() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("shot.png");
        std::fs::write(&path, b"x").unwrap();
        let upload = Upload::from_path(&path).unwrap();
        assert_eq!(upload.filename.as_deref(), Some("shot.png"));
        assert_eq!(upload.content_type.as_deref(), Some("image/png"));
        assert_eq!(upload.bytes, b"x");
        assert!(upload.check_is_image().is_ok());
    }

    #[test]
    fn from_path_falls_back_to_octet_stream() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("IMG_0001.HEIC");
        std::fs::write(&path, b"x").unwrap();
        let upload = Upload::from_path(&path).unwrap();
        assert_eq!(upload.content_type.as_deref(), Some("application/octet-stream"));
        assert!(upload.check_is_image().is_ok());
    }

    // =========================================================================
    // Filters
    // =========================================================================

    #[test]
    fn filter_names_parse_case_insensitively() {
        assert_eq!(FilterKind::parse("pixel").unwrap(), FilterKind::PixelArt);
        assert_eq!(FilterKind::parse("Y2K").unwrap(), FilterKind::Y2kFilm);
        let err = FilterKind::parse("sepia").unwrap_err();
        assert!(matches!(err, ImagingError::UnsupportedFormat(_)));
        assert!(err.to_string().contains("sepia"));
    }

    #[test]
    fn filter_display_names() {
        assert_eq!(FilterKind::PixelArt.to_string(), "Pixel Art Mode");
        assert_eq!(FilterKind::Y2kFilm.to_string(), "Y2K Film Mode");
        assert_eq!(FilterKind::Y2kFilm.name(), "y2k");
    }

    #[test]
    fn boost_pixel_returns_png_of_same_size() {
        let upload = png_upload(&gradient_image(96, 64));
        let result = boost(&upload, FilterKind::PixelArt, &toolkit()).unwrap();
        let decoded = codec::decode(&result.bytes, &SourceHint::default()).unwrap();
        assert_eq!(decoded.dimensions(), (96, 64));
        assert_eq!(result.filter, FilterKind::PixelArt);
        assert_eq!(result.format, OutputFormat::Png);
        assert!(result.bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn boost_as_encodes_requested_format() {
        let upload = png_upload(&gradient_image(40, 30));
        let result = boost_as(&upload, FilterKind::PixelArt, OutputFormat::Bmp, &toolkit()).unwrap();
        assert!(result.bytes.starts_with(b"BM"));
        let decoded = codec::decode(&result.bytes, &SourceHint::default()).unwrap();
        assert_eq!(decoded.dimensions(), (40, 30));
    }

    #[test]
    fn boost_y2k_response_round_trips_base64() {
        let upload = png_upload(&gradient_image(120, 80));
        let result = boost(&upload, FilterKind::Y2kFilm, &toolkit()).unwrap();
        let response = result.to_response();
        assert_eq!(response.filter_applied, "Y2K Film Mode");

        let bytes = codec::from_base64(&response.image_base64).unwrap();
        assert_eq!(bytes, result.bytes);
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("image_base64").is_some());
        assert_eq!(json["filter_applied"], "Y2K Film Mode");
    }

    #[test]
    fn max_pixels_guard() {
        let mut toolkit = toolkit();
        toolkit.config.limits.max_pixels = Some(100);
        let upload = png_upload(&solid_image(20, 20, [9, 9, 9]));
        let err = analyze(&upload, &toolkit).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::TooLarge {
                width: 20,
                height: 20,
                max: 100
            }
        ));
        assert!(err.is_caller_error());

        toolkit.config.limits.max_pixels = Some(400);
        assert!(analyze(&upload, &toolkit).is_ok());
    }

    // =========================================================================
    // analyze / predict
    // =========================================================================

    #[test]
    fn analyze_reports_configured_color_count() {
        let upload = png_upload(&gradient_image(200, 120));
        let palette = analyze(&upload, &toolkit()).unwrap();
        assert_eq!(palette.len(), 5);
        let total: f64 = palette.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 1e-6);
    }

    #[test]
    fn predict_uses_classifier_and_palette() {
        let classifier = FixedClassifier {
            kind: ModelKind::VitB16,
            logits: [0.0, 0.0],
        };
        let upload = png_upload(&solid_image(64, 64, [20, 20, 20]));
        let prediction = predict(&upload, &classifier, &toolkit()).unwrap();
        assert_eq!(prediction.emo_score, 50.0);
        assert_eq!(prediction.model_used, "ViT-B/16");
        assert_eq!(prediction.color_palette.len(), 5);
        assert_eq!(prediction.color_palette[0].hex, "#141414");
    }

    struct BrokenClassifier;

    impl Classifier for BrokenClassifier {
        fn kind(&self) -> ModelKind {
            ModelKind::ResNet152
        }

        fn classify(&self, _input: &InputTensor) -> crate::imaging::error::Result<ClassProbabilities> {
            Err(ImagingError::Processing("weights missing".into()))
        }
    }

    #[test]
    fn classifier_failure_is_internal() {
        let upload = png_upload(&solid_image(32, 32, [1, 2, 3]));
        let err = predict(&upload, &BrokenClassifier, &toolkit()).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Classifier {
                model: ModelKind::ResNet152,
                ..
            }
        ));
        assert!(!err.is_caller_error());
        assert!(err.to_string().contains("ResNet152"));
    }
}
