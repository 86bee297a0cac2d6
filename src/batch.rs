//! Batch runs over local files for the CLI.
//!
//! Inputs may be files or directories. Directories are walked recursively and
//! only files with a supported extension are kept; explicitly named files are
//! always kept and left to the decoder. Work is spread over the global rayon
//! pool, one image per task, and results come back in input order.
//!
//! A failing image never stops the batch. It becomes a
//! [`BatchEvent::Failed`] and the rest carry on.

use crate::imaging::codec::{self, supported_input_extensions};
use crate::imaging::{OutputFormat, Palette};
use crate::service::{self, FilterKind, ServiceError, Toolkit, Upload};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Input not found: {0}")]
    NotFound(PathBuf),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl BatchError {
    /// Missing inputs and rejected images are the caller's fault; IO is not.
    pub fn is_caller_error(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Service(e) => e.is_caller_error(),
            Self::Io(_) | Self::Walk(_) => false,
        }
    }
}

/// Where and how `boost` results are written.
#[derive(Debug, Clone)]
pub struct BoostJob {
    pub filter: FilterKind,
    pub out_dir: PathBuf,
    pub format: OutputFormat,
    /// Write base64 text (`.b64`) instead of raw image bytes.
    pub base64: bool,
}

impl BoostJob {
    /// `<out_dir>/<stem>-<filter>.<format>`, or `.b64` in base64 mode.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let ext = if self.base64 {
            "b64"
        } else {
            self.format.extension()
        };
        self.out_dir
            .join(format!("{}-{}.{}", stem, self.filter.name(), ext))
    }
}

/// Outcome for one input.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Analyzed {
        source: PathBuf,
        palette: Palette,
    },
    Boosted {
        source: PathBuf,
        output: PathBuf,
        filter: FilterKind,
    },
    Failed {
        source: PathBuf,
        error: String,
        caller_error: bool,
    },
}

impl BatchEvent {
    pub fn source(&self) -> &Path {
        match self {
            Self::Analyzed { source, .. }
            | Self::Boosted { source, .. }
            | Self::Failed { source, .. } => source,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    fn failed(source: &Path, error: &BatchError) -> Self {
        warn!("{}: {}", source.display(), error);
        Self::Failed {
            source: source.to_path_buf(),
            error: error.to_string(),
            caller_error: error.is_caller_error(),
        }
    }
}

/// JSON shape for `palette --json`.
#[derive(Debug, Clone, Serialize)]
pub struct PaletteReport {
    pub source: String,
    pub palette: Palette,
}

/// Successful palettes from a batch, in input order.
pub fn palette_reports(events: &[BatchEvent]) -> Vec<PaletteReport> {
    events
        .iter()
        .filter_map(|event| match event {
            BatchEvent::Analyzed { source, palette } => Some(PaletteReport {
                source: source.display().to_string(),
                palette: palette.clone(),
            }),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_events(events: &[BatchEvent]) -> Self {
        let failed = events.iter().filter(|e| e.is_failure()).count();
        Self {
            succeeded: events.len() - failed,
            failed,
        }
    }
}

/// Expand `paths` into the list of image files to process.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>, BatchError> {
    let supported = supported_input_extensions();
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_file() {
            inputs.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path).sort_by_file_name() {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let matches = entry
                    .path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| supported.iter().any(|s| e.eq_ignore_ascii_case(s)));
                if matches {
                    inputs.push(entry.into_path());
                }
            }
        } else {
            return Err(BatchError::NotFound(path.clone()));
        }
    }
    Ok(inputs)
}

/// Extract the palette of every input.
pub fn run_palettes(inputs: &[PathBuf], toolkit: &Toolkit) -> Vec<BatchEvent> {
    inputs
        .par_iter()
        .map(|source| match analyze_one(source, toolkit) {
            Ok(palette) => {
                info!("{}: {} colors", source.display(), palette.len());
                BatchEvent::Analyzed {
                    source: source.clone(),
                    palette,
                }
            }
            Err(e) => BatchEvent::failed(source, &e),
        })
        .collect()
}

/// Apply `job.filter` to every input and write the results into `job.out_dir`.
pub fn run_boost(
    inputs: &[PathBuf],
    job: &BoostJob,
    toolkit: &Toolkit,
) -> Result<Vec<BatchEvent>, BatchError> {
    std::fs::create_dir_all(&job.out_dir)?;
    Ok(inputs
        .par_iter()
        .map(|source| match boost_one(source, job, toolkit) {
            Ok(output) => {
                info!("{} -> {}", source.display(), output.display());
                BatchEvent::Boosted {
                    source: source.clone(),
                    output,
                    filter: job.filter,
                }
            }
            Err(e) => BatchEvent::failed(source, &e),
        })
        .collect())
}

fn analyze_one(source: &Path, toolkit: &Toolkit) -> Result<Palette, BatchError> {
    let upload = Upload::from_path(source)?;
    Ok(service::analyze(&upload, toolkit)?)
}

fn boost_one(source: &Path, job: &BoostJob, toolkit: &Toolkit) -> Result<PathBuf, BatchError> {
    let upload = Upload::from_path(source)?;
    let result = service::boost_as(&upload, job.filter, job.format, toolkit)?;
    let output = job.output_path(source);
    if job.base64 {
        std::fs::write(&output, codec::to_base64(&result.bytes))?;
    } else {
        std::fs::write(&output, &result.bytes)?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::imaging::{OutputFormat, SourceHint, StampFont};
    use crate::test_helpers::{gradient_image, solid_image};
    use std::fs;
    use tempfile::TempDir;

    fn toolkit() -> Toolkit {
        let mut config = AppConfig::default();
        config.pixel_art.seed = Some(1);
        config.film.grain_seed = Some(1);
        Toolkit::with_font(config, StampFont::builtin())
    }

    fn write_png(path: &Path, w: u32, h: u32) {
        let bytes = codec::encode(&gradient_image(w, h), OutputFormat::Png).unwrap();
        fs::write(path, bytes).unwrap();
    }

    // =========================================================================
    // collect_inputs
    // =========================================================================

    #[test]
    fn directories_are_walked_for_supported_files() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("trip");
        fs::create_dir_all(&nested).unwrap();
        write_png(&tmp.path().join("b.png"), 4, 4);
        write_png(&nested.join("a.PNG"), 4, 4);
        fs::write(tmp.path().join("notes.txt"), "hi").unwrap();

        let inputs = collect_inputs(&[tmp.path().to_path_buf()]).unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["b.png", "a.PNG"]);
    }

    #[test]
    fn explicit_files_are_kept_whatever_the_extension() {
        let tmp = TempDir::new().unwrap();
        let odd = tmp.path().join("upload.bin");
        fs::write(&odd, b"?").unwrap();
        let inputs = collect_inputs(std::slice::from_ref(&odd)).unwrap();
        assert_eq!(inputs, vec![odd]);
    }

    #[test]
    fn missing_input_is_an_error() {
        let err = collect_inputs(&[PathBuf::from("/no/such/dir")]).unwrap_err();
        assert!(matches!(err, BatchError::NotFound(_)));
    }

    // =========================================================================
    // Runs
    // =========================================================================

    #[test]
    fn boost_writes_png_per_input() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("selfie.png");
        write_png(&src, 40, 24);
        let job = BoostJob {
            filter: FilterKind::PixelArt,
            out_dir: tmp.path().join("out"),
            format: OutputFormat::Png,
            base64: false,
        };

        let events = run_boost(std::slice::from_ref(&src), &job, &toolkit()).unwrap();
        let expected = tmp.path().join("out").join("selfie-pixel.png");
        assert_eq!(
            events,
            vec![BatchEvent::Boosted {
                source: src,
                output: expected.clone(),
                filter: FilterKind::PixelArt,
            }]
        );
        let written = codec::decode(&fs::read(expected).unwrap(), &SourceHint::default()).unwrap();
        assert_eq!(written.dimensions(), (40, 24));
    }

    #[test]
    fn boost_base64_mode_writes_text() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("night.png");
        write_png(&src, 32, 32);
        let job = BoostJob {
            filter: FilterKind::Y2kFilm,
            out_dir: tmp.path().to_path_buf(),
            format: OutputFormat::Png,
            base64: true,
        };
        run_boost(std::slice::from_ref(&src), &job, &toolkit()).unwrap();
        let text = fs::read_to_string(tmp.path().join("night-y2k.b64")).unwrap();
        let png = codec::from_base64(&text).unwrap();
        assert!(codec::decode(&png, &SourceHint::default()).is_ok());
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("good.png");
        let bad = tmp.path().join("bad.png");
        fs::write(&good, codec::encode(&solid_image(16, 16, [9, 9, 9]), OutputFormat::Png).unwrap())
            .unwrap();
        fs::write(&bad, b"not an image").unwrap();

        let events = run_palettes(&[bad.clone(), good.clone()], &toolkit());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].source(), bad.as_path());
        assert!(matches!(
            events[0],
            BatchEvent::Failed {
                caller_error: true,
                ..
            }
        ));
        assert!(matches!(events[1], BatchEvent::Analyzed { .. }));
        assert_eq!(
            BatchSummary::from_events(&events),
            BatchSummary {
                succeeded: 1,
                failed: 1
            }
        );

        let reports = palette_reports(&events);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].palette[0].hex, "#090909");
    }

    #[test]
    fn output_path_uses_stem_and_filter() {
        let job = BoostJob {
            filter: FilterKind::Y2kFilm,
            out_dir: PathBuf::from("out"),
            format: OutputFormat::Png,
            base64: false,
        };
        assert_eq!(
            job.output_path(Path::new("in/IMG_1.heic")),
            PathBuf::from("out/IMG_1-y2k.png")
        );

        let tiff = BoostJob {
            format: OutputFormat::Tiff,
            ..job
        };
        assert_eq!(
            tiff.output_path(Path::new("a.jpg")),
            PathBuf::from("out/a-y2k.tiff")
        );
    }
}
