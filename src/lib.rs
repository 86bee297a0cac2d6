//! # Emo-Check
//!
//! Image pipeline behind an "emo-ness" photo toy: it reports the dominant
//! colors of a photo, restyles it as pixel art or as a Y2K point-and-shoot
//! film shot, and prepares the input a host-supplied classifier scores.
//!
//! # Architecture
//!
//! ```text
//! bytes ──codec::decode──▶ RasterImage ──┬─ palette   → Vec<ColorSwatch>
//!                                        ├─ pixel_art → RasterImage ─┐
//!                                        ├─ film      → RasterImage ─┴─ codec::encode → PNG / base64
//!                                        └─ classify  → InputTensor → Classifier → emo score
//! ```
//!
//! Every transform takes an image by reference and returns a new one, with no
//! shared mutable state, so any number of requests can run in parallel. The
//! only long-lived values are the [`config::AppConfig`] and the resolved stamp
//! font, bundled in a [`service::Toolkit`] that is built once and passed in.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Pure in-memory transforms: codec, k-means palette, pixel art, film, classifier input |
//! | [`service`] | Request-level operations: `boost`, `analyze`, `predict`, upload checks, error mapping |
//! | [`batch`] | File and directory batches for the CLI, run on the rayon pool |
//! | [`config`] | `emo-check.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//! | [`logger`] | `tracing` subscriber setup |
//!
//! # Randomness
//!
//! Palette extraction always uses a fixed seed so identical photos get
//! identical palettes. Pixel-art initialisation and film grain draw fresh
//! entropy per call unless a seed is configured, which is what tests do.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod logger;
pub mod output;
pub mod service;

#[cfg(test)]
pub(crate) mod test_helpers;
