//! K-means over RGB samples, backed by `kmeans_colors`.
//!
//! One wrapper serves both the palette extractor and the pixel-art quantizer;
//! they differ only in engine, stopping criteria and seeding:
//!
//! | Caller | Engine | Max iterations | Epsilon | Restarts | Seed |
//! |---|---|---|---|---|---|
//! | palette | Hamerly | 300 | 1e-4 | 10 | fixed (42) |
//! | pixel art | Lloyd | 20 | 1.0 | 10 | caller's choice |
//!
//! Both engines seed with k-means++. Restart `i` runs with seed `base + i`
//! and the lowest score wins. Samples are clustered in sRGB scaled to 0–1;
//! results come back as 8-bit channels.

use super::error::{ImagingError, Result};
use ::palette::Srgb;
use kmeans_colors::{Kmeans, get_kmeans, get_kmeans_hamerly};

/// One RGB sample.
pub type Sample = [u8; 3];

/// `kmeans_colors` reports labels as `u8`.
const MAX_CLUSTERS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    /// Plain Lloyd iterations.
    Lloyd,
    /// Hamerly's bounds-accelerated variant; same result, fewer distance checks.
    Hamerly,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeans {
    pub k: usize,
    pub max_iterations: usize,
    /// Stop once the centroids' total squared shift drops below `epsilon²` (RGB units).
    pub epsilon: f32,
    pub restarts: usize,
    pub engine: Engine,
}

/// Best clustering found across all restarts.
#[derive(Debug, Clone)]
pub struct Clustering {
    /// Rounded to the nearest integer per channel.
    pub centroids: Vec<[u8; 3]>,
    /// Cluster index per input sample, same order as the input.
    pub labels: Vec<usize>,
    /// Sum of squared distances from each sample to its centroid, 0–1 scale.
    pub score: f32,
}

impl Clustering {
    /// Number of samples assigned to each cluster. Empty clusters report 0.
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.centroids.len()];
        for &label in &self.labels {
            counts[label] += 1;
        }
        counts
    }

    /// Empty clusters collapse onto the most populous centroid, so a
    /// near-uniform image reports its one color `k` times.
    fn from_run(run: Kmeans<Srgb>) -> Self {
        let mut clustering = Self {
            centroids: run.centroids.iter().map(|c| to_rgb8(*c)).collect(),
            labels: run.indices.iter().map(|&i| i as usize).collect(),
            score: run.score,
        };
        let counts = clustering.counts();
        let largest = counts
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
            .map(|(i, _)| i);
        if let Some(largest) = largest {
            let fill = clustering.centroids[largest];
            for (centroid, &count) in clustering.centroids.iter_mut().zip(&counts) {
                if count == 0 {
                    *centroid = fill;
                }
            }
        }
        clustering
    }
}

impl KMeans {
    /// Run all restarts from `seed` upward and keep the lowest-score result.
    ///
    /// Ties keep the earliest restart. Always returns exactly `k` centroids.
    pub fn fit(&self, samples: &[Sample], seed: u64) -> Result<Clustering> {
        if self.k == 0 {
            return Err(ImagingError::Processing("cluster count must be positive".into()));
        }
        if self.k > MAX_CLUSTERS {
            return Err(ImagingError::Processing(format!(
                "at most {MAX_CLUSTERS} clusters are supported, {} requested",
                self.k
            )));
        }
        if samples.is_empty() {
            return Err(ImagingError::Processing("no samples to cluster".into()));
        }
        if self.k > samples.len() {
            return Err(ImagingError::Processing(format!(
                "{} clusters requested for {} samples",
                self.k,
                samples.len()
            )));
        }

        let buf: Vec<Srgb> = samples
            .iter()
            .map(|&[r, g, b]| Srgb::new(r, g, b).into_format())
            .collect();
        let converge = (self.epsilon / 255.0).powi(2);
        let max_iterations = self.max_iterations.max(1);

        let mut best: Option<Kmeans<Srgb>> = None;
        for run in 0..self.restarts.max(1) as u64 {
            let run_seed = seed.wrapping_add(run);
            let candidate = match self.engine {
                Engine::Lloyd => get_kmeans(self.k, max_iterations, converge, false, &buf, run_seed),
                Engine::Hamerly => {
                    get_kmeans_hamerly(self.k, max_iterations, converge, false, &buf, run_seed)
                }
            };
            if best.as_ref().is_none_or(|b| candidate.score < b.score) {
                best = Some(candidate);
            }
        }
        best.map(Clustering::from_run)
            .ok_or_else(|| ImagingError::Processing("k-means produced no result".into()))
    }
}

fn to_rgb8(c: Srgb) -> [u8; 3] {
    [c.red, c.green, c.blue].map(|v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
}
