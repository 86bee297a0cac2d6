//! Emo-score classification boundary.
//!
//! Model loading and inference live outside this crate. What lives here is
//! the contract: a [`Classifier`] takes a normalised 224×224 [`InputTensor`]
//! and returns a two-class [`ClassProbabilities`]. Classifiers are constructed
//! by the host and passed in explicitly; nothing in this crate keeps a global
//! model or device handle.

use super::codec::RasterImage;
use super::error::{Result, ensure_non_empty};
use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge length of the square classifier input.
pub const INPUT_SIZE: u32 = 224;

/// ImageNet channel statistics used by both supported backbones.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Supported classifier backbones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelKind {
    #[default]
    ResNet152,
    VitB16,
}

impl ModelKind {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::ResNet152 => "ResNet152",
            Self::VitB16 => "ViT-B/16",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Channel-major (CHW) `3 × 224 × 224` tensor, normalised per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    data: Vec<f32>,
}

impl InputTensor {
    /// Resize to 224×224 (linear), scale to 0–1, subtract mean, divide by std.
    pub fn from_image(image: &RasterImage) -> Result<Self> {
        ensure_non_empty(image.width(), image.height())?;
        let resized = imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
        let plane = (INPUT_SIZE * INPUT_SIZE) as usize;
        let mut data = vec![0.0f32; 3 * plane];
        for (i, pixel) in resized.pixels().enumerate() {
            for ch in 0..3 {
                data[ch * plane + i] = (pixel[ch] as f32 / 255.0 - MEAN[ch]) / STD[ch];
            }
        }
        Ok(Self { data })
    }

    pub fn shape(&self) -> [usize; 3] {
        [3, INPUT_SIZE as usize, INPUT_SIZE as usize]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[cfg(test)]
    fn get(&self, channel: usize, y: usize, x: usize) -> f32 {
        let side = INPUT_SIZE as usize;
        self.data[channel * side * side + y * side + x]
    }
}

/// Softmax output of a two-class head: index 0 is "not emo", index 1 is "emo".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub other: f32,
    pub emo: f32,
}

impl ClassProbabilities {
    pub fn from_logits(logits: [f32; 2]) -> Self {
        let max = logits[0].max(logits[1]);
        let e0 = (logits[0] - max).exp();
        let e1 = (logits[1] - max).exp();
        let sum = e0 + e1;
        Self {
            other: e0 / sum,
            emo: e1 / sum,
        }
    }

    /// Probability of the emo class as a 0–100 score with one decimal.
    pub fn emo_score(&self) -> f64 {
        (self.emo as f64 * 1000.0).round() / 10.0
    }
}

/// Inference capability supplied by the host.
pub trait Classifier: Send + Sync {
    fn kind(&self) -> ModelKind;

    fn classify(&self, input: &InputTensor) -> Result<ClassProbabilities>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::ImagingError;
    use crate::test_helpers::{solid_image, split_image};

    /// Classifier that returns fixed logits regardless of input.
    pub struct FixedClassifier {
        pub kind: ModelKind,
        pub logits: [f32; 2],
    }

    impl Classifier for FixedClassifier {
        fn kind(&self) -> ModelKind {
            self.kind
        }

        fn classify(&self, input: &InputTensor) -> Result<ClassProbabilities> {
            if input.shape() != [3, 224, 224] {
                return Err(ImagingError::Processing("bad tensor shape".into()));
            }
            Ok(ClassProbabilities::from_logits(self.logits))
        }
    }

    #[test]
    fn model_kind_defaults_to_resnet() {
        assert_eq!(ModelKind::default(), ModelKind::ResNet152);
        assert_eq!(ModelKind::VitB16.to_string(), "ViT-B/16");
    }

    #[test]
    fn tensor_is_chw_and_normalised() {
        let tensor = InputTensor::from_image(&solid_image(50, 30, [255, 0, 128])).unwrap();
        assert_eq!(tensor.shape(), [3, 224, 224]);
        assert_eq!(tensor.as_slice().len(), 3 * 224 * 224);
        assert!((tensor.get(0, 10, 10) - (1.0 - 0.485) / 0.229).abs() < 1e-4);
        assert!((tensor.get(1, 200, 3) - (0.0 - 0.456) / 0.224).abs() < 1e-4);
        assert!((tensor.get(2, 0, 0) - (128.0 / 255.0 - 0.406) / 0.225).abs() < 1e-4);
    }

    #[test]
    fn tensor_keeps_spatial_layout() {
        let tensor =
            InputTensor::from_image(&split_image(448, 448, [255, 255, 255], [0, 0, 0])).unwrap();
        assert!(tensor.get(0, 100, 10) > tensor.get(0, 100, 210));
    }

    #[test]
    fn empty_image_rejected() {
        assert!(InputTensor::from_image(&RasterImage::new(0, 0)).is_err());
    }

    #[test]
    fn softmax_of_equal_logits_is_half() {
        let p = ClassProbabilities::from_logits([3.0, 3.0]);
        assert!((p.emo - 0.5).abs() < 1e-6);
        assert_eq!(p.emo_score(), 50.0);
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let p = ClassProbabilities::from_logits([1000.0, 0.0]);
        assert!(p.other > 0.999);
        assert!(p.emo.is_finite());
        assert_eq!(p.emo_score(), 0.0);
    }

    #[test]
    fn fixed_classifier_scores_tensor() {
        let classifier = FixedClassifier {
            kind: ModelKind::VitB16,
            logits: [0.0, 2.0],
        };
        let tensor = InputTensor::from_image(&solid_image(8, 8, [1, 2, 3])).unwrap();
        let probs = classifier.classify(&tensor).unwrap();
        assert!((probs.other + probs.emo - 1.0).abs() < 1e-6);
        assert_eq!(probs.emo_score(), 88.1);
    }
}
