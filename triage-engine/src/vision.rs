//! Radiograph classifier.
//!
//! Fixed preprocessing — decode, resize to a square, grayscale, scale pixels
//! into [0, 1] — followed by a pretrained linear probe loaded from the model
//! artifact. The probe keeps the same artifact-loading contract as the text
//! classifiers, so heavier backends can slot in behind [`ImagePredictor`]
//! without touching the pipeline.
//!
//! The image modality is optional: an undecodable blob raises
//! [`TriageError::ImageDecode`], which the service turns into a text-only
//! request rather than a failure.

use image::imageops::FilterType;
use tracing::debug;

use crate::classifier::softmax;
use crate::error::{TriageError, TriageResult};
use crate::model::{ModelArtifact, VisionParams};
use crate::types::{DiseaseClass, ProbabilityDistribution};

/// Trait for radiograph classifier backends.
pub trait ImagePredictor: Send + Sync {
    fn name(&self) -> &str;

    /// Classify an encoded image into the vision label set.
    fn predict(&self, image: &[u8]) -> TriageResult<ProbabilityDistribution>;
}

/// Linear probe over preprocessed pixels.
pub struct LinearProbeClassifier {
    input_size: u32,
    classes: Vec<DiseaseClass>,
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

impl LinearProbeClassifier {
    pub fn from_params(params: &VisionParams) -> TriageResult<Self> {
        let pixels = (params.input_size as usize).pow(2);
        if params.classes.is_empty()
            || params.weights.len() != params.classes.len()
            || params.bias.len() != params.classes.len()
            || params.weights.iter().any(|row| row.len() != pixels)
        {
            return Err(TriageError::ModelLoad(
                "vision probe dimensions are inconsistent".to_string(),
            ));
        }
        Ok(Self {
            input_size: params.input_size,
            classes: params.classes.clone(),
            weights: params.weights.clone(),
            bias: params.bias.clone(),
        })
    }

    /// Decode → fixed square → grayscale → [0, 1] pixel vector.
    fn preprocess(&self, image: &[u8]) -> TriageResult<Vec<f64>> {
        let decoded = image::load_from_memory(image)
            .map_err(|e| TriageError::ImageDecode(e.to_string()))?;
        let resized = decoded
            .resize_exact(self.input_size, self.input_size, FilterType::Triangle)
            .to_luma8();
        Ok(resized.pixels().map(|p| f64::from(p.0[0]) / 255.0).collect())
    }
}

impl ImagePredictor for LinearProbeClassifier {
    fn name(&self) -> &str {
        "linear_probe"
    }

    fn predict(&self, image: &[u8]) -> TriageResult<ProbabilityDistribution> {
        let pixels = self.preprocess(image)?;
        let scores: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(&pixels).map(|(w, p)| w * p).sum::<f64>() + b)
            .collect();
        let probs = softmax(&scores);

        debug!(classes = self.classes.len(), "vision probe scored radiograph");
        ProbabilityDistribution::from_weights(
            self.classes.iter().copied().zip(probs.iter().copied()),
        )
    }
}

/// Create the image predictor the artifact carries, if any.
pub fn create_image_predictor(
    artifact: &ModelArtifact,
) -> TriageResult<Option<Box<dyn ImagePredictor>>> {
    match &artifact.vision {
        Some(params) => Ok(Some(Box::new(LinearProbeClassifier::from_params(params)?))),
        None => Ok(None),
    }
}
