pub mod ensemble;
pub mod weighted_matrix;

use serde::{Deserialize, Serialize};

use crate::config::{PredictorStrategy, TriageConfig};
use crate::error::{TriageError, TriageResult};
use crate::features::{FeatureVector, FEATURE_SCHEMA};
use crate::model::ModelArtifact;
use crate::types::{DiseaseClass, ProbabilityDistribution};

/// One member's vote in an ensemble prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberVote {
    pub member: String,
    pub vote: DiseaseClass,
    pub confidence: f64,
}

/// Classifier output: class distribution plus per-member votes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub distribution: ProbabilityDistribution,
    pub member_votes: Vec<MemberVote>,
}

/// Trait for disease classifier strategies.
pub trait DiseasePredictor: Send + Sync {
    fn name(&self) -> &str;

    /// Convert a feature vector into a class distribution.
    fn predict(&self, features: &FeatureVector) -> TriageResult<Prediction>;
}

/// Create a predictor instance based on configuration.
pub fn create_predictor(
    config: &TriageConfig,
    artifact: &ModelArtifact,
) -> TriageResult<Box<dyn DiseasePredictor>> {
    match config.model.strategy {
        PredictorStrategy::WeightedMatrix => Ok(Box::new(
            weighted_matrix::WeightedMatrixScorer::from_config(&config.scorer, artifact)?,
        )),
        PredictorStrategy::Ensemble => Ok(Box::new(ensemble::VotingEnsemble::from_artifact(
            artifact,
        )?)),
    }
}

/// Fail fast when the artifact's training schema disagrees with the engine's
/// feature schema — by width or by name/order. Never truncate, pad or
/// reorder to make a model fit.
pub(crate) fn check_artifact_schema(artifact: &ModelArtifact) -> TriageResult<()> {
    if artifact.feature_schema.len() != FEATURE_SCHEMA.len() {
        return Err(TriageError::SchemaMismatch(format!(
            "model {} was trained on {} features, engine produces {}",
            artifact.version,
            artifact.feature_schema.len(),
            FEATURE_SCHEMA.len()
        )));
    }
    for (i, (trained, engine)) in artifact
        .feature_schema
        .iter()
        .zip(FEATURE_SCHEMA.iter())
        .enumerate()
    {
        if trained != engine {
            return Err(TriageError::SchemaMismatch(format!(
                "model {} feature {i} is '{trained}', engine produces '{engine}'",
                artifact.version
            )));
        }
    }
    Ok(())
}

/// Per-request width check against the loaded model.
pub(crate) fn check_feature_width(expected: usize, features: &FeatureVector) -> TriageResult<()> {
    if features.len() != expected {
        return Err(TriageError::SchemaMismatch(format!(
            "model expects {expected} features, feature vector provides {}",
            features.len()
        )));
    }
    Ok(())
}

/// Numerically stable softmax.
pub(crate) fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}
