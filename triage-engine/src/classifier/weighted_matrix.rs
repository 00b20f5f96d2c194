//! Legacy weighted-matrix scorer.
//!
//! A symptom×disease weight table over the feature schema plus a temperature
//! softmax. Weights come from configuration (sparse, keyed by feature name)
//! with a built-in clinical default table; unknown feature names fail fast
//! instead of being dropped.

use crate::classifier::{
    check_artifact_schema, check_feature_width, softmax, DiseasePredictor, MemberVote, Prediction,
};
use crate::config::ScorerSettings;
use crate::error::{TriageError, TriageResult};
use crate::features::FeatureVector;
use crate::model::ModelArtifact;
use crate::types::{DiseaseClass, ProbabilityDistribution};

/// Built-in sparse weight rows, keyed by feature name.
fn default_weights(disease: DiseaseClass) -> &'static [(&'static str, f64)] {
    match disease {
        DiseaseClass::Covid19 => &[
            ("fever", 1.0),
            ("dry_cough", 1.2),
            ("dyspnea", 2.2),
            ("anosmia", 2.8),
            ("sig_covid_core", 4.0),
            ("sig_covid_respiratory", 2.5),
        ],
        DiseaseClass::Influenza => &[
            ("fever", 1.6),
            ("dry_cough", 1.2),
            ("sore_throat", 0.6),
            ("myalgia", 2.2),
            ("fatigue", 1.4),
            ("chills", 1.8),
            ("sig_flu_systemic", 3.5),
            ("sig_flu_onset", 2.5),
        ],
        DiseaseClass::CommonCold => &[
            ("dry_cough", 0.6),
            ("sore_throat", 1.4),
            ("rhinorrhea", 2.0),
            ("nasal_congestion", 1.8),
            ("sneezing", 1.6),
            ("sig_cold_catarrhal", 3.5),
            ("sig_cold_throat", 2.0),
        ],
        DiseaseClass::SeasonalAllergy => &[
            ("rhinorrhea", 1.4),
            ("nasal_congestion", 1.0),
            ("sneezing", 1.8),
            ("ocular_pruritus", 2.6),
            ("lacrimation", 1.8),
            ("sig_allergy_ocular", 3.5),
            ("sig_allergy_nasal", 2.5),
        ],
        DiseaseClass::Other => &[],
    }
}

fn default_bias(disease: DiseaseClass) -> f64 {
    match disease {
        // Wins over the symptom classes when nothing is reported.
        DiseaseClass::Other => 1.2,
        _ => 0.0,
    }
}

struct ClassRow {
    disease: DiseaseClass,
    /// Dense, aligned to the feature schema.
    weights: Vec<f64>,
    bias: f64,
}

pub struct WeightedMatrixScorer {
    rows: Vec<ClassRow>,
    temperature: f64,
    width: usize,
}

impl WeightedMatrixScorer {
    pub fn from_config(settings: &ScorerSettings, artifact: &ModelArtifact) -> TriageResult<Self> {
        check_artifact_schema(artifact)?;
        let schema = &artifact.feature_schema;

        let mut rows = Vec::with_capacity(artifact.classes.len());
        for &disease in &artifact.classes {
            let sparse: Vec<(String, f64)> = match settings
                .class_weights
                .as_ref()
                .and_then(|m| m.get(&disease))
            {
                Some(overrides) => overrides.iter().map(|(k, &v)| (k.clone(), v)).collect(),
                None => default_weights(disease)
                    .iter()
                    .map(|&(k, v)| (k.to_string(), v))
                    .collect(),
            };

            let mut dense = vec![0.0; schema.len()];
            for (feature, weight) in sparse {
                let idx = schema.iter().position(|f| *f == feature).ok_or_else(|| {
                    TriageError::Config(format!(
                        "scorer weight references unknown feature '{feature}' for {disease}"
                    ))
                })?;
                dense[idx] = weight;
            }

            let bias = settings
                .class_bias
                .as_ref()
                .and_then(|m| m.get(&disease).copied())
                .unwrap_or_else(|| default_bias(disease));

            rows.push(ClassRow {
                disease,
                weights: dense,
                bias,
            });
        }

        Ok(Self {
            rows,
            temperature: settings.temperature,
            width: schema.len(),
        })
    }
}

impl DiseasePredictor for WeightedMatrixScorer {
    fn name(&self) -> &str {
        "weighted_matrix"
    }

    fn predict(&self, features: &FeatureVector) -> TriageResult<Prediction> {
        check_feature_width(self.width, features)?;
        let x = features.values();

        let scores: Vec<f64> = self
            .rows
            .iter()
            .map(|row| {
                let dot: f64 = row.weights.iter().zip(x).map(|(w, v)| w * v).sum();
                (dot + row.bias) / self.temperature
            })
            .collect();
        let probs = softmax(&scores);

        let distribution = ProbabilityDistribution::from_weights(
            self.rows.iter().zip(&probs).map(|(row, &p)| (row.disease, p)),
        )?;
        let (vote, confidence) = distribution.argmax();

        Ok(Prediction {
            distribution,
            member_votes: vec![MemberVote {
                member: self.name().to_string(),
                vote,
                confidence,
            }],
        })
    }
}
