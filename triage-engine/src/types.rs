use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use symptom_nlp::Symptom;
use uuid::Uuid;

use crate::error::{TriageError, TriageResult};

/// Differential diagnosis classes, versioned with the model artifact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DiseaseClass {
    #[serde(rename = "covid-19")]
    Covid19,
    #[serde(rename = "influenza")]
    Influenza,
    #[serde(rename = "common-cold")]
    CommonCold,
    #[serde(rename = "seasonal-allergy")]
    SeasonalAllergy,
    #[serde(rename = "other")]
    Other,
}

impl DiseaseClass {
    pub const ALL: [DiseaseClass; 5] = [
        DiseaseClass::Covid19,
        DiseaseClass::Influenza,
        DiseaseClass::CommonCold,
        DiseaseClass::SeasonalAllergy,
        DiseaseClass::Other,
    ];

    pub fn identifier(&self) -> &'static str {
        match self {
            DiseaseClass::Covid19 => "covid-19",
            DiseaseClass::Influenza => "influenza",
            DiseaseClass::CommonCold => "common-cold",
            DiseaseClass::SeasonalAllergy => "seasonal-allergy",
            DiseaseClass::Other => "other",
        }
    }
}

impl std::fmt::Display for DiseaseClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}

/// A probability distribution over disease classes.
///
/// Values live in [0, 1] and sum to 1 within [`ProbabilityDistribution::TOLERANCE`];
/// the constructor renormalizes, so every instance is a valid simplex point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityDistribution {
    probabilities: BTreeMap<DiseaseClass, f64>,
}

impl ProbabilityDistribution {
    pub const TOLERANCE: f64 = 1e-6;

    /// Build from non-negative class weights, renormalizing to sum 1.
    ///
    /// A zero-mass input yields the uniform distribution over the given
    /// classes rather than an invalid all-zero vector.
    pub fn from_weights<I>(weights: I) -> TriageResult<Self>
    where
        I: IntoIterator<Item = (DiseaseClass, f64)>,
    {
        let mut probabilities = BTreeMap::new();
        for (class, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(TriageError::Prediction(format!(
                    "invalid probability weight {weight} for class {class}"
                )));
            }
            probabilities.insert(class, weight);
        }
        if probabilities.is_empty() {
            return Err(TriageError::Prediction(
                "probability distribution over zero classes".to_string(),
            ));
        }

        let sum: f64 = probabilities.values().sum();
        if sum <= 0.0 {
            let uniform = 1.0 / probabilities.len() as f64;
            probabilities.values_mut().for_each(|v| *v = uniform);
        } else {
            probabilities.values_mut().for_each(|v| *v /= sum);
        }
        Ok(Self { probabilities })
    }

    /// Uniform distribution over the given classes.
    pub fn uniform(classes: &[DiseaseClass]) -> TriageResult<Self> {
        Self::from_weights(classes.iter().map(|&c| (c, 1.0)))
    }

    /// Enforce the simplex invariant.
    pub fn validate(&self) -> TriageResult<()> {
        let sum: f64 = self.probabilities.values().sum();
        if (sum - 1.0).abs() > Self::TOLERANCE {
            return Err(TriageError::Prediction(format!(
                "probabilities sum to {sum}, expected 1.0"
            )));
        }
        for (class, p) in &self.probabilities {
            if !(0.0..=1.0 + Self::TOLERANCE).contains(p) {
                return Err(TriageError::Prediction(format!(
                    "probability {p} for class {class} outside [0, 1]"
                )));
            }
        }
        Ok(())
    }

    /// Probability for a class; 0.0 when the class is not in this
    /// distribution's label set.
    pub fn get(&self, class: DiseaseClass) -> f64 {
        self.probabilities.get(&class).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, class: DiseaseClass) -> bool {
        self.probabilities.contains_key(&class)
    }

    /// Highest-probability class and its probability.
    pub fn argmax(&self) -> (DiseaseClass, f64) {
        let mut best = (DiseaseClass::Other, f64::NEG_INFINITY);
        for (&class, &p) in &self.probabilities {
            if p > best.1 {
                best = (class, p);
            }
        }
        best
    }

    pub fn classes(&self) -> impl Iterator<Item = DiseaseClass> + '_ {
        self.probabilities.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DiseaseClass, f64)> + '_ {
        self.probabilities.iter().map(|(&c, &p)| (c, p))
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

/// Severity rating attached to a diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Moderate,
    Low,
    Undetermined,
}

/// Whether the engine considered the evidence sufficient for a diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisStatus {
    Determined,
    InsufficientInformation,
}

/// A detected disease-specific symptom combination, surfaced for
/// explainability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSignature {
    pub name: String,
    pub score: f64,
}

/// Result provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub model_version: String,
}

/// Final triage outcome. Created once, immutable, passed by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub disease: DiseaseClass,
    pub confidence: f64,
    pub probabilities: ProbabilityDistribution,
    pub detected_symptoms: Vec<Symptom>,
    pub diagnostic_signatures: Vec<DiagnosticSignature>,
    pub severity: Severity,
    pub recommendations: Vec<String>,
    pub status: DiagnosisStatus,
    pub metadata: ResultMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_weights_renormalizes() {
        let dist = ProbabilityDistribution::from_weights([
            (DiseaseClass::Covid19, 2.0),
            (DiseaseClass::Other, 2.0),
        ])
        .unwrap();
        assert!((dist.get(DiseaseClass::Covid19) - 0.5).abs() < 1e-12);
        dist.validate().unwrap();
    }

    #[test]
    fn zero_mass_becomes_uniform() {
        let dist = ProbabilityDistribution::from_weights(
            DiseaseClass::ALL.iter().map(|&c| (c, 0.0)),
        )
        .unwrap();
        for class in DiseaseClass::ALL {
            assert!((dist.get(class) - 0.2).abs() < 1e-12);
        }
        dist.validate().unwrap();
    }

    #[test]
    fn negative_weight_is_rejected() {
        let err = ProbabilityDistribution::from_weights([(DiseaseClass::Covid19, -0.1)]);
        assert!(err.is_err());
    }

    #[test]
    fn argmax_finds_the_peak() {
        let dist = ProbabilityDistribution::from_weights([
            (DiseaseClass::Covid19, 0.1),
            (DiseaseClass::Influenza, 0.6),
            (DiseaseClass::Other, 0.3),
        ])
        .unwrap();
        let (class, p) = dist.argmax();
        assert_eq!(class, DiseaseClass::Influenza);
        assert!((p - 0.6).abs() < 1e-12);
    }

    #[test]
    fn missing_class_reads_as_zero() {
        let dist =
            ProbabilityDistribution::from_weights([(DiseaseClass::Covid19, 1.0)]).unwrap();
        assert_eq!(dist.get(DiseaseClass::Influenza), 0.0);
        assert!(!dist.contains(DiseaseClass::Influenza));
    }

    #[test]
    fn disease_class_serde_uses_kebab_names() {
        let json = serde_json::to_string(&DiseaseClass::Covid19).unwrap();
        assert_eq!(json, "\"covid-19\"");
        let back: DiseaseClass = serde_json::from_str("\"seasonal-allergy\"").unwrap();
        assert_eq!(back, DiseaseClass::SeasonalAllergy);
    }
}
