//! Clinical interpretation of the fused distribution.
//!
//! Pure data-driven mapping: the configured disease×confidence table picks
//! the severity, per-disease templates supply ordered recommendations, and
//! detected signatures can promote a recommendation to position 0. Requests
//! without enough evidence produce an explicit insufficient-information
//! result instead of a fabricated confident diagnosis. No I/O, never
//! blocks.

use chrono::Utc;
use symptom_nlp::Symptom;
use tracing::debug;
use uuid::Uuid;

use crate::config::{ConfidenceGates, RecommendationPolicy, SeverityPolicy};
use crate::types::{
    DiagnosisResult, DiagnosisStatus, DiagnosticSignature, ProbabilityDistribution, ResultMetadata,
    Severity,
};

pub struct ClinicalInterpreter {
    severity: SeverityPolicy,
    recommendations: RecommendationPolicy,
    gates: ConfidenceGates,
    model_version: String,
}

impl ClinicalInterpreter {
    pub fn new(
        severity: SeverityPolicy,
        recommendations: RecommendationPolicy,
        gates: ConfidenceGates,
        model_version: String,
    ) -> Self {
        Self {
            severity,
            recommendations,
            gates,
            model_version,
        }
    }

    pub fn interpret(
        &self,
        fused: ProbabilityDistribution,
        signatures: Vec<DiagnosticSignature>,
        detected_symptoms: Vec<Symptom>,
    ) -> DiagnosisResult {
        let (disease, confidence) = fused.argmax();

        let sufficient = detected_symptoms.len() >= self.gates.min_symptom_count
            && confidence >= self.gates.min_confidence;
        let status = if sufficient {
            DiagnosisStatus::Determined
        } else {
            DiagnosisStatus::InsufficientInformation
        };

        let severity = match status {
            DiagnosisStatus::Determined => self.severity.severity_for(disease, confidence),
            DiagnosisStatus::InsufficientInformation => Severity::Undetermined,
        };

        let mut recommendations: Vec<String> = match status {
            DiagnosisStatus::Determined => {
                self.recommendations.template_for(disease).to_vec()
            }
            DiagnosisStatus::InsufficientInformation => {
                self.recommendations.undetermined.clone()
            }
        };

        // Detected signatures promote their recommendation to position 0,
        // regardless of overall severity.
        for override_rule in &self.recommendations.signature_overrides {
            let triggered = signatures
                .iter()
                .any(|s| s.name == override_rule.signature);
            if triggered {
                recommendations.retain(|r| r != &override_rule.recommendation);
                recommendations.insert(0, override_rule.recommendation.clone());
            }
        }

        debug!(
            disease = %disease,
            confidence,
            ?severity,
            ?status,
            signatures = signatures.len(),
            "interpreted fused distribution"
        );

        DiagnosisResult {
            disease,
            confidence,
            probabilities: fused,
            detected_symptoms,
            diagnostic_signatures: signatures,
            severity,
            recommendations,
            status,
            metadata: ResultMetadata {
                id: Uuid::new_v4(),
                timestamp: Utc::now(),
                model_version: self.model_version.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiseaseClass;

    fn interpreter() -> ClinicalInterpreter {
        ClinicalInterpreter::new(
            SeverityPolicy::default(),
            RecommendationPolicy::default(),
            ConfidenceGates::default(),
            "triage-wm-1".to_string(),
        )
    }

    fn peaked(disease: DiseaseClass, p: f64) -> ProbabilityDistribution {
        let rest = (1.0 - p) / (DiseaseClass::ALL.len() - 1) as f64;
        ProbabilityDistribution::from_weights(
            DiseaseClass::ALL
                .iter()
                .map(|&c| (c, if c == disease { p } else { rest })),
        )
        .unwrap()
    }

    #[test]
    fn disease_is_argmax_and_confidence_its_probability() {
        let result = interpreter().interpret(
            peaked(DiseaseClass::Influenza, 0.7),
            vec![],
            vec![Symptom::Fever, Symptom::Myalgia],
        );
        assert_eq!(result.disease, DiseaseClass::Influenza);
        assert!((result.confidence - 0.7).abs() < 1e-9);
        assert_eq!(result.status, DiagnosisStatus::Determined);
        assert_eq!(result.severity, Severity::Moderate);
        assert_eq!(result.metadata.model_version, "triage-wm-1");
    }

    #[test]
    fn high_confidence_covid_is_critical() {
        let result = interpreter().interpret(
            peaked(DiseaseClass::Covid19, 0.95),
            vec![],
            vec![Symptom::Fever, Symptom::Dyspnea],
        );
        assert_eq!(result.severity, Severity::Critical);
    }

    #[test]
    fn no_detected_symptoms_is_insufficient_information() {
        let result = interpreter().interpret(peaked(DiseaseClass::Other, 0.45), vec![], vec![]);
        assert_eq!(result.status, DiagnosisStatus::InsufficientInformation);
        assert_eq!(result.severity, Severity::Undetermined);
        assert_eq!(
            result.recommendations,
            RecommendationPolicy::default().undetermined
        );
    }

    #[test]
    fn low_confidence_is_insufficient_information() {
        let result = interpreter().interpret(
            peaked(DiseaseClass::CommonCold, 0.25),
            vec![],
            vec![Symptom::Rhinorrhea],
        );
        assert_eq!(result.status, DiagnosisStatus::InsufficientInformation);
    }

    #[test]
    fn dyspnea_signature_promotes_emergency_contact() {
        let signatures = vec![DiagnosticSignature {
            name: "COVID_Core_Signature".to_string(),
            score: 0.7,
        }];
        let result = interpreter().interpret(
            peaked(DiseaseClass::Covid19, 0.8),
            signatures,
            vec![Symptom::Dyspnea, Symptom::Anosmia],
        );

        let expected = &RecommendationPolicy::default().signature_overrides[0].recommendation;
        assert_eq!(&result.recommendations[0], expected);
        // The disease template still follows.
        assert!(result.recommendations.len() > 1);
    }

    #[test]
    fn promotion_applies_even_when_undetermined() {
        let signatures = vec![DiagnosticSignature {
            name: "COVID_Core_Signature".to_string(),
            score: 0.4,
        }];
        let result =
            interpreter().interpret(peaked(DiseaseClass::Covid19, 0.3), signatures, vec![
                Symptom::Dyspnea,
            ]);

        assert_eq!(result.status, DiagnosisStatus::InsufficientInformation);
        let expected = &RecommendationPolicy::default().signature_overrides[0].recommendation;
        assert_eq!(&result.recommendations[0], expected);
    }

    #[test]
    fn undetected_signature_does_not_reorder() {
        let result = interpreter().interpret(
            peaked(DiseaseClass::CommonCold, 0.8),
            vec![],
            vec![Symptom::Rhinorrhea, Symptom::Sneezing],
        );
        let template = RecommendationPolicy::default();
        assert_eq!(
            result.recommendations,
            template.template_for(DiseaseClass::CommonCold)
        );
    }
}
