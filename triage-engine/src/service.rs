//! Triage service facade.
//!
//! Wires the full pipeline — parse → features → classify → optional vision →
//! fuse → interpret — from one immutable configuration and the loaded model
//! artifact. Requests are handled with `&self` throughout: inference is
//! read-only and needs no request-level locking; the only shared mutable
//! state is the registry's lazily-initialized artifact handle.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use symptom_nlp::{SymptomLexicon, SymptomParser};
use tracing::{debug, info, warn};

use crate::classifier::{create_predictor, DiseasePredictor};
use crate::config::TriageConfig;
use crate::error::{TriageError, TriageResult};
use crate::features::FeatureEngineer;
use crate::fusion::FusionEngine;
use crate::interpreter::ClinicalInterpreter;
use crate::model::{ModelArtifact, ModelRegistry};
use crate::types::DiagnosisResult;
use crate::vision::{create_image_predictor, ImagePredictor};

/// One triage invocation: complaint text plus an optional radiograph blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageRequest {
    pub text: String,
    #[serde(default)]
    pub image: Option<Vec<u8>>,
}

impl TriageRequest {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }
}

/// Multi-modal triage engine.
pub struct TriageService {
    parser: SymptomParser,
    engineer: FeatureEngineer,
    predictor: Box<dyn DiseasePredictor>,
    vision: Option<Box<dyn ImagePredictor>>,
    fusion: FusionEngine,
    interpreter: ClinicalInterpreter,
    artifact: Arc<ModelArtifact>,
}

impl TriageService {
    /// Build the service against the process-wide model registry.
    pub fn new(config: TriageConfig) -> TriageResult<Self> {
        Self::with_registry(config, ModelRegistry::global())
    }

    /// Build the service against an explicit registry (staged rollouts and
    /// tests load artifacts side by side).
    pub fn with_registry(config: TriageConfig, registry: &ModelRegistry) -> TriageResult<Self> {
        config.validate()?;

        let version = config.model.version.clone();
        let artifact = match &config.model.artifact_path {
            Some(path) => registry.get_or_load(&version, path)?,
            None => registry.get_or_init(&version, || Ok(ModelArtifact::builtin(&version)))?,
        };

        let predictor = create_predictor(&config, &artifact)?;
        let vision = create_image_predictor(&artifact)?;
        let fusion = FusionEngine::new(config.fusion.clone())?;
        let interpreter = ClinicalInterpreter::new(
            config.severity.clone(),
            config.recommendations.clone(),
            config.gates.clone(),
            artifact.version.clone(),
        );

        info!(
            model_version = %artifact.version,
            predictor = predictor.name(),
            vision_enabled = vision.is_some(),
            "triage service ready"
        );

        Ok(Self {
            parser: SymptomParser::new(SymptomLexicon::turkish()),
            engineer: FeatureEngineer::new(),
            predictor,
            vision,
            fusion,
            interpreter,
            artifact,
        })
    }

    pub fn model_version(&self) -> &str {
        &self.artifact.version
    }

    /// Run the full pipeline for one request.
    pub fn diagnose(&self, request: &TriageRequest) -> TriageResult<DiagnosisResult> {
        let observations = self.parser.parse(&request.text);
        let features = self.engineer.build(&observations);
        let prediction = self.predictor.predict(&features)?;

        let vision_distribution = match (&request.image, &self.vision) {
            (Some(image), Some(predictor)) => match predictor.predict(image) {
                Ok(distribution) => Some(distribution),
                // A broken image disables the modality for this request
                // only; the text result still stands.
                Err(TriageError::ImageDecode(reason)) => {
                    warn!(%reason, "image modality disabled for this request");
                    None
                }
                Err(other) => return Err(other),
            },
            (Some(_), None) => {
                debug!("image supplied but the loaded model has no vision probe");
                None
            }
            _ => None,
        };

        let fused = self
            .fusion
            .fuse(&prediction.distribution, vision_distribution.as_ref())?;
        let signatures = self.engineer.signatures(&observations);
        let result = self
            .interpreter
            .interpret(fused, signatures, observations.detected());

        info!(
            disease = %result.disease,
            confidence = result.confidence,
            status = ?result.status,
            detected = result.detected_symptoms.len(),
            "diagnosis complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BUILTIN_MODEL_VERSION;
    use crate::types::{DiagnosisStatus, DiseaseClass};

    fn service() -> TriageService {
        TriageService::with_registry(TriageConfig::default(), &ModelRegistry::new()).unwrap()
    }

    #[test]
    fn text_only_request_produces_a_determined_result() {
        let result = service()
            .diagnose(&TriageRequest::text_only("ateşim var ve kaslarım ağrıyor"))
            .unwrap();
        result.probabilities.validate().unwrap();
        assert_eq!(result.status, DiagnosisStatus::Determined);
        assert_eq!(result.disease, result.probabilities.argmax().0);
        assert_eq!(result.metadata.model_version, BUILTIN_MODEL_VERSION);
    }

    #[test]
    fn builtin_model_has_no_vision_probe() {
        let service = service();
        assert!(service.vision.is_none());

        // An image on a text-only model degrades to text silently.
        let request = TriageRequest {
            text: "ateşim var".to_string(),
            image: Some(vec![1, 2, 3]),
        };
        let result = service.diagnose(&request).unwrap();
        assert_eq!(result.status, DiagnosisStatus::Determined);
    }

    #[test]
    fn undecodable_image_degrades_to_text_only() {
        let mut artifact = ModelArtifact::builtin("triage-vision-1");
        artifact.vision = Some(crate::vision::tests::test_params());

        let registry = ModelRegistry::new();
        registry
            .get_or_init("triage-vision-1", || Ok(artifact))
            .unwrap();

        let mut config = TriageConfig::default();
        config.model.version = "triage-vision-1".to_string();
        let service = TriageService::with_registry(config, &registry).unwrap();
        assert!(service.vision.is_some());

        let request = TriageRequest {
            text: "çok yüksek ateşim var ve nefes alamıyorum".to_string(),
            image: Some(b"not an image".to_vec()),
        };
        let with_broken_image = service.diagnose(&request).unwrap();
        let text_only = service
            .diagnose(&TriageRequest::text_only(request.text.clone()))
            .unwrap();

        assert_eq!(with_broken_image.disease, text_only.disease);
        assert_eq!(
            with_broken_image.probabilities.get(DiseaseClass::Covid19),
            text_only.probabilities.get(DiseaseClass::Covid19)
        );
    }

    #[test]
    fn service_reuses_the_registry_artifact() {
        let registry = ModelRegistry::new();
        let a = TriageService::with_registry(TriageConfig::default(), &registry).unwrap();
        let b = TriageService::with_registry(TriageConfig::default(), &registry).unwrap();
        assert!(Arc::ptr_eq(&a.artifact, &b.artifact));
    }
}
