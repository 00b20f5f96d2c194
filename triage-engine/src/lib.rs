//! Multi-modal clinical triage inference engine
//!
//! Converts patient-reported symptoms (free-form Turkish text) and,
//! optionally, a chest radiograph into a calibrated probability distribution
//! over a fixed set of differential diagnoses, plus a severity rating and
//! ordered recommendations. The engine assists, never replaces, clinical
//! judgement in emergency pre-triage, telemedicine intake and symptom-checker
//! settings.
//!
//! # Pipeline
//!
//! 1. **Parse** — Turkish complaint text → structured observation set
//!    (`symptom-nlp`)
//! 2. **Engineer** — observation set → fixed-schema feature vector with
//!    disease-specific diagnostic signatures
//! 3. **Classify** — feature vector → disease distribution, behind one
//!    swappable strategy (voting ensemble or legacy weighted-matrix scorer)
//! 4. **Vision** — optional radiograph → independent distribution; decode
//!    failures disable only this modality
//! 5. **Fuse** — weighted late fusion of the modality distributions
//! 6. **Interpret** — fused distribution → diagnosis, severity and ordered
//!    recommendations from declarative configuration tables
//!
//! # Features
//!
//! - **Strategy classifiers**: ensemble and weighted-matrix scorers behind
//!   one `predict` contract, selected by configuration
//! - **Fail-fast schemas**: a model artifact trained on a different feature
//!   schema is rejected at load, never truncated or padded
//! - **Guarded model loading**: at most one artifact load per model version
//!   process-wide; requests share the artifact read-only
//! - **Explicit degradation**: insufficient evidence yields an
//!   insufficient-information result, never a fabricated confident diagnosis
//!
//! # Example Usage
//!
//! ```rust
//! use triage_engine::{TriageConfig, TriageRequest, TriageService};
//!
//! # fn example() -> Result<(), triage_engine::TriageError> {
//! let service = TriageService::new(TriageConfig::default())?;
//! let result = service.diagnose(&TriageRequest::text_only(
//!     "Çok yüksek ateşim var ve nefes alamıyorum",
//! ))?;
//!
//! println!("{} ({:.2})", result.disease, result.confidence);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod fusion;
pub mod interpreter;
pub mod model;
pub mod service;
pub mod types;
pub mod vision;

pub use symptom_nlp::{
    Symptom, SymptomLexicon, SymptomObservation, SymptomObservationSet, SymptomParser,
};

pub use classifier::{DiseasePredictor, MemberVote, Prediction};
pub use config::*;
pub use error::*;
pub use features::{FeatureEngineer, FeatureVector, FEATURE_COUNT, FEATURE_SCHEMA};
pub use fusion::FusionEngine;
pub use interpreter::ClinicalInterpreter;
pub use model::{
    EnsembleParams, MemberParams, ModelArtifact, ModelRegistry, VisionParams,
    BUILTIN_MODEL_VERSION,
};
pub use service::*;
pub use types::*;
pub use vision::{ImagePredictor, LinearProbeClassifier};
