//! Engine configuration.
//!
//! All tunables live in one immutable, explicitly passed document: defaults
//! ← optional file ← `TRIAGE_*` environment overrides. Severity cutoffs and
//! recommendation templates are plain data here so they can be tested (and
//! rolled out) independently of the interpretation code.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{TriageError, TriageResult};
use crate::types::{DiseaseClass, Severity};

/// Disease classifier strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorStrategy {
    /// Legacy symptom×disease weight table + softmax.
    WeightedMatrix,
    /// Voting ensemble loaded from the model artifact.
    Ensemble,
}

/// Policy for fusing modalities whose class sets disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassMismatchPolicy {
    /// Mass unique to one modality keeps that modality's weighted value and
    /// the fused result renormalizes over the union.
    RedistributeProportional,
    /// Mass unique to one modality is dropped before renormalization.
    DropUnshared,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Schema-pinning version string; must match the loaded artifact.
    pub version: String,
    /// Versioned artifact path; `None` selects the built-in artifact.
    pub artifact_path: Option<PathBuf>,
    pub strategy: PredictorStrategy,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            version: crate::model::BUILTIN_MODEL_VERSION.to_string(),
            artifact_path: None,
            strategy: PredictorStrategy::WeightedMatrix,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionSettings {
    pub nlp_weight: f64,
    pub vision_weight: f64,
    pub class_mismatch: ClassMismatchPolicy,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            nlp_weight: 0.6,
            vision_weight: 0.4,
            class_mismatch: ClassMismatchPolicy::RedistributeProportional,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerSettings {
    /// Softmax temperature for the weighted-matrix scorer.
    pub temperature: f64,
    /// Sparse per-class weight overrides keyed by feature name; `None`
    /// selects the built-in table.
    pub class_weights: Option<BTreeMap<DiseaseClass, BTreeMap<String, f64>>>,
    /// Per-class bias overrides.
    pub class_bias: Option<BTreeMap<DiseaseClass, f64>>,
}

impl Default for ScorerSettings {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            class_weights: None,
            class_bias: None,
        }
    }
}

/// Minimum evidence required before a determined diagnosis is emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceGates {
    pub min_confidence: f64,
    pub min_symptom_count: usize,
}

impl Default for ConfidenceGates {
    fn default() -> Self {
        Self {
            min_confidence: 0.35,
            min_symptom_count: 1,
        }
    }
}

/// One severity cutoff row: confidence at or above `min_confidence` maps to
/// `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityCutoff {
    pub min_confidence: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityRule {
    pub disease: DiseaseClass,
    /// Rows ordered by descending `min_confidence`; first match wins.
    pub cutoffs: Vec<SeverityCutoff>,
}

/// Declarative disease×confidence → severity table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityPolicy {
    pub rules: Vec<SeverityRule>,
}

impl SeverityPolicy {
    pub fn severity_for(&self, disease: DiseaseClass, confidence: f64) -> Severity {
        self.rules
            .iter()
            .find(|r| r.disease == disease)
            .and_then(|r| {
                r.cutoffs
                    .iter()
                    .find(|c| confidence >= c.min_confidence)
                    .map(|c| c.severity)
            })
            .unwrap_or(Severity::Low)
    }
}

fn cutoffs(rows: &[(f64, Severity)]) -> Vec<SeverityCutoff> {
    rows.iter()
        .map(|&(min_confidence, severity)| SeverityCutoff {
            min_confidence,
            severity,
        })
        .collect()
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            rules: vec![
                SeverityRule {
                    disease: DiseaseClass::Covid19,
                    cutoffs: cutoffs(&[
                        (0.9, Severity::Critical),
                        (0.7, Severity::High),
                        (0.5, Severity::Moderate),
                        (0.0, Severity::Low),
                    ]),
                },
                SeverityRule {
                    disease: DiseaseClass::Influenza,
                    cutoffs: cutoffs(&[
                        (0.85, Severity::High),
                        (0.6, Severity::Moderate),
                        (0.0, Severity::Low),
                    ]),
                },
                SeverityRule {
                    disease: DiseaseClass::CommonCold,
                    cutoffs: cutoffs(&[(0.8, Severity::Moderate), (0.0, Severity::Low)]),
                },
                SeverityRule {
                    disease: DiseaseClass::SeasonalAllergy,
                    cutoffs: cutoffs(&[(0.8, Severity::Moderate), (0.0, Severity::Low)]),
                },
                SeverityRule {
                    disease: DiseaseClass::Other,
                    cutoffs: cutoffs(&[(0.0, Severity::Low)]),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiseaseRecommendations {
    pub disease: DiseaseClass,
    /// Ordered; position 0 is presented first.
    pub items: Vec<String>,
}

/// A detected signature promoting one recommendation to position 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureOverride {
    pub signature: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationPolicy {
    pub templates: Vec<DiseaseRecommendations>,
    pub signature_overrides: Vec<SignatureOverride>,
    /// Shown when the evidence is insufficient for a diagnosis.
    pub undetermined: Vec<String>,
}

impl RecommendationPolicy {
    pub fn template_for(&self, disease: DiseaseClass) -> &[String] {
        self.templates
            .iter()
            .find(|t| t.disease == disease)
            .map(|t| t.items.as_slice())
            .unwrap_or(&[])
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self {
            templates: vec![
                DiseaseRecommendations {
                    disease: DiseaseClass::Covid19,
                    items: strings(&[
                        "En yakın sağlık kuruluşuna başvurun ve PCR testi yaptırın.",
                        "Kendinizi evde izole edin.",
                        "Ateşinizi ve oksijen satürasyonunuzu düzenli takip edin.",
                        "Maske kullanın ve temaslılarınızı bilgilendirin.",
                    ]),
                },
                DiseaseRecommendations {
                    disease: DiseaseClass::Influenza,
                    items: strings(&[
                        "İstirahat edin ve bol sıvı tüketin.",
                        "Ateş düşürücü kullanımı için hekiminize danışın.",
                        "Belirtiler 48 saat içinde ağırlaşırsa sağlık kuruluşuna başvurun.",
                    ]),
                },
                DiseaseRecommendations {
                    disease: DiseaseClass::CommonCold,
                    items: strings(&[
                        "İstirahat edin ve bol sıvı tüketin.",
                        "Burun tıkanıklığı için tuzlu su spreyi kullanabilirsiniz.",
                        "Belirtiler bir haftadan uzun sürerse hekime başvurun.",
                    ]),
                },
                DiseaseRecommendations {
                    disease: DiseaseClass::SeasonalAllergy,
                    items: strings(&[
                        "Bilinen alerjenlerden uzak durun.",
                        "Antihistaminik kullanımı için hekiminize danışın.",
                        "Göz ve solunum belirtileri ağırlaşırsa alerji uzmanına başvurun.",
                    ]),
                },
                DiseaseRecommendations {
                    disease: DiseaseClass::Other,
                    items: strings(&[
                        "Belirtilerinizi izlemeye devam edin.",
                        "Yeni belirti eklenirse yeniden değerlendirme yapın.",
                    ]),
                },
            ],
            signature_overrides: vec![SignatureOverride {
                signature: "COVID_Core_Signature".to_string(),
                recommendation:
                    "Acil servisle iletişime geçin; nefes darlığı ciddi bir bulgudur."
                        .to_string(),
            }],
            undetermined: strings(&[
                "Belirtilerinizi daha ayrıntılı tarif edin.",
                "Değerlendirme için bir sağlık profesyoneline danışın.",
            ]),
        }
    }
}

/// Engine startup configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub model: ModelSettings,
    pub fusion: FusionSettings,
    pub scorer: ScorerSettings,
    pub gates: ConfidenceGates,
    pub severity: SeverityPolicy,
    pub recommendations: RecommendationPolicy,
}

impl TriageConfig {
    /// Load configuration: defaults ← optional file ← environment.
    ///
    /// Environment overrides use the `TRIAGE` prefix with `__` as the level
    /// separator, e.g. `TRIAGE__FUSION__NLP_WEIGHT=0.7`.
    pub fn load(path: Option<&Path>) -> TriageResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let raw = builder
            .add_source(config::Environment::with_prefix("TRIAGE").separator("__"))
            .build()
            .map_err(|e| TriageError::Config(e.to_string()))?;

        let parsed: Self = raw
            .try_deserialize()
            .map_err(|e| TriageError::Config(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn from_env() -> TriageResult<Self> {
        Self::load(None)
    }

    pub fn validate(&self) -> TriageResult<()> {
        let weight_sum = self.fusion.nlp_weight + self.fusion.vision_weight;
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(TriageError::Config(format!(
                "fusion weights must sum to 1.0, got {weight_sum}"
            )));
        }
        if self.fusion.nlp_weight < 0.0 || self.fusion.vision_weight < 0.0 {
            return Err(TriageError::Config(
                "fusion weights must be non-negative".to_string(),
            ));
        }
        if self.scorer.temperature <= 0.0 {
            return Err(TriageError::Config(
                "scorer temperature must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.gates.min_confidence) {
            return Err(TriageError::Config(
                "gates.min_confidence must be in [0, 1]".to_string(),
            ));
        }
        for rule in &self.severity.rules {
            for cutoff in &rule.cutoffs {
                if !(0.0..=1.0).contains(&cutoff.min_confidence) {
                    return Err(TriageError::Config(format!(
                        "severity cutoff {} for {} outside [0, 1]",
                        cutoff.min_confidence, rule.disease
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        TriageConfig::default().validate().unwrap();
    }

    #[test]
    fn default_fusion_weights_favor_text() {
        let config = TriageConfig::default();
        assert!((config.fusion.nlp_weight - 0.6).abs() < 1e-12);
        assert!((config.fusion.vision_weight - 0.4).abs() < 1e-12);
    }

    #[test]
    fn unbalanced_fusion_weights_are_rejected() {
        let mut config = TriageConfig::default();
        config.fusion.vision_weight = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn severity_table_picks_first_matching_cutoff() {
        let policy = SeverityPolicy::default();
        assert_eq!(
            policy.severity_for(DiseaseClass::Covid19, 0.95),
            Severity::Critical
        );
        assert_eq!(
            policy.severity_for(DiseaseClass::Covid19, 0.75),
            Severity::High
        );
        assert_eq!(
            policy.severity_for(DiseaseClass::CommonCold, 0.95),
            Severity::Moderate
        );
        assert_eq!(policy.severity_for(DiseaseClass::Other, 0.4), Severity::Low);
    }

    #[test]
    fn recommendation_templates_exist_for_every_class() {
        let policy = RecommendationPolicy::default();
        for disease in DiseaseClass::ALL {
            assert!(
                !policy.template_for(disease).is_empty(),
                "no template for {disease}"
            );
        }
        assert!(!policy.undetermined.is_empty());
    }

    #[test]
    fn config_round_trips_through_serde() {
        let config = TriageConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: TriageConfig = serde_json::from_str(&json).unwrap();
        back.validate().unwrap();
        assert_eq!(back.fusion.nlp_weight, config.fusion.nlp_weight);
    }
}
