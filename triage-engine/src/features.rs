//! Feature engineering: observation set → fixed-width feature vector.
//!
//! The schema is pinned to the model version: 14 raw symptom intensities,
//! 8 diagnostic signatures, 9 interaction terms and 2 confidence indicators,
//! always in the same order. A model artifact whose schema disagrees fails
//! fast at load time; nothing here reorders or pads silently.

use serde::{Deserialize, Serialize};
use symptom_nlp::{Symptom, SymptomObservationSet};

use crate::types::DiagnosticSignature;

/// Fixed feature-vector width for the current schema.
pub const FEATURE_COUNT: usize = 33;

/// Ordered feature names; index equals position in the vector.
pub const FEATURE_SCHEMA: [&str; FEATURE_COUNT] = [
    // Raw symptom intensities, catalog order
    "fever",
    "dry_cough",
    "productive_cough",
    "sore_throat",
    "rhinorrhea",
    "nasal_congestion",
    "sneezing",
    "myalgia",
    "fatigue",
    "dyspnea",
    "anosmia",
    "ocular_pruritus",
    "lacrimation",
    "chills",
    // Diagnostic signatures
    "sig_covid_core",
    "sig_covid_respiratory",
    "sig_flu_systemic",
    "sig_flu_onset",
    "sig_cold_catarrhal",
    "sig_cold_throat",
    "sig_allergy_ocular",
    "sig_allergy_nasal",
    // Interaction terms over the confusable pairs
    "ix_anosmia_dry_cough",
    "ix_anosmia_fever",
    "ix_dyspnea_fever",
    "ix_myalgia_chills",
    "ix_myalgia_fever",
    "ix_fatigue_fever",
    "ix_sneezing_ocular_pruritus",
    "ix_rhinorrhea_sneezing",
    "ix_rhinorrhea_lacrimation",
    // Confidence indicators
    "detected_count",
    "max_intensity",
];

/// A disease-specific symptom combination.
///
/// Scores as the minimum member intensity, zeroed when any required-absent
/// symptom is observed present.
pub struct SignatureSpec {
    pub name: &'static str,
    pub members: &'static [Symptom],
    pub required_absent: &'static [Symptom],
}

/// Signature catalog, in schema order.
pub const SIGNATURES: [SignatureSpec; 8] = [
    SignatureSpec {
        name: "COVID_Core_Signature",
        members: &[Symptom::Anosmia, Symptom::Dyspnea],
        required_absent: &[],
    },
    SignatureSpec {
        name: "COVID_Respiratory_Signature",
        members: &[Symptom::Fever, Symptom::DryCough, Symptom::Dyspnea],
        required_absent: &[],
    },
    SignatureSpec {
        name: "Influenza_Systemic_Signature",
        members: &[Symptom::Myalgia, Symptom::Chills, Symptom::Fatigue],
        required_absent: &[],
    },
    SignatureSpec {
        name: "Influenza_Onset_Signature",
        members: &[Symptom::Fever, Symptom::Myalgia],
        required_absent: &[],
    },
    SignatureSpec {
        name: "Cold_Catarrhal_Signature",
        members: &[Symptom::Rhinorrhea, Symptom::Sneezing],
        required_absent: &[Symptom::Fever],
    },
    SignatureSpec {
        name: "Cold_Throat_Signature",
        members: &[Symptom::SoreThroat, Symptom::NasalCongestion],
        required_absent: &[Symptom::Dyspnea],
    },
    SignatureSpec {
        name: "Allergy_Ocular_Signature",
        members: &[Symptom::OcularPruritus, Symptom::Sneezing],
        required_absent: &[Symptom::Fever],
    },
    SignatureSpec {
        name: "Allergy_Nasal_Signature",
        members: &[Symptom::Rhinorrhea, Symptom::Lacrimation],
        required_absent: &[Symptom::Myalgia],
    },
];

/// Interaction pairs, in schema order.
const INTERACTIONS: [(Symptom, Symptom); 9] = [
    (Symptom::Anosmia, Symptom::DryCough),
    (Symptom::Anosmia, Symptom::Fever),
    (Symptom::Dyspnea, Symptom::Fever),
    (Symptom::Myalgia, Symptom::Chills),
    (Symptom::Myalgia, Symptom::Fever),
    (Symptom::Fatigue, Symptom::Fever),
    (Symptom::Sneezing, Symptom::OcularPruritus),
    (Symptom::Rhinorrhea, Symptom::Sneezing),
    (Symptom::Rhinorrhea, Symptom::Lacrimation),
];

/// Fixed-width, schema-ordered feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value by schema name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_SCHEMA
            .iter()
            .position(|&f| f == name)
            .and_then(|i| self.values.get(i).copied())
    }
}

/// Derives the feature vector from a parsed observation set.
///
/// Pure and deterministic: identical observation sets produce bit-identical
/// vectors.
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer;

impl FeatureEngineer {
    pub fn new() -> Self {
        Self
    }

    pub fn schema(&self) -> &'static [&'static str] {
        &FEATURE_SCHEMA
    }

    pub fn build(&self, obs: &SymptomObservationSet) -> FeatureVector {
        let mut values = Vec::with_capacity(FEATURE_COUNT);

        for symptom in Symptom::ALL {
            values.push(obs.intensity_of(symptom));
        }
        for spec in &SIGNATURES {
            values.push(signature_score(spec, obs));
        }
        for (a, b) in INTERACTIONS {
            values.push(obs.intensity_of(a) * obs.intensity_of(b));
        }
        values.push(obs.detected_count() as f64 / Symptom::ALL.len() as f64);
        values.push(obs.max_intensity());

        FeatureVector { values }
    }

    /// Signatures scoring above zero, for explainability and
    /// recommendation reordering.
    pub fn signatures(&self, obs: &SymptomObservationSet) -> Vec<DiagnosticSignature> {
        SIGNATURES
            .iter()
            .filter_map(|spec| {
                let score = signature_score(spec, obs);
                (score > 0.0).then(|| DiagnosticSignature {
                    name: spec.name.to_string(),
                    score,
                })
            })
            .collect()
    }
}

fn signature_score(spec: &SignatureSpec, obs: &SymptomObservationSet) -> f64 {
    let blocked = spec
        .required_absent
        .iter()
        .any(|&s| obs.observation(s).present);
    if blocked {
        return 0.0;
    }
    spec.members
        .iter()
        .map(|&s| obs.intensity_of(s))
        .fold(1.0, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use symptom_nlp::{SymptomLexicon, SymptomParser};

    fn observations(text: &str) -> SymptomObservationSet {
        SymptomParser::new(SymptomLexicon::turkish()).parse(text)
    }

    #[test]
    fn schema_width_matches_constant() {
        assert_eq!(FEATURE_SCHEMA.len(), FEATURE_COUNT);
        let vector = FeatureEngineer::new().build(&SymptomObservationSet::all_absent());
        assert_eq!(vector.len(), FEATURE_COUNT);
    }

    #[test]
    fn schema_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for name in FEATURE_SCHEMA {
            assert!(seen.insert(name), "{name} appears twice in the schema");
        }
    }

    #[test]
    fn all_absent_yields_zero_vector() {
        let vector = FeatureEngineer::new().build(&SymptomObservationSet::all_absent());
        assert!(vector.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn build_is_deterministic() {
        let obs = observations("çok yüksek ateşim var, nefes alamıyorum");
        let engineer = FeatureEngineer::new();
        let a = engineer.build(&obs);
        let b = engineer.build(&obs);
        assert_eq!(a.values(), b.values());
    }

    #[test]
    fn signature_takes_minimum_member_intensity() {
        let obs = observations("çok ateşim var ve kaslarım ağrıyor");
        let vector = FeatureEngineer::new().build(&obs);
        // fever boosted to 1.0, myalgia at base 0.7 → onset signature 0.7
        assert!((vector.get("sig_flu_onset").unwrap() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn required_absent_symptom_blocks_signature() {
        let with_fever = observations("burnum akıyor, hapşırıyorum ve ateşim var");
        let vector = FeatureEngineer::new().build(&with_fever);
        assert_eq!(vector.get("sig_cold_catarrhal").unwrap(), 0.0);

        let without_fever = observations("burnum akıyor ve hapşırıyorum");
        let vector = FeatureEngineer::new().build(&without_fever);
        assert!(vector.get("sig_cold_catarrhal").unwrap() > 0.0);
    }

    #[test]
    fn negated_member_zeroes_signature() {
        let obs = observations("hapşırıyorum ama göz kaşıntım yok");
        let vector = FeatureEngineer::new().build(&obs);
        assert_eq!(vector.get("sig_allergy_ocular").unwrap(), 0.0);
    }

    #[test]
    fn interaction_terms_are_products() {
        let obs = observations("koku alamıyorum ve öksürüyorum");
        let vector = FeatureEngineer::new().build(&obs);
        let expected = 0.7 * 0.7;
        assert!((vector.get("ix_anosmia_dry_cough").unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn confidence_indicators_track_observations() {
        let obs = observations("çok ateşim var ve öksürüyorum");
        let vector = FeatureEngineer::new().build(&obs);
        assert!((vector.get("detected_count").unwrap() - 2.0 / 14.0).abs() < 1e-12);
        assert!((vector.get("max_intensity").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn detected_signatures_carry_canonical_names() {
        let obs = observations("nefes alamıyorum ve koku alamıyorum");
        let signatures = FeatureEngineer::new().signatures(&obs);
        assert!(signatures
            .iter()
            .any(|s| s.name == "COVID_Core_Signature" && s.score > 0.0));
    }
}
