//! Turkish symptom lexicon.
//!
//! Keyword phrases, negation markers and intensity markers used by the
//! parser. The lexicon is an explicitly passed, immutable value so multiple
//! model versions can run side by side with their own vocabularies; phrases
//! are stored pre-folded (see [`crate::normalize::fold`]) and match as
//! token-prefix sequences to absorb Turkish agglutinative suffixes
//! ("öksür" matches "öksürüyorum").

use serde::{Deserialize, Serialize};

use crate::symptom::Symptom;

/// One phrase variant: an ordered sequence of folded token prefixes.
pub type Phrase = Vec<String>;

/// Keyword phrases for one catalog symptom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub symptom: Symptom,
    pub phrases: Vec<Phrase>,
}

/// Symptom keyword/negation/intensity dictionaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomLexicon {
    pub entries: Vec<LexiconEntry>,
    /// Markers forcing `present = false` regardless of keyword hits.
    pub negation_markers: Vec<String>,
    /// Markers raising observed intensity.
    pub boosters: Vec<String>,
    /// Markers lowering observed intensity.
    pub reducers: Vec<String>,
    /// Conjunctions that close a clause ("ama", "fakat", "ancak").
    pub clause_breakers: Vec<String>,
    /// Marker search window around a keyword hit, in tokens.
    pub marker_window: usize,
    /// Intensity assigned to an unqualified keyword hit.
    pub base_intensity: f64,
    /// Intensity delta applied per booster/reducer hit.
    pub marker_step: f64,
}

fn phrase(words: &[&str]) -> Phrase {
    words.iter().map(|w| w.to_string()).collect()
}

fn entry(symptom: Symptom, phrases: &[&[&str]]) -> LexiconEntry {
    LexiconEntry {
        symptom,
        phrases: phrases.iter().map(|p| phrase(p)).collect(),
    }
}

impl SymptomLexicon {
    /// Built-in Turkish patient-vocabulary lexicon.
    pub fn turkish() -> Self {
        Self {
            entries: vec![
                entry(Symptom::Fever, &[&["ates"]]),
                entry(Symptom::DryCough, &[&["kuru", "oksur"], &["oksur"]]),
                entry(
                    Symptom::ProductiveCough,
                    &[&["balgamli", "oksur"], &["balgam"]],
                ),
                entry(
                    Symptom::SoreThroat,
                    &[&["bogaz", "agri"], &["bogaz", "yan"]],
                ),
                entry(Symptom::Rhinorrhea, &[&["burun", "ak"], &["burnum", "ak"]]),
                entry(
                    Symptom::NasalCongestion,
                    &[
                        &["burun", "tikan"],
                        &["burnum", "tikan"],
                        &["burun", "tikali"],
                        &["burnum", "tikali"],
                    ],
                ),
                entry(Symptom::Sneezing, &[&["hapsir"]]),
                entry(
                    Symptom::Myalgia,
                    &[
                        &["kas", "agri"],
                        &["vucut", "agri"],
                        &["vucudum", "agri"],
                    ],
                ),
                entry(
                    Symptom::Fatigue,
                    &[&["yorgun"], &["halsiz"], &["bitkin"]],
                ),
                entry(Symptom::Dyspnea, &[&["nefes", "dar"], &["nefes", "al"]]),
                entry(Symptom::Anosmia, &[&["koku", "al"], &["koku", "duym"]]),
                entry(Symptom::OcularPruritus, &[&["goz", "kasin"]]),
                entry(
                    Symptom::Lacrimation,
                    &[&["goz", "sulan"], &["goz", "yasar"]],
                ),
                entry(
                    Symptom::Chills,
                    &[&["titr"], &["usume"], &["usuyorum"]],
                ),
            ],
            negation_markers: vec![
                "yok".to_string(),
                "degil".to_string(),
                "hayir".to_string(),
            ],
            boosters: vec![
                "cok".to_string(),
                "asiri".to_string(),
                "siddetli".to_string(),
            ],
            reducers: vec!["hafif".to_string(), "biraz".to_string()],
            clause_breakers: vec![
                "ama".to_string(),
                "fakat".to_string(),
                "ancak".to_string(),
            ],
            marker_window: 3,
            base_intensity: 0.7,
            marker_step: 0.3,
        }
    }
}

impl Default for SymptomLexicon {
    fn default() -> Self {
        Self::turkish()
    }
}
