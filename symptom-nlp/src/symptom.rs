use serde::{Deserialize, Serialize};

/// Canonical symptom catalog.
///
/// The catalog is immutable and ordered; every observation set carries
/// exactly one entry per symptom, in this order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    Fever,
    DryCough,
    ProductiveCough,
    SoreThroat,
    Rhinorrhea,
    NasalCongestion,
    Sneezing,
    Myalgia,
    Fatigue,
    Dyspnea,
    Anosmia,
    OcularPruritus,
    Lacrimation,
    Chills,
}

impl Symptom {
    /// Full catalog in canonical order.
    pub const ALL: [Symptom; 14] = [
        Symptom::Fever,
        Symptom::DryCough,
        Symptom::ProductiveCough,
        Symptom::SoreThroat,
        Symptom::Rhinorrhea,
        Symptom::NasalCongestion,
        Symptom::Sneezing,
        Symptom::Myalgia,
        Symptom::Fatigue,
        Symptom::Dyspnea,
        Symptom::Anosmia,
        Symptom::OcularPruritus,
        Symptom::Lacrimation,
        Symptom::Chills,
    ];

    /// Stable snake_case identifier, matching the serde representation.
    pub fn identifier(&self) -> &'static str {
        match self {
            Symptom::Fever => "fever",
            Symptom::DryCough => "dry_cough",
            Symptom::ProductiveCough => "productive_cough",
            Symptom::SoreThroat => "sore_throat",
            Symptom::Rhinorrhea => "rhinorrhea",
            Symptom::NasalCongestion => "nasal_congestion",
            Symptom::Sneezing => "sneezing",
            Symptom::Myalgia => "myalgia",
            Symptom::Fatigue => "fatigue",
            Symptom::Dyspnea => "dyspnea",
            Symptom::Anosmia => "anosmia",
            Symptom::OcularPruritus => "ocular_pruritus",
            Symptom::Lacrimation => "lacrimation",
            Symptom::Chills => "chills",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for symptom in Symptom::ALL {
            assert!(seen.insert(symptom), "{symptom:?} listed twice");
        }
    }

    #[test]
    fn identifier_matches_serde_name() {
        for symptom in Symptom::ALL {
            let json = serde_json::to_string(&symptom).unwrap();
            assert_eq!(json, format!("\"{}\"", symptom.identifier()));
        }
    }
}
