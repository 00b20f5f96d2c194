use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::symptom::Symptom;

/// A single parsed symptom observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymptomObservation {
    pub symptom: Symptom,
    pub present: bool,
    /// Observed intensity in [0, 1]; 0.0 when absent or negated.
    pub intensity: f64,
    /// True when an explicit negation marker overrode a keyword hit.
    pub negated: bool,
}

impl SymptomObservation {
    fn absent(symptom: Symptom) -> Self {
        Self {
            symptom,
            present: false,
            intensity: 0.0,
            negated: false,
        }
    }
}

/// One observation per catalog symptom, built per request.
///
/// Keyed storage makes duplicate entries impossible; the set is immutable
/// once the parser hands it out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomObservationSet {
    observations: BTreeMap<Symptom, SymptomObservation>,
}

impl SymptomObservationSet {
    /// Set with every catalog symptom marked absent.
    pub fn all_absent() -> Self {
        let observations = Symptom::ALL
            .iter()
            .map(|&s| (s, SymptomObservation::absent(s)))
            .collect();
        Self { observations }
    }

    /// Build a set programmatically, e.g. from a structured intake form.
    ///
    /// Unlisted symptoms stay absent; negation is final, as in parsing.
    pub fn from_observations<I>(items: I) -> Self
    where
        I: IntoIterator<Item = SymptomObservation>,
    {
        let mut set = Self::all_absent();
        for obs in items {
            if obs.negated {
                set.record_negated(obs.symptom);
            } else if obs.present {
                set.record_present(obs.symptom, obs.intensity);
            }
        }
        set
    }

    /// Record a positive keyword hit; multiple hits keep the maximum
    /// intensity. An earlier negation for the same symptom is final.
    pub(crate) fn record_present(&mut self, symptom: Symptom, intensity: f64) {
        if let Some(obs) = self.observations.get_mut(&symptom) {
            if obs.negated {
                return;
            }
            obs.present = true;
            obs.intensity = obs.intensity.max(intensity.clamp(0.0, 1.0));
        }
    }

    /// Record an explicit negation; overrides any positive hit.
    pub(crate) fn record_negated(&mut self, symptom: Symptom) {
        if let Some(obs) = self.observations.get_mut(&symptom) {
            obs.present = false;
            obs.intensity = 0.0;
            obs.negated = true;
        }
    }

    pub fn observation(&self, symptom: Symptom) -> SymptomObservation {
        self.observations
            .get(&symptom)
            .copied()
            .unwrap_or_else(|| SymptomObservation::absent(symptom))
    }

    /// Intensity if present, else 0.0.
    pub fn intensity_of(&self, symptom: Symptom) -> f64 {
        let obs = self.observation(symptom);
        if obs.present {
            obs.intensity
        } else {
            0.0
        }
    }

    /// Symptoms observed present, in catalog order.
    pub fn detected(&self) -> Vec<Symptom> {
        self.observations
            .values()
            .filter(|o| o.present)
            .map(|o| o.symptom)
            .collect()
    }

    pub fn detected_count(&self) -> usize {
        self.observations.values().filter(|o| o.present).count()
    }

    pub fn max_intensity(&self) -> f64 {
        self.observations
            .values()
            .filter(|o| o.present)
            .map(|o| o.intensity)
            .fold(0.0, f64::max)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymptomObservation> {
        self.observations.values()
    }
}

impl Default for SymptomObservationSet {
    fn default() -> Self {
        Self::all_absent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_absent_covers_catalog() {
        let set = SymptomObservationSet::all_absent();
        assert_eq!(set.iter().count(), Symptom::ALL.len());
        assert_eq!(set.detected_count(), 0);
        assert_eq!(set.max_intensity(), 0.0);
    }

    #[test]
    fn multiple_hits_keep_max_intensity() {
        let mut set = SymptomObservationSet::all_absent();
        set.record_present(Symptom::Fever, 0.4);
        set.record_present(Symptom::Fever, 0.9);
        set.record_present(Symptom::Fever, 0.2);
        assert_eq!(set.observation(Symptom::Fever).intensity, 0.9);
    }

    #[test]
    fn negation_is_final() {
        let mut set = SymptomObservationSet::all_absent();
        set.record_present(Symptom::Fever, 0.7);
        set.record_negated(Symptom::Fever);
        set.record_present(Symptom::Fever, 1.0);

        let obs = set.observation(Symptom::Fever);
        assert!(!obs.present);
        assert!(obs.negated);
        assert_eq!(obs.intensity, 0.0);
    }

    #[test]
    fn intensity_is_clamped() {
        let mut set = SymptomObservationSet::all_absent();
        set.record_present(Symptom::Chills, 1.7);
        assert_eq!(set.observation(Symptom::Chills).intensity, 1.0);
    }
}
