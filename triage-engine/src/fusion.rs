//! Late fusion of modality distributions.
//!
//! Shared classes combine as `fused[c] = w_nlp·nlp[c] + w_vision·vision[c]`
//! followed by renormalization. A missing vision distribution degrades to
//! the text result with the nlp weight renormalized to 1.0. Class sets that
//! disagree fuse over the intersection; mass unique to one modality follows
//! the configured [`ClassMismatchPolicy`] and the disagreement is logged,
//! never fatal.

use std::collections::BTreeSet;

use tracing::warn;

use crate::config::{ClassMismatchPolicy, FusionSettings};
use crate::error::{TriageError, TriageResult};
use crate::types::{DiseaseClass, ProbabilityDistribution};

pub struct FusionEngine {
    settings: FusionSettings,
}

impl FusionEngine {
    pub fn new(settings: FusionSettings) -> TriageResult<Self> {
        let sum = settings.nlp_weight + settings.vision_weight;
        if (sum - 1.0).abs() > 1e-6 || settings.nlp_weight < 0.0 || settings.vision_weight < 0.0 {
            return Err(TriageError::Config(format!(
                "fusion weights {}/{} are not a convex pair",
                settings.nlp_weight, settings.vision_weight
            )));
        }
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &FusionSettings {
        &self.settings
    }

    /// Fuse the text distribution with an optional vision distribution.
    pub fn fuse(
        &self,
        nlp: &ProbabilityDistribution,
        vision: Option<&ProbabilityDistribution>,
    ) -> TriageResult<ProbabilityDistribution> {
        let Some(vision) = vision else {
            // Vision absent: the nlp weight renormalizes to 1.0.
            return Ok(nlp.clone());
        };

        let nlp_classes: BTreeSet<DiseaseClass> = nlp.classes().collect();
        let vision_classes: BTreeSet<DiseaseClass> = vision.classes().collect();
        if nlp_classes != vision_classes {
            warn!(
                nlp_classes = nlp_classes.len(),
                vision_classes = vision_classes.len(),
                policy = ?self.settings.class_mismatch,
                "modality class sets disagree; fusing over the intersection"
            );
        }

        let w_nlp = self.settings.nlp_weight;
        let w_vision = self.settings.vision_weight;
        let mut fused: Vec<(DiseaseClass, f64)> = Vec::new();

        for &class in nlp_classes.union(&vision_classes) {
            let in_nlp = nlp_classes.contains(&class);
            let in_vision = vision_classes.contains(&class);
            let weight = match (in_nlp, in_vision) {
                (true, true) => w_nlp * nlp.get(class) + w_vision * vision.get(class),
                // Unique to one modality: policy decides what the mass does.
                (true, false) => match self.settings.class_mismatch {
                    ClassMismatchPolicy::RedistributeProportional => w_nlp * nlp.get(class),
                    ClassMismatchPolicy::DropUnshared => continue,
                },
                (false, true) => match self.settings.class_mismatch {
                    ClassMismatchPolicy::RedistributeProportional => w_vision * vision.get(class),
                    ClassMismatchPolicy::DropUnshared => continue,
                },
                (false, false) => continue,
            };
            fused.push((class, weight));
        }

        ProbabilityDistribution::from_weights(fused)
    }
}
