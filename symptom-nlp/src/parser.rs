//! Symptom parser: free-form Turkish text → observation set.

use itertools::Itertools;
use tracing::debug;

use crate::lexicon::{Phrase, SymptomLexicon};
use crate::normalize::{clauses, fold};
use crate::observation::SymptomObservationSet;
use crate::symptom::Symptom;

/// A phrase hit inside one clause, spanning `start..end` tokens.
struct PhraseHit {
    symptom: Symptom,
    start: usize,
    end: usize,
}

/// Parses patient complaint text against a [`SymptomLexicon`].
///
/// Parsing is total: any input, including empty or garbage text, yields a
/// valid observation set.
#[derive(Debug, Clone)]
pub struct SymptomParser {
    lexicon: SymptomLexicon,
}

impl SymptomParser {
    pub fn new(lexicon: SymptomLexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &SymptomLexicon {
        &self.lexicon
    }

    /// Parse complaint text into one observation per catalog symptom.
    pub fn parse(&self, text: &str) -> SymptomObservationSet {
        let mut set = SymptomObservationSet::all_absent();
        if text.trim().is_empty() {
            return set;
        }

        let folded = fold(text);
        for clause in clauses(&folded, &self.lexicon.clause_breakers) {
            self.scan_clause(&clause, &mut set);
        }

        debug!(
            detected = set.detected_count(),
            max_intensity = set.max_intensity(),
            "parsed symptom text"
        );
        set
    }

    /// Match phrases within one clause and fold marker context into the set.
    fn scan_clause(&self, tokens: &[String], set: &mut SymptomObservationSet) {
        for hit in self.claim_hits(tokens) {
            let (hit_start, hit_end) = (hit.start, hit.end);
            let window_start = hit_start.saturating_sub(self.lexicon.marker_window);
            let window_end = (hit_end + self.lexicon.marker_window).min(tokens.len());
            let window = move || {
                tokens[window_start..window_end]
                    .iter()
                    .enumerate()
                    .map(move |(i, t)| (window_start + i, t.as_str()))
                    .filter(move |&(idx, _)| idx < hit_start || idx >= hit_end)
                    .map(|(_, t)| t)
            };

            let negated = window()
                .any(|t| self.lexicon.negation_markers.iter().any(|m| t.starts_with(m.as_str())));
            if negated {
                set.record_negated(hit.symptom);
                continue;
            }

            let mut intensity = self.lexicon.base_intensity;
            if window().any(|t| self.lexicon.boosters.iter().any(|m| t.starts_with(m.as_str()))) {
                intensity += self.lexicon.marker_step;
            }
            if window().any(|t| self.lexicon.reducers.iter().any(|m| t.starts_with(m.as_str()))) {
                intensity -= self.lexicon.marker_step;
            }
            set.record_present(hit.symptom, intensity.clamp(0.0, 1.0));
        }
    }

    /// Find phrase hits with span claiming.
    ///
    /// Variants across all symptoms are tried most-specific first (token
    /// count, then character length); a hit claims its token span and later,
    /// shorter variants cannot re-match inside it. "balgamlı öksürük" claims
    /// the cough tokens before the generic "öksür" variant sees them.
    fn claim_hits(&self, tokens: &[String]) -> Vec<PhraseHit> {
        let ranked: Vec<(Symptom, &Phrase)> = self
            .lexicon
            .entries
            .iter()
            .flat_map(|e| e.phrases.iter().map(move |p| (e.symptom, p)))
            .sorted_by(|(sa, pa), (sb, pb)| {
                pb.len()
                    .cmp(&pa.len())
                    .then_with(|| char_len(pb).cmp(&char_len(pa)))
                    .then_with(|| sa.cmp(sb))
            })
            .collect();

        let mut claimed = vec![false; tokens.len()];
        let mut hits = Vec::new();

        for (symptom, phrase) in ranked {
            if phrase.is_empty() || phrase.len() > tokens.len() {
                continue;
            }
            for start in 0..=tokens.len() - phrase.len() {
                let end = start + phrase.len();
                if claimed[start..end].iter().any(|&c| c) {
                    continue;
                }
                let matches = phrase
                    .iter()
                    .zip(&tokens[start..end])
                    .all(|(prefix, token)| token.starts_with(prefix.as_str()));
                if matches {
                    claimed[start..end].iter_mut().for_each(|c| *c = true);
                    hits.push(PhraseHit {
                        symptom,
                        start,
                        end,
                    });
                }
            }
        }
        hits
    }
}

fn char_len(phrase: &Phrase) -> usize {
    phrase.iter().map(|w| w.chars().count()).sum()
}
