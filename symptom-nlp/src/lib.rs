//! Turkish symptom-text parsing for the PreTriage engine
//!
//! Converts free-form, patient-reported Turkish complaint text into a
//! structured observation set over a fixed symptom catalog, ready for
//! downstream feature engineering and classification.
//!
//! # Features
//!
//! - **Fixed symptom catalog**: 14 canonical symptoms, one observation each
//! - **Turkish-aware normalization**: İ/i and I/ı casing plus diacritic
//!   folding handled before any keyword matching
//! - **Negation handling**: "yok", "değil", "hayır" within a bounded,
//!   clause-limited window override any keyword hit
//! - **Intensity markers**: "çok"/"aşırı" boost, "hafif"/"biraz" reduce,
//!   clamped to [0, 1]
//! - **Overlap resolution**: phrase variants match most-specific-first with
//!   span claiming, so related symptoms (dry vs. productive cough) are never
//!   double-counted
//! - **Total function**: empty or unparseable text yields the all-absent
//!   observation set, never an error
//!
//! # Example Usage
//!
//! ```rust
//! use symptom_nlp::{Symptom, SymptomLexicon, SymptomParser};
//!
//! let parser = SymptomParser::new(SymptomLexicon::turkish());
//! let observations = parser.parse("Çok yüksek ateşim var ama öksürüğüm yok");
//!
//! assert!(observations.observation(Symptom::Fever).present);
//! assert!(observations.observation(Symptom::DryCough).negated);
//! ```

pub mod lexicon;
pub mod normalize;
pub mod observation;
pub mod parser;
pub mod symptom;

pub use lexicon::*;
pub use observation::*;
pub use parser::*;
pub use symptom::*;
