//! End-to-end parser checks over realistic Turkish complaint texts.

use symptom_nlp::{Symptom, SymptomLexicon, SymptomParser};

fn parser() -> SymptomParser {
    SymptomParser::new(SymptomLexicon::turkish())
}

#[test]
fn covid_style_complaint_detects_all_four_symptoms() {
    let set = parser().parse("Çok yüksek ateşim var, nefes alamıyorum, koku alamıyorum, öksürüyorum");

    assert_eq!(
        set.detected(),
        vec![
            Symptom::Fever,
            Symptom::DryCough,
            Symptom::Dyspnea,
            Symptom::Anosmia,
        ]
    );
    // "çok" qualifies only the fever clause.
    assert!((set.observation(Symptom::Fever).intensity - 1.0).abs() < 1e-12);
    assert!((set.observation(Symptom::Dyspnea).intensity - 0.7).abs() < 1e-12);
}

#[test]
fn cold_style_complaint_with_explicit_allergy_negation() {
    let set = parser().parse("Burnum akıyor, hapşırıyorum ama göz kaşıntım yok");

    assert!(set.observation(Symptom::Rhinorrhea).present);
    assert!(set.observation(Symptom::Sneezing).present);
    assert!(set.observation(Symptom::OcularPruritus).negated);
    assert_eq!(set.detected_count(), 2);
}

#[test]
fn flu_style_complaint() {
    let set = parser().parse("Ateşim var, kaslarım ağrıyor, çok yorgunum ve titriyorum");

    assert!(set.observation(Symptom::Fever).present);
    assert!(set.observation(Symptom::Myalgia).present);
    assert!(set.observation(Symptom::Fatigue).present);
    assert!(set.observation(Symptom::Chills).present);
}

#[test]
fn allergy_style_complaint() {
    let set = parser().parse("Gözlerim kaşınıyor, hapşırıyorum, gözlerim sulanıyor ama ateşim yok");

    assert!(set.observation(Symptom::OcularPruritus).present);
    assert!(set.observation(Symptom::Sneezing).present);
    assert!(set.observation(Symptom::Lacrimation).present);
    assert!(set.observation(Symptom::Fever).negated);
}

#[test]
fn mixed_casing_and_punctuation() {
    let set = parser().parse("BOĞAZIM AĞRIYOR!!! burnum tıkalı...");

    assert!(set.observation(Symptom::SoreThroat).present);
    assert!(set.observation(Symptom::NasalCongestion).present);
}

#[test]
fn observation_sets_serialize_for_downstream_consumers() {
    let set = parser().parse("hafif ateşim var");
    let json = serde_json::to_string(&set).expect("observation set serializes");
    let back: symptom_nlp::SymptomObservationSet =
        serde_json::from_str(&json).expect("observation set deserializes");
    assert_eq!(set, back);
}
