//! Turkish-aware text normalization.
//!
//! Keyword matching happens over folded text: Turkish casing (İ/i, I/ı) and
//! diacritics (ç, ğ, ö, ş, ü) collapse to plain ASCII before any lookup.
//! Generic Unicode lowercasing gets the dotted/dotless İ/ı pair wrong, so the
//! Turkish letters are mapped explicitly and everything else falls through to
//! standard lowercasing.

/// Fold a single character into its matching form.
fn fold_char(c: char) -> char {
    match c {
        'İ' | 'I' | 'ı' => 'i',
        'Ç' | 'ç' => 'c',
        'Ğ' | 'ğ' => 'g',
        'Ö' | 'ö' => 'o',
        'Ş' | 'ş' => 's',
        'Ü' | 'ü' => 'u',
        _ => c.to_lowercase().next().unwrap_or(c),
    }
}

/// Fold a full string for matching.
pub fn fold(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

/// Split folded text into word tokens (alphanumeric runs).
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Split folded text into clauses at sentence punctuation and adversative
/// conjunctions, returning each clause as its token list.
///
/// Negation and intensity markers must not leak across clause boundaries:
/// in "hapşırıyorum ama göz kaşıntım yok" the trailing "yok" negates only
/// the ocular complaint, not the sneezing.
pub fn clauses(text: &str, breakers: &[String]) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    for segment in text.split(['.', ',', ';', ':', '!', '?']) {
        let tokens = tokenize(segment);
        if tokens.is_empty() {
            continue;
        }
        let mut current = Vec::new();
        for token in tokens {
            if breakers.iter().any(|b| *b == token) {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            } else {
                current.push(token);
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}
