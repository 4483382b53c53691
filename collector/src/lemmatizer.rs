//! Plural-to-singular noun lemmatization.
//!
//! A small rule set in the spirit of WordNet's noun morphology: an exception
//! table first, then suffix rules. Every rule produces a word that no rule
//! touches again, so `lemmatize(lemmatize(w)) == lemmatize(w)`.

use std::collections::HashMap;

const IRREGULAR: &[(&str, &str)] = &[
    ("men", "man"),
    ("women", "woman"),
    ("children", "child"),
    ("people", "people"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("knives", "knife"),
    ("lives", "life"),
    ("wives", "wife"),
    ("wolves", "wolf"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("thieves", "thief"),
    ("indices", "index"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
];

/// Words that end in `s` but are already in base form.
const INVARIANT: &[&str] = &[
    "news",
    "series",
    "species",
    "earnings",
    "physics",
    "economics",
    "politics",
    "mathematics",
    "always",
    "perhaps",
    "whereas",
    "sometimes",
    "afterwards",
    "towards",
    "besides",
    "thanks",
    "was",
    "has",
    "does",
    "its",
    "yes",
];

const PROTECTED_ENDINGS: &[&str] = &["ss", "us", "is"];

/// Suffix rewrites, longest first.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("sses", "ss"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("ies", "y"),
    ("xes", "x"),
    ("zes", "z"),
];

/// Shortest stem a suffix rule may leave behind.
const MIN_STEM_LEN: usize = 2;

pub struct Lemmatizer {
    irregular: HashMap<&'static str, &'static str>,
}

impl Lemmatizer {
    pub fn new() -> Self {
        Self {
            irregular: IRREGULAR.iter().copied().collect(),
        }
    }

    /// Base form of a lowercase ASCII word.
    pub fn lemmatize(&self, word: &str) -> String {
        if let Some(base) = self.irregular.get(word) {
            return (*base).to_string();
        }
        if word.len() <= 3
            || !word.ends_with('s')
            || INVARIANT.contains(&word)
            || PROTECTED_ENDINGS.iter().any(|ending| word.ends_with(ending))
        {
            return word.to_string();
        }

        for (suffix, replacement) in SUFFIX_RULES {
            if let Some(stem) = word.strip_suffix(suffix) {
                if stem.len() >= MIN_STEM_LEN {
                    return self.settle(format!("{}{}", stem, replacement));
                }
            }
        }

        self.settle(word[..word.len() - 1].to_string())
    }

    // A rule can land on an irregular plural ("womens" -> "women").
    fn settle(&self, lemma: String) -> String {
        match self.irregular.get(lemma.as_str()) {
            Some(base) => (*base).to_string(),
            None => lemma,
        }
    }
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        let lemmatizer = Lemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("stocks"), "stock");
        assert_eq!(lemmatizer.lemmatize("shares"), "share");
        assert_eq!(lemmatizer.lemmatize("companies"), "company");
        assert_eq!(lemmatizer.lemmatize("taxes"), "tax");
        assert_eq!(lemmatizer.lemmatize("watches"), "watch");
        assert_eq!(lemmatizer.lemmatize("classes"), "class");
    }

    #[test]
    fn test_short_stems_fall_back_to_dropping_s() {
        let lemmatizer = Lemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("ties"), "tie");
        assert_eq!(lemmatizer.lemmatize("aches"), "ache");
        assert_eq!(lemmatizer.lemmatize("flies"), "fly");
    }

    #[test]
    fn test_words_left_alone() {
        let lemmatizer = Lemmatizer::new();
        for word in ["gme", "amc", "news", "analysis", "bonus", "stress", "moon", "tesla"] {
            assert_eq!(lemmatizer.lemmatize(word), word);
        }
    }

    #[test]
    fn test_irregular_nouns() {
        let lemmatizer = Lemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("women"), "woman");
        assert_eq!(lemmatizer.lemmatize("children"), "child");
        assert_eq!(lemmatizer.lemmatize("knives"), "knife");
    }

    #[test]
    fn test_doubled_irregular_plurals() {
        let lemmatizer = Lemmatizer::new();
        assert_eq!(lemmatizer.lemmatize("womens"), "woman");
        assert_eq!(lemmatizer.lemmatize("mens"), "man");
        assert_eq!(lemmatizer.lemmatize("feets"), "foot");
    }

    #[test]
    fn test_lemmatize_is_idempotent() {
        let lemmatizer = Lemmatizer::new();
        let words = [
            "stocks", "classes", "companies", "boxes", "ties", "aches", "buses", "glasses",
            "wolves", "children", "options", "calls", "puts", "earnings", "gains", "crisis",
            "womens", "mens", "feets", "childrens", "peoples",
        ];
        for word in words {
            let once = lemmatizer.lemmatize(word);
            assert_eq!(lemmatizer.lemmatize(&once), once, "word: {}", word);
        }
    }
}
