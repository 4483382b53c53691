use crate::lemmatizer::Lemmatizer;
use crate::stopwords;
use regex::Regex;
use sentiment_core::CoreError;
use std::collections::HashSet;

const URL_PATTERN: &str = r"http\S+|www.\S+|https\S+";
const NON_ALPHA_PATTERN: &str = r"[^a-zA-Z\s]";

/// Cleans post titles and bodies before they are stored.
///
/// Lowercases, strips URLs and everything that is not a letter or whitespace,
/// drops English stopwords, and reduces each remaining word to its noun base
/// form. Output is a single-space separated list of words and normalizing it
/// again returns it unchanged.
pub struct TextNormalizer {
    url_pattern: Regex,
    non_alpha: Regex,
    stopwords: HashSet<&'static str>,
    lemmatizer: Lemmatizer,
}

impl TextNormalizer {
    pub fn new() -> Result<Self, CoreError> {
        Ok(Self {
            url_pattern: compile(URL_PATTERN)?,
            non_alpha: compile(NON_ALPHA_PATTERN)?,
            stopwords: stopwords::ENGLISH.iter().copied().collect(),
            lemmatizer: Lemmatizer::new(),
        })
    }

    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let without_urls = self.url_pattern.replace_all(&lowered, "");
        let letters_only = self.non_alpha.replace_all(&without_urls, "");

        letters_only
            .split_whitespace()
            .filter(|token| self.keeps(token))
            .map(|token| self.lemmatizer.lemmatize(token))
            .filter(|lemma| self.keeps(lemma))
            .collect::<Vec<_>>()
            .join(" ")
    }

    // Stripping punctuation can glue a URL prefix back together ("h.ttps"),
    // so words are checked against the URL pattern as well.
    fn keeps(&self, word: &str) -> bool {
        !self.stopwords.contains(word) && !self.url_pattern.is_match(word)
    }
}

fn compile(pattern: &str) -> Result<Regex, CoreError> {
    Regex::new(pattern).map_err(|e| CoreError::Internal {
        message: format!("Invalid text pattern {:?}: {}", pattern, e),
    })
}
