use crate::error::{Result, RetrievalError};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Two or more word characters between word boundaries.
pub const DEFAULT_TOKEN_PATTERN: &str = r"\b\w\w+\b";

lazy_static! {
    static ref DEFAULT_RE: Regex = Regex::new(DEFAULT_TOKEN_PATTERN).expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Built-in stop word lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopWords {
    English,
}

impl StopWords {
    fn contains(self, token: &str) -> bool {
        match self {
            StopWords::English => ENGLISH_STOPWORDS.contains(token),
        }
    }
}

/// Text analysis options shared by fit and transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub lowercase: bool,
    /// NFKD-decompose and drop combining marks, so `café` matches `cafe`.
    pub strip_accents: bool,
    pub token_pattern: String,
    pub stop_words: Option<StopWords>,
    pub stem: bool,
    /// Inclusive (min, max) n-gram lengths.
    pub ngram_range: (usize, usize),
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            strip_accents: false,
            token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
            stop_words: None,
            stem: false,
            ngram_range: (1, 1),
        }
    }
}

/// Compiled analyzer: turns raw text into the terms that make up the vocabulary.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
    re: Regex,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        let (min_n, max_n) = config.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(RetrievalError::InvalidArgument(format!(
                "ngram_range must satisfy 1 <= min <= max, got ({min_n}, {max_n})"
            )));
        }
        let re = if config.token_pattern == DEFAULT_TOKEN_PATTERN {
            DEFAULT_RE.clone()
        } else {
            Regex::new(&config.token_pattern).map_err(|e| {
                RetrievalError::InvalidArgument(format!("token_pattern: {e}"))
            })?
        };
        Ok(Self { config, re })
    }

    /// Analyze text into terms, in order of appearance. Repeated terms are kept.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let mut normalized = if self.config.lowercase { text.to_lowercase() } else { text.to_string() };
        if self.config.strip_accents {
            normalized = normalized.nfkd().filter(|c| !is_combining_mark(*c)).collect();
        }

        let mut tokens = Vec::new();
        for mat in self.re.find_iter(&normalized) {
            let token = mat.as_str();
            if let Some(stop) = self.config.stop_words {
                if stop.contains(token) { continue; }
            }
            if self.config.stem {
                tokens.push(STEMMER.stem(token).into_owned());
            } else {
                tokens.push(token.to_string());
            }
        }

        let (min_n, max_n) = self.config.ngram_range;
        if min_n == 1 && max_n == 1 {
            return tokens;
        }
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > tokens.len() { break; }
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self { config: AnalyzerConfig::default(), re: DEFAULT_RE.clone() }
    }
}

/// Analyze with the default configuration: lowercase unigrams of two or more word characters.
pub fn tokenize(text: &str) -> Vec<String> {
    Analyzer::default().analyze(text)
}
