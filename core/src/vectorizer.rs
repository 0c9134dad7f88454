//! TF-IDF vector space.
//!
//! [`Vectorizer`] is the unfitted configuration; [`Vectorizer::fit`] returns a
//! [`FittedVectorizer`] that owns the vocabulary and IDF weights. Only the
//! fitted type can `transform`, so an unfitted transform cannot be written.
//!
//! Weighting: `tf * idf`, where `idf = ln((1 + N) / (1 + df)) + 1` by default
//! (`ln(N / df) + 1` without smoothing), followed by L2 normalization.

use crate::error::Result;
use crate::sparse::{SparseVector, TermId};
use crate::tokenizer::{Analyzer, AnalyzerConfig};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    #[serde(flatten)]
    pub analyzer: AnalyzerConfig,
    pub smooth_idf: bool,
    /// Use `1 + ln(tf)` in place of the raw count.
    pub sublinear_tf: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self { analyzer: AnalyzerConfig::default(), smooth_idf: true, sublinear_tf: false }
    }
}

#[derive(Debug, Clone)]
pub struct Vectorizer {
    analyzer: Analyzer,
    smooth_idf: bool,
    sublinear_tf: bool,
}

impl Default for Vectorizer {
    fn default() -> Self {
        Self { analyzer: Analyzer::default(), smooth_idf: true, sublinear_tf: false }
    }
}

impl Vectorizer {
    pub fn new(config: VectorizerConfig) -> Result<Self> {
        Ok(Self {
            analyzer: Analyzer::new(config.analyzer)?,
            smooth_idf: config.smooth_idf,
            sublinear_tf: config.sublinear_tf,
        })
    }

    pub fn fit<S: AsRef<str>>(&self, texts: &[S]) -> FittedVectorizer {
        self.fit_transform(texts).0
    }

    /// Fit on `texts` and return their vectors, row `i` for `texts[i]`.
    pub fn fit_transform<S: AsRef<str>>(&self, texts: &[S]) -> (FittedVectorizer, Vec<SparseVector>) {
        let counts: Vec<HashMap<String, u32>> = texts
            .iter()
            .map(|t| term_counts(&self.analyzer, t.as_ref()))
            .collect();

        // Sorted so term ids depend only on the set of terms, not on hash order.
        let mut df: BTreeMap<&str, u32> = BTreeMap::new();
        for doc in &counts {
            for term in doc.keys() {
                *df.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let n = texts.len() as f64;
        let mut vocabulary: HashMap<String, TermId> = HashMap::with_capacity(df.len());
        let mut idf: Vec<f64> = Vec::with_capacity(df.len());
        for (term_id, (term, df_t)) in df.into_iter().enumerate() {
            vocabulary.insert(term.to_string(), term_id as TermId);
            idf.push(compute_idf(n, df_t as f64, self.smooth_idf));
        }

        let fitted = FittedVectorizer {
            analyzer: self.analyzer.clone(),
            vocabulary,
            idf,
            sublinear_tf: self.sublinear_tf,
        };
        let vectors = counts.iter().map(|c| fitted.weigh(c)).collect();
        (fitted, vectors)
    }
}

fn compute_idf(n: f64, df: f64, smooth: bool) -> f64 {
    if smooth {
        ((1.0 + n) / (1.0 + df)).ln() + 1.0
    } else {
        (n / df).ln() + 1.0
    }
}

fn term_counts(analyzer: &Analyzer, text: &str) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for term in analyzer.analyze(text) {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

/// A vectorizer with a fixed vocabulary and IDF weights.
#[derive(Debug, Clone)]
pub struct FittedVectorizer {
    analyzer: Analyzer,
    vocabulary: HashMap<String, TermId>,
    idf: Vec<f64>,
    sublinear_tf: bool,
}

impl FittedVectorizer {
    /// Vectorize `text` against the fitted vocabulary. Unknown terms are dropped.
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&term_counts(&self.analyzer, text))
    }

    fn weigh(&self, counts: &HashMap<String, u32>) -> SparseVector {
        let pairs: Vec<(TermId, f64)> = counts
            .iter()
            .filter_map(|(term, &tf)| {
                let tid = *self.vocabulary.get(term)?;
                let tf = if self.sublinear_tf { 1.0 + (tf as f64).ln() } else { tf as f64 };
                Some((tid, tf * self.idf[tid as usize]))
            })
            .collect();
        let mut v = SparseVector::from_pairs(pairs);
        v.normalize();
        v
    }

    pub fn vocabulary(&self) -> &HashMap<String, TermId> {
        &self.vocabulary
    }

    /// IDF weight per term id.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.vocabulary.get(term).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothed_idf_matches_formula() {
        let fitted = Vectorizer::default().fit(&["apple banana", "apple cherry", "apple"]);
        let apple = fitted.term_id("apple").unwrap() as usize;
        let banana = fitted.term_id("banana").unwrap() as usize;
        // N = 3; df(apple) = 3, df(banana) = 1
        assert!((fitted.idf()[apple] - 1.0).abs() < 1e-12);
        assert!((fitted.idf()[banana] - ((4.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn unsmoothed_idf() {
        let v = Vectorizer::new(VectorizerConfig { smooth_idf: false, ..Default::default() }).unwrap();
        let fitted = v.fit(&["xx yy", "xx"]);
        let yy = fitted.term_id("yy").unwrap() as usize;
        assert!((fitted.idf()[yy] - (2.0f64.ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn vocabulary_ids_are_lexicographic() {
        let fitted = Vectorizer::default().fit(&["zeta alpha", "mu"]);
        assert_eq!(fitted.term_id("alpha"), Some(0));
        assert_eq!(fitted.term_id("mu"), Some(1));
        assert_eq!(fitted.term_id("zeta"), Some(2));
    }

    #[test]
    fn out_of_vocabulary_terms_are_ignored() {
        let fitted = Vectorizer::default().fit(&["known words here"]);
        let v = fitted.transform("unknown stuff");
        assert_eq!(v.nnz(), 0);
        let v = fitted.transform("known unknown");
        assert_eq!(v.nnz(), 1);
        assert!((v.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn term_frequency_is_raw_count_by_default() {
        let fitted = Vectorizer::default().fit(&["aa bb", "aa"]);
        let v = fitted.transform("aa aa bb");
        let aa = fitted.term_id("aa").unwrap();
        let bb = fitted.term_id("bb").unwrap();
        let idf = fitted.idf();
        let (wa, wb) = (2.0 * idf[aa as usize], idf[bb as usize]);
        let norm = (wa * wa + wb * wb).sqrt();
        assert!((v.get(aa) - wa / norm).abs() < 1e-12);
        assert!((v.get(bb) - wb / norm).abs() < 1e-12);
    }

    #[test]
    fn sublinear_tf_uses_log_count() {
        let v = Vectorizer::new(VectorizerConfig { sublinear_tf: true, ..Default::default() }).unwrap();
        let (fitted, rows) = v.fit_transform(&["aa aa aa bb", "bb"]);
        let aa = fitted.term_id("aa").unwrap();
        let bb = fitted.term_id("bb").unwrap();
        // N = 2; df(aa) = 1, df(bb) = 2
        let wa = (1.0 + 3.0f64.ln()) * ((3.0f64 / 2.0).ln() + 1.0);
        let wb = 1.0;
        let norm = (wa * wa + wb * wb).sqrt();
        assert!((rows[0].get(aa) - wa / norm).abs() < 1e-12);
        assert!((rows[0].get(bb) - wb / norm).abs() < 1e-12);
    }

    #[test]
    fn partial_json_config_keeps_defaults() {
        let raw = r#"{"ngram_range":[1,2],"sublinear_tf":true,"stop_words":"english"}"#;
        let config: VectorizerConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.analyzer.ngram_range, (1, 2));
        assert_eq!(config.analyzer.stop_words, Some(crate::tokenizer::StopWords::English));
        assert!(config.sublinear_tf);
        // Fields not in the JSON fall back to their defaults.
        assert!(config.smooth_idf);
        assert!(config.analyzer.lowercase);
        assert!(!config.analyzer.strip_accents);
        assert!(!config.analyzer.stem);
        assert_eq!(config.analyzer.token_pattern, crate::tokenizer::DEFAULT_TOKEN_PATTERN);

        let fitted = Vectorizer::new(config).unwrap().fit(&["the red fox"]);
        assert!(fitted.term_id("the").is_none());
        assert!(fitted.term_id("red fox").is_some());
    }

    #[test]
    fn empty_config_is_default() {
        let config: VectorizerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, VectorizerConfig::default());
    }

    #[test]
    fn empty_corpus_fits_empty_vocabulary() {
        let texts: [&str; 0] = [];
        let (fitted, rows) = Vectorizer::default().fit_transform(&texts);
        assert_eq!(fitted.vocabulary_len(), 0);
        assert!(rows.is_empty());
        assert!(fitted.transform("anything").is_zero());
    }
}
