use crate::error::{Result, RetrievalError};
use crate::index::{CorpusIndex, IndexStats};
use crate::rank;
use crate::segment::{segment, ParagraphId};
use crate::source::{DocumentId, DocumentSource};
use crate::vectorizer::Vectorizer;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Scoring strategy behind a [`Retriever`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Tfidf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageMeta {
    pub document_id: DocumentId,
    pub paragraph_id: ParagraphId,
}

/// Retrieved passages. The three vectors are aligned by position, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Retrieved {
    pub passages: Vec<String>,
    pub meta: Vec<PassageMeta>,
    pub scores: Vec<f64>,
}

impl Retrieved {
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

pub type FitSummary = IndexStats;

/// A first-stage passage retriever.
pub trait Retriever: Send + Sync {
    fn strategy(&self) -> Strategy;

    /// Re-read the document source and rebuild the whole index.
    fn fit(&self) -> Result<FitSummary>;

    /// Best `top_k` passages for `query`, optionally limited to some documents.
    ///
    /// `verbose` only raises the log level of the candidate listing.
    fn retrieve(
        &self,
        query: &str,
        candidate_ids: Option<&HashSet<DocumentId>>,
        top_k: usize,
        verbose: bool,
    ) -> Result<Retrieved>;
}

/// Lexical retriever over a TF-IDF index of paragraphs.
///
/// Starts unfitted. `fit` builds a fresh [`CorpusIndex`] and swaps it in whole;
/// queries already running keep the index they started with.
pub struct TfidfRetriever<S> {
    source: S,
    vectorizer: Vectorizer,
    index: RwLock<Option<Arc<CorpusIndex>>>,
}

impl<S: DocumentSource> TfidfRetriever<S> {
    pub fn new(source: S) -> Self {
        Self::with_vectorizer(source, Vectorizer::default())
    }

    pub fn with_vectorizer(source: S, vectorizer: Vectorizer) -> Self {
        Self { source, vectorizer, index: RwLock::new(None) }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_fitted(&self) -> bool {
        self.index.read().is_some()
    }

    /// The index queries currently run against.
    pub fn snapshot(&self) -> Result<Arc<CorpusIndex>> {
        self.index.read().clone().ok_or(RetrievalError::ModelNotFitted)
    }
}

impl<S: DocumentSource> Retriever for TfidfRetriever<S> {
    fn strategy(&self) -> Strategy {
        Strategy::Tfidf
    }

    fn fit(&self) -> Result<FitSummary> {
        let documents = self.source.fetch_all()?;
        let paragraphs = segment(&documents);
        let index = CorpusIndex::build(paragraphs, &self.vectorizer);
        let summary = index.stats();
        *self.index.write() = Some(Arc::new(index));
        tracing::info!(
            strategy = ?self.strategy(),
            documents = summary.documents,
            paragraphs = summary.paragraphs,
            vocabulary = summary.vocabulary,
            "retriever fitted"
        );
        Ok(summary)
    }

    fn retrieve(
        &self,
        query: &str,
        candidate_ids: Option<&HashSet<DocumentId>>,
        top_k: usize,
        verbose: bool,
    ) -> Result<Retrieved> {
        let index = self.snapshot()?;
        if top_k == 0 {
            return Err(RetrievalError::InvalidArgument("top_k must be positive".into()));
        }

        let query_vector = index.vectorizer().transform(query);
        let scores = index.scores(&query_vector);
        // An empty candidate set means no filter.
        let allowed = candidate_ids
            .filter(|ids| !ids.is_empty())
            .map(|ids| index.filter_by_document_ids(ids));
        let selected = rank::select(&scores, allowed.as_deref(), top_k);

        let mut out = Retrieved::default();
        for row in selected {
            let p = &index.rows()[row];
            if verbose {
                tracing::info!(paragraph_id = p.paragraph_id, document_id = %p.document_id, score = scores[row], "candidate");
            } else {
                tracing::debug!(paragraph_id = p.paragraph_id, document_id = %p.document_id, score = scores[row], "candidate");
            }
            out.passages.push(p.text.clone());
            out.meta.push(PassageMeta { document_id: p.document_id.clone(), paragraph_id: p.paragraph_id });
            out.scores.push(scores[row]);
        }
        if verbose {
            tracing::info!(candidates = out.len(), "identified candidates via retriever");
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Document, InMemorySource};

    #[test]
    fn unfitted_retrieve_fails() {
        let r = TfidfRetriever::new(InMemorySource::default());
        assert!(!r.is_fitted());
        let err = r.retrieve("anything", None, 3, false).unwrap_err();
        assert!(matches!(err, RetrievalError::ModelNotFitted));
    }

    #[test]
    fn reports_tfidf_strategy() {
        let r = TfidfRetriever::new(InMemorySource::default());
        assert_eq!(r.strategy(), Strategy::Tfidf);
    }

    #[test]
    fn empty_candidate_set_is_no_filter() {
        let r = TfidfRetriever::new(InMemorySource::new(vec![
            Document::new("a", "alpha beta"),
            Document::new("b", "beta gamma"),
        ]));
        r.fit().unwrap();
        let got = r.retrieve("beta", Some(&HashSet::new()), 10, false).unwrap();
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn refit_picks_up_new_documents() {
        let r = TfidfRetriever::new(InMemorySource::new(vec![Document::new("a", "alpha beta")]));
        r.fit().unwrap();
        let old = r.snapshot().unwrap();
        r.source().push(Document::new("b", "gamma delta"));
        let summary = r.fit().unwrap();
        assert_eq!(summary.paragraphs, 2);
        // The earlier snapshot is untouched by the rebuild.
        assert_eq!(old.len(), 1);
        let got = r.retrieve("gamma", None, 1, false).unwrap();
        assert_eq!(got.meta[0].document_id, "b");
    }
}
