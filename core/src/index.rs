use crate::segment::{Paragraph, ParagraphId};
use crate::source::DocumentId;
use crate::sparse::SparseVector;
use crate::vectorizer::{FittedVectorizer, Vectorizer};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One non-zero cell of the corpus matrix, listed under its term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub row: u32,
    pub weight: f64, // normalized tf-idf weight
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub paragraphs: usize,
    pub vocabulary: usize,
}

/// Fitted corpus: paragraph records and their vectors, row `i` = paragraph id `i`.
///
/// Immutable once built. A changed corpus gets a new `CorpusIndex`.
#[derive(Debug)]
pub struct CorpusIndex {
    vectorizer: FittedVectorizer,
    records: Vec<Paragraph>,
    rows: Vec<SparseVector>,
    postings: Vec<Vec<Posting>>, // indexed by term id, rows ascending
    num_documents: usize,
}

impl CorpusIndex {
    pub fn build(paragraphs: Vec<Paragraph>, vectorizer: &Vectorizer) -> Self {
        debug_assert!(paragraphs
            .iter()
            .enumerate()
            .all(|(i, p)| p.paragraph_id as usize == i));

        let texts: Vec<&str> = paragraphs.iter().map(|p| p.text.as_str()).collect();
        let (fitted, rows) = vectorizer.fit_transform(&texts);

        let mut postings: Vec<Vec<Posting>> = vec![Vec::new(); fitted.vocabulary_len()];
        for (row, vector) in rows.iter().enumerate() {
            for (term_id, weight) in vector.iter() {
                postings[term_id as usize].push(Posting { row: row as u32, weight });
            }
        }

        let num_documents = paragraphs
            .iter()
            .map(|p| p.document_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        tracing::info!(
            paragraphs = paragraphs.len(),
            vocabulary = fitted.vocabulary_len(),
            "built tf-idf index"
        );
        Self { vectorizer: fitted, records: paragraphs, rows, postings, num_documents }
    }

    /// Index records in row order.
    pub fn rows(&self) -> &[Paragraph] {
        &self.records
    }

    pub fn vector(&self, row: usize) -> Option<&SparseVector> {
        self.rows.get(row)
    }

    pub fn paragraph(&self, id: ParagraphId) -> Option<&Paragraph> {
        self.records.get(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Paragraph, &SparseVector)> {
        self.records.iter().zip(self.rows.iter())
    }

    pub fn vectorizer(&self) -> &FittedVectorizer {
        &self.vectorizer
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.num_documents,
            paragraphs: self.records.len(),
            vocabulary: self.vectorizer.vocabulary_len(),
        }
    }

    /// Rows whose document is in `ids`, in row order.
    pub fn filter_by_document_ids(&self, ids: &HashSet<DocumentId>) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, p)| ids.contains(&p.document_id))
            .map(|(row, _)| row)
            .collect()
    }

    /// Dot product of `query` with every row. Rows sharing no term score 0.
    pub fn scores(&self, query: &SparseVector) -> Vec<f64> {
        let mut scores = vec![0.0; self.records.len()];
        for (term_id, q_w) in query.iter() {
            let Some(plist) = self.postings.get(term_id as usize) else { continue };
            for p in plist {
                scores[p.row as usize] += p.weight * q_w; // cosine since both sides are unit length
            }
        }
        scores
    }

    /// Document frequency per term, as seen by the fitted vocabulary.
    pub fn document_frequencies(&self) -> HashMap<&str, usize> {
        self.vectorizer
            .vocabulary()
            .iter()
            .map(|(term, &tid)| (term.as_str(), self.postings[tid as usize].len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment;
    use crate::source::Document;

    fn build(docs: &[Document]) -> CorpusIndex {
        CorpusIndex::build(segment(docs), &Vectorizer::default())
    }

    #[test]
    fn posting_scores_equal_row_dot_products() {
        let index = build(&[
            Document::new("a", "red green blue\n\ngreen green"),
            Document::new("b", "blue sky\n\nno overlap here"),
        ]);
        let q = index.vectorizer().transform("green blue");
        let scores = index.scores(&q);
        for (row, score) in scores.iter().enumerate() {
            let expected = index.vector(row).unwrap().dot(&q);
            assert!((score - expected).abs() < 1e-12);
        }
        assert_eq!(scores[3], 0.0);
    }

    #[test]
    fn filter_keeps_row_order() {
        let index = build(&[
            Document::new("a", "one\n\ntwo"),
            Document::new("b", "three"),
            Document::new("a2", "four"),
            Document::new("a", "five"),
        ]);
        let ids: HashSet<DocumentId> = ["a".to_string()].into_iter().collect();
        assert_eq!(index.filter_by_document_ids(&ids), vec![0, 1, 4]);
        assert_eq!(index.stats().documents, 3);
    }

    #[test]
    fn document_frequencies_count_paragraphs() {
        let index = build(&[Document::new("a", "cat dog\n\ncat"), Document::new("b", "dog dog")]);
        let df = index.document_frequencies();
        assert_eq!(df["cat"], 2);
        assert_eq!(df["dog"], 2);
    }
}
