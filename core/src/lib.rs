//! Sparse lexical passage retrieval.
//!
//! Documents are split into paragraphs, a TF-IDF vector space is fitted over
//! the paragraphs, and queries are scored by cosine similarity against every
//! paragraph. Results are ranked by score (ties by paragraph id), optionally
//! narrowed to a set of documents, and cut to `top_k`.

pub mod error;
pub mod index;
pub mod rank;
pub mod retriever;
pub mod segment;
pub mod source;
pub mod sparse;
pub mod tokenizer;
pub mod vectorizer;

pub use error::{Result, RetrievalError};
pub use index::{CorpusIndex, IndexStats, Posting};
pub use retriever::{FitSummary, PassageMeta, Retrieved, Retriever, Strategy, TfidfRetriever};
pub use segment::{segment, Paragraph, ParagraphId};
pub use source::{Document, DocumentId, DocumentSource, FileSource, InMemorySource};
pub use sparse::{SparseVector, TermId};
pub use tokenizer::{Analyzer, AnalyzerConfig, StopWords};
pub use vectorizer::{FittedVectorizer, Vectorizer, VectorizerConfig};
