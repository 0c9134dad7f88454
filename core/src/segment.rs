use crate::source::{Document, DocumentId};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub type ParagraphId = u32;

lazy_static! {
    // A blank line: two or more newlines in a row, `\r\n` counting as one.
    static ref BLANK_LINES: Regex = Regex::new(r"(?:\r?\n){2,}").expect("valid regex");
}

/// The unit that gets scored. `text` is trimmed and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub paragraph_id: ParagraphId,
    pub document_id: DocumentId,
    pub text: String,
}

/// Split a single text on blank lines, yielding trimmed non-empty pieces.
pub fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    BLANK_LINES.split(text).map(str::trim).filter(|p| !p.is_empty())
}

/// Split every document into paragraphs, numbering them from zero across the whole set.
pub fn segment(documents: &[Document]) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut next_id: ParagraphId = 0;
    for doc in documents {
        for p in split_paragraphs(&doc.text) {
            paragraphs.push(Paragraph {
                paragraph_id: next_id,
                document_id: doc.id.clone(),
                text: p.to_string(),
            });
            next_id += 1;
        }
    }
    tracing::info!(paragraphs = paragraphs.len(), documents = documents.len(), "found candidate paragraphs");
    paragraphs
}
