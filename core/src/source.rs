//! Where documents come from.
//!
//! The retriever never stores documents itself. A [`DocumentSource`] hands
//! over the full collection on every `fit`, and any failure it reports is
//! passed to the caller unchanged.

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

pub type DocumentId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    #[serde(alias = "body")]
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// Supplies every document in one synchronous call.
pub trait DocumentSource: Send + Sync {
    fn fetch_all(&self) -> Result<Vec<Document>>;
}

impl<S: DocumentSource + ?Sized> DocumentSource for Arc<S> {
    fn fetch_all(&self) -> Result<Vec<Document>> {
        (**self).fetch_all()
    }
}

impl<S: DocumentSource + ?Sized> DocumentSource for Box<S> {
    fn fetch_all(&self) -> Result<Vec<Document>> {
        (**self).fetch_all()
    }
}

/// An in-memory collection that callers may replace between fits.
#[derive(Debug, Default)]
pub struct InMemorySource {
    docs: RwLock<Vec<Document>>,
}

impl InMemorySource {
    pub fn new(docs: Vec<Document>) -> Self {
        Self { docs: RwLock::new(docs) }
    }

    pub fn push(&self, doc: Document) {
        self.docs.write().push(doc);
    }

    pub fn replace(&self, docs: Vec<Document>) {
        *self.docs.write() = docs;
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

impl DocumentSource for InMemorySource {
    fn fetch_all(&self) -> Result<Vec<Document>> {
        Ok(self.docs.read().clone())
    }
}

/// Reads documents from a file or a directory tree.
///
/// `.json` holds one object or an array of objects, `.jsonl` one object per
/// line, and `.txt`/`.md` a single document whose id is the file stem.
/// Files are visited in path order so the paragraph numbering is stable.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        if self.root.is_dir() {
            for entry in WalkDir::new(&self.root).sort_by_file_name() {
                let entry = entry.with_context(|| format!("walking {}", self.root.display()))?;
                let p = entry.path();
                if p.is_file() && file_kind(p).is_some() {
                    files.push(p.to_path_buf());
                }
            }
        } else if self.root.is_file() {
            files.push(self.root.clone());
        } else {
            anyhow::bail!("document path {} does not exist", self.root.display());
        }
        Ok(files)
    }
}

#[derive(Clone, Copy)]
enum FileKind {
    Json,
    JsonLines,
    Text,
}

fn file_kind(path: &Path) -> Option<FileKind> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => Some(FileKind::Json),
        Some("jsonl") => Some(FileKind::JsonLines),
        Some("txt" | "md") => Some(FileKind::Text),
        _ => None,
    }
}

impl DocumentSource for FileSource {
    fn fetch_all(&self) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        for file in self.files()? {
            // A single file given explicitly is read as JSON unless its extension says otherwise.
            match file_kind(&file).unwrap_or(FileKind::Json) {
                FileKind::Json => read_json(&file, &mut docs)?,
                FileKind::JsonLines => read_jsonl(&file, &mut docs)?,
                FileKind::Text => read_text(&file, &mut docs)?,
            }
        }
        tracing::debug!(root = %self.root.display(), docs = docs.len(), "loaded documents");
        Ok(docs)
    }
}

fn read_jsonl(file: &Path, docs: &mut Vec<Document>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: Document = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<Document>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let doc: Document = serde_json::from_value(v)
                    .with_context(|| format!("document in {}", file.display()))?;
                docs.push(doc);
            }
        }
        serde_json::Value::Object(_) => {
            let doc: Document = serde_json::from_value(json)
                .with_context(|| format!("document in {}", file.display()))?;
            docs.push(doc);
        }
        _ => anyhow::bail!("{}: expected a JSON object or array", file.display()),
    }
    Ok(())
}

fn read_text(file: &Path, docs: &mut Vec<Document>) -> Result<()> {
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let id = file
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| file.display().to_string());
    docs.push(Document { id, text });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_mixed_directory_in_path_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jsonl"), "{\"id\":\"j1\",\"text\":\"one\"}\n\n{\"id\":\"j2\",\"body\":\"two\"}\n").unwrap();
        fs::write(dir.path().join("b.json"), "[{\"id\":\"k1\",\"text\":\"three\"}]").unwrap();
        fs::write(dir.path().join("c.txt"), "four").unwrap();
        fs::write(dir.path().join("ignored.csv"), "x,y").unwrap();

        let docs = FileSource::new(dir.path()).fetch_all().unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["j1", "j2", "k1", "c"]);
        assert_eq!(docs[1].text, "two");
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.jsonl"), "{not json}\n").unwrap();
        let err = FileSource::new(dir.path()).fetch_all().unwrap_err();
        assert!(err.to_string().contains("bad.jsonl:1"));
    }

    #[test]
    fn missing_path_is_an_error() {
        assert!(FileSource::new("/definitely/not/here").fetch_all().is_err());
    }

    #[test]
    fn in_memory_replace() {
        let src = InMemorySource::new(vec![Document::new("a", "x")]);
        src.replace(vec![Document::new("b", "y"), Document::new("c", "z")]);
        assert_eq!(src.fetch_all().unwrap().len(), 2);
    }
}
