/// Errors surfaced by fitting and retrieval.
#[derive(thiserror::Error, Debug)]
pub enum RetrievalError {
    /// A query was issued before `fit` produced an index.
    #[error("model not fitted: call fit() before retrieve()")]
    ModelNotFitted,
    /// A caller-supplied argument was rejected (e.g. `top_k == 0`).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The document source failed; passed through untouched.
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

pub type Result<T, E = RetrievalError> = std::result::Result<T, E>;
