//! Corpus, vocabulary, and embedding-table loading.
//!
//! Text formats are line-oriented and whitespace-separated for
//! compatibility with existing topic-modeling tooling:
//! - corpus: one document per line, tokens separated by whitespace
//! - embeddings: token followed by `d` floating-point components per line
//! - assignments: one line per document, integers in `[0, 2*num_topics)`
//!
//! All structures here are immutable after load. Load and format
//! violations are fatal (`CorpusError`), with one exception: in
//! `load_with_vocab` mode, tokens missing from the vocabulary are
//! silently dropped (inference on unseen text).

pub mod assignments;
pub mod corpus;
pub mod embeddings;
pub mod vocab;

pub use assignments::{read_assignments, write_assignments};
pub use corpus::Corpus;
pub use embeddings::EmbeddingTable;
pub use vocab::Vocabulary;

use thiserror::Error;

/// Result alias for corpus loading operations.
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Fatal load/format errors. Raised before any sampling starts.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("empty corpus: {path}")]
    EmptyCorpus { path: String },

    #[error("word \"{word}\" has no corresponding vector")]
    MissingVector { word: String },

    #[error("word \"{word}\" has an all-zero vector")]
    ZeroVector { word: String },

    #[error("malformed vector line {line}: {message}")]
    MalformedVectorLine { line: usize, message: String },

    #[error("malformed assignment line {line}: {message}")]
    MalformedAssignmentLine { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
