//! Fixed word-embedding table.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::{CorpusError, Result, Vocabulary};

/// `V x d` dense matrix, one row per vocabulary id. Immutable.
#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    rows: Vec<Vec<f64>>,
    dim: usize,
}

impl EmbeddingTable {
    /// Load embeddings for every word in `vocab`.
    ///
    /// Each line is a token followed by `d` float components; `d` is fixed
    /// by the first line. Lines for tokens outside the vocabulary are
    /// ignored. A vocabulary word with no row, or with an all-zero row, is
    /// a fatal load error.
    pub fn load(path: &Path, vocab: &Vocabulary) -> Result<Self> {
        info!(path = %path.display(), "reading word vectors");
        let reader = BufReader::new(File::open(path)?);

        let mut rows: Vec<Option<Vec<f64>>> = vec![None; vocab.len()];
        let mut dim = 0usize;
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let word = parts.next().ok_or_else(|| CorpusError::MalformedVectorLine {
                line: index + 1,
                message: "missing token".to_string(),
            })?;
            let components: Vec<f64> = parts
                .map(|p| {
                    p.parse::<f64>()
                        .map_err(|e| CorpusError::MalformedVectorLine {
                            line: index + 1,
                            message: e.to_string(),
                        })
                })
                .collect::<Result<_>>()?;
            if components.is_empty() {
                return Err(CorpusError::MalformedVectorLine {
                    line: index + 1,
                    message: "no vector components".to_string(),
                });
            }
            if dim == 0 {
                dim = components.len();
            } else if components.len() != dim {
                return Err(CorpusError::MalformedVectorLine {
                    line: index + 1,
                    message: format!("expected {dim} components, got {}", components.len()),
                });
            }
            if let Some(id) = vocab.id(word) {
                rows[id] = Some(components);
            }
        }

        let mut table = Vec::with_capacity(vocab.len());
        for (id, row) in rows.into_iter().enumerate() {
            let word = vocab.word(id).unwrap_or_default().to_string();
            match row {
                None => return Err(CorpusError::MissingVector { word }),
                Some(row) => {
                    if row.iter().all(|c| *c == 0.0) {
                        return Err(CorpusError::ZeroVector { word });
                    }
                    table.push(row);
                }
            }
        }
        info!(words = table.len(), dim, "word vectors loaded");
        Ok(Self { rows: table, dim })
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let dim = rows.first().map_or(0, Vec::len);
        Self { rows, dim }
    }

    /// Vector dimensionality `d`.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of vocabulary rows `V`.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, id: usize) -> &[f64] {
        &self.rows[id]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vocab_of(words: &[&str]) -> Vocabulary {
        let mut v = Vocabulary::new();
        for w in words {
            v.intern(w);
        }
        v
    }

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn load_indexes_rows_by_vocab_id() {
        let vocab = vocab_of(&["b", "a"]);
        let f = write_temp("a 1.0 2.0\nb 3.0 4.0\nextra 5.0 6.0\n");
        let table = EmbeddingTable::load(f.path(), &vocab).unwrap();
        assert_eq!(table.dim(), 2);
        assert_eq!(table.row(0), &[3.0, 4.0]); // "b"
        assert_eq!(table.row(1), &[1.0, 2.0]); // "a"
    }

    #[test]
    fn missing_vector_is_fatal() {
        let vocab = vocab_of(&["a", "b"]);
        let f = write_temp("a 1.0 2.0\n");
        assert!(matches!(
            EmbeddingTable::load(f.path(), &vocab),
            Err(CorpusError::MissingVector { word }) if word == "b"
        ));
    }

    #[test]
    fn zero_vector_is_fatal() {
        let vocab = vocab_of(&["a"]);
        let f = write_temp("a 0.0 0.0\n");
        assert!(matches!(
            EmbeddingTable::load(f.path(), &vocab),
            Err(CorpusError::ZeroVector { word }) if word == "a"
        ));
    }

    #[test]
    fn malformed_component_is_fatal() {
        let vocab = vocab_of(&["a"]);
        let f = write_temp("a 1.0 oops\n");
        assert!(matches!(
            EmbeddingTable::load(f.path(), &vocab),
            Err(CorpusError::MalformedVectorLine { line: 1, .. })
        ));
    }

    #[test]
    fn dimension_mismatch_is_fatal() {
        let vocab = vocab_of(&["a", "b"]);
        let f = write_temp("a 1.0 2.0\nb 3.0\n");
        assert!(matches!(
            EmbeddingTable::load(f.path(), &vocab),
            Err(CorpusError::MalformedVectorLine { line: 2, .. })
        ));
    }
}
