//! Word-id corpus loading.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::{CorpusError, Result, Vocabulary};

/// Ordered documents of vocabulary ids. Immutable after load.
#[derive(Debug, Clone)]
pub struct Corpus {
    documents: Vec<Vec<usize>>,
    num_tokens: usize,
}

impl Corpus {
    /// Load a corpus, building `vocab` as new tokens appear.
    ///
    /// One document per line, whitespace-separated tokens; blank lines are
    /// skipped. Fails on an empty corpus.
    pub fn load(path: &Path, vocab: &mut Vocabulary) -> Result<Self> {
        info!(path = %path.display(), "reading topic modeling corpus");
        let reader = BufReader::new(File::open(path)?);

        let mut documents = Vec::new();
        let mut num_tokens = 0;
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let document: Vec<usize> = line
                .split_whitespace()
                .map(|word| vocab.intern(word))
                .collect();
            num_tokens += document.len();
            documents.push(document);
        }

        if documents.is_empty() {
            return Err(CorpusError::EmptyCorpus {
                path: path.display().to_string(),
            });
        }
        info!(
            documents = documents.len(),
            tokens = num_tokens,
            vocabulary = vocab.len(),
            "corpus loaded"
        );
        Ok(Self {
            documents,
            num_tokens,
        })
    }

    /// Load a corpus against a fixed vocabulary, silently dropping unknown
    /// tokens. Used for inference on unseen text; documents that lose all
    /// tokens remain as empty documents to keep line alignment with any
    /// gold label file.
    pub fn load_with_vocab(path: &Path, vocab: &Vocabulary) -> Result<Self> {
        info!(path = %path.display(), "reading unseen corpus");
        let reader = BufReader::new(File::open(path)?);

        let mut documents = Vec::new();
        let mut num_tokens = 0;
        let mut dropped = 0usize;
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut document = Vec::new();
            for word in line.split_whitespace() {
                match vocab.id(word) {
                    Some(id) => document.push(id),
                    None => dropped += 1,
                }
            }
            num_tokens += document.len();
            documents.push(document);
        }

        if documents.is_empty() {
            return Err(CorpusError::EmptyCorpus {
                path: path.display().to_string(),
            });
        }
        if dropped > 0 {
            info!(dropped, "dropped out-of-vocabulary tokens");
        }
        Ok(Self {
            documents,
            num_tokens,
        })
    }

    pub fn from_documents(documents: Vec<Vec<usize>>) -> Self {
        let num_tokens = documents.iter().map(Vec::len).sum();
        Self {
            documents,
            num_tokens,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn num_tokens(&self) -> usize {
        self.num_tokens
    }

    pub fn document(&self, index: usize) -> &[usize] {
        &self.documents[index]
    }

    pub fn documents(&self) -> impl Iterator<Item = &[usize]> {
        self.documents.iter().map(Vec::as_slice)
    }
}
