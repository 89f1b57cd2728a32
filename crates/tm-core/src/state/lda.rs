//! Sampling state for the multi-topic-per-document variant.

use rand::Rng;
use tm_corpus::Corpus;

use crate::{Error, Result};

use super::{decode, Component, TopicWordCounts};

/// Per-token assignments plus every count table the LF-LDA sampler reads.
///
/// Invariants (audited by [`LdaState::check_consistency`]):
/// - `sum_t doc_topic[d][t] == document d's token count`
/// - each topic-word row sum equals the sum of its per-word counts
/// - every assignment value lies in `[0, 2*num_topics)`
#[derive(Debug, Clone)]
pub struct LdaState {
    num_topics: usize,
    /// Document × topic counts.
    doc_topic: Vec<Vec<u32>>,
    /// Token count per document.
    doc_len: Vec<u32>,
    /// Latent-feature topic-word counts.
    pub lf: TopicWordCounts,
    /// Dirichlet-multinomial topic-word counts.
    pub dm: TopicWordCounts,
    assignments: Vec<Vec<usize>>,
}

impl LdaState {
    fn empty(num_docs: usize, vocab_size: usize, num_topics: usize) -> Self {
        Self {
            num_topics,
            doc_topic: vec![vec![0; num_topics]; num_docs],
            doc_len: vec![0; num_docs],
            lf: TopicWordCounts::zeros(num_topics, vocab_size),
            dm: TopicWordCounts::zeros(num_topics, vocab_size),
            assignments: vec![Vec::new(); num_docs],
        }
    }

    /// Assign each token a uniformly random cell in `[0, 2*num_topics)`
    /// and populate all counts to match.
    pub fn init_random<R: Rng + ?Sized>(
        corpus: &Corpus,
        vocab_size: usize,
        num_topics: usize,
        rng: &mut R,
    ) -> Self {
        let mut state = Self::empty(corpus.len(), vocab_size, num_topics);
        for (doc_id, document) in corpus.documents().enumerate() {
            let mut tokens = Vec::with_capacity(document.len());
            for &word in document {
                let value = rng.random_range(0..2 * num_topics);
                state.count_in(doc_id, word, value);
                tokens.push(value);
            }
            state.assignments[doc_id] = tokens;
        }
        state
    }

    /// Replay a persisted assignment sequence.
    ///
    /// Document and token totals must agree with the corpus exactly; a
    /// mismatch is a fatal consistency error.
    pub fn init_from_assignments(
        corpus: &Corpus,
        vocab_size: usize,
        num_topics: usize,
        assignments: Vec<Vec<usize>>,
    ) -> Result<Self> {
        if assignments.len() != corpus.len() {
            return Err(Error::Inconsistent(format!(
                "assignment file has {} documents, corpus has {}",
                assignments.len(),
                corpus.len()
            )));
        }
        let assigned_tokens: usize = assignments.iter().map(Vec::len).sum();
        if assigned_tokens != corpus.num_tokens() {
            return Err(Error::Inconsistent(format!(
                "assignment file has {} tokens, corpus has {}",
                assigned_tokens,
                corpus.num_tokens()
            )));
        }

        let mut state = Self::empty(corpus.len(), vocab_size, num_topics);
        for (doc_id, (document, tokens)) in
            corpus.documents().zip(assignments.iter()).enumerate()
        {
            if document.len() != tokens.len() {
                return Err(Error::Inconsistent(format!(
                    "document {doc_id} has {} tokens but {} assignments",
                    document.len(),
                    tokens.len()
                )));
            }
            for (&word, &value) in document.iter().zip(tokens.iter()) {
                state.count_in(doc_id, word, value);
            }
        }
        state.assignments = assignments;
        Ok(state)
    }

    /// Seed topic-word counts from a trained model before assigning an
    /// unseen corpus on top (inference mode). Document counts stay zero:
    /// they belong to the unseen documents only.
    pub fn seed_topic_word_counts(&mut self, tokens: &[(usize, usize)]) {
        for &(word, value) in tokens {
            let (topic, component) = decode(value, self.num_topics);
            match component {
                Component::LatentFeature => self.lf.increment(topic, word),
                Component::Multinomial => self.dm.increment(topic, word),
            }
        }
    }

    fn count_in(&mut self, doc: usize, word: usize, value: usize) {
        let (topic, component) = decode(value, self.num_topics);
        self.doc_topic[doc][topic] += 1;
        self.doc_len[doc] += 1;
        match component {
            Component::LatentFeature => self.lf.increment(topic, word),
            Component::Multinomial => self.dm.increment(topic, word),
        }
    }

    /// Remove token `position` of `doc` from all counts (leave-one-out).
    pub fn decrement_token(&mut self, doc: usize, position: usize, word: usize) {
        let value = self.assignments[doc][position];
        let (topic, component) = decode(value, self.num_topics);
        debug_assert!(self.doc_topic[doc][topic] > 0);
        self.doc_topic[doc][topic] -= 1;
        self.doc_len[doc] -= 1;
        match component {
            Component::LatentFeature => self.lf.decrement(topic, word),
            Component::Multinomial => self.dm.decrement(topic, word),
        }
    }

    /// Re-add the token under `new_value` and record the assignment.
    pub fn increment_token(&mut self, doc: usize, position: usize, word: usize, new_value: usize) {
        self.count_in(doc, word, new_value);
        self.assignments[doc][position] = new_value;
    }

    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    pub fn doc_topic_count(&self, doc: usize, topic: usize) -> u32 {
        self.doc_topic[doc][topic]
    }

    pub fn doc_len(&self, doc: usize) -> u32 {
        self.doc_len[doc]
    }

    pub fn assignments(&self) -> &[Vec<usize>] {
        &self.assignments
    }

    pub fn assignment(&self, doc: usize, position: usize) -> usize {
        self.assignments[doc][position]
    }

    /// Audit every invariant against the corpus. Used by tests and by
    /// warm-start loading.
    pub fn check_consistency(&self, corpus: &Corpus) -> Result<()> {
        for (doc_id, document) in corpus.documents().enumerate() {
            let topic_total: u32 = self.doc_topic[doc_id].iter().sum();
            if topic_total as usize != document.len() {
                return Err(Error::Inconsistent(format!(
                    "document {doc_id}: topic counts sum to {topic_total}, expected {}",
                    document.len()
                )));
            }
            if self.doc_len[doc_id] as usize != document.len() {
                return Err(Error::Inconsistent(format!(
                    "document {doc_id}: stored length disagrees with corpus"
                )));
            }
            for (position, &value) in self.assignments[doc_id].iter().enumerate() {
                if value >= 2 * self.num_topics {
                    return Err(Error::Inconsistent(format!(
                        "document {doc_id} position {position}: assignment {value} out of range"
                    )));
                }
            }
        }
        if !self.lf.row_sums_consistent() || !self.dm.row_sums_consistent() {
            return Err(Error::Inconsistent(
                "topic-word row sums disagree with per-word counts".to_string(),
            ));
        }
        Ok(())
    }
}
