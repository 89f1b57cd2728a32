//! Sampling state for the single-topic-per-document variant.

use rand::Rng;
use tm_corpus::Corpus;

use crate::{Error, Result};

use super::{encode, Component, TopicWordCounts};

/// One shared topic per document; per-token assignments distinguish only
/// the generating component (value = `topic` or `topic + num_topics`).
///
/// `topic_doc_count[t]` is the number of documents currently assigned to
/// topic `t`, so it sums to the document count at all times.
#[derive(Debug, Clone)]
pub struct DmmState {
    num_topics: usize,
    topic_doc_count: Vec<u32>,
    doc_topic: Vec<usize>,
    pub lf: TopicWordCounts,
    pub dm: TopicWordCounts,
    assignments: Vec<Vec<usize>>,
}

impl DmmState {
    fn empty(num_docs: usize, vocab_size: usize, num_topics: usize) -> Self {
        Self {
            num_topics,
            topic_doc_count: vec![0; num_topics],
            doc_topic: vec![0; num_docs],
            lf: TopicWordCounts::zeros(num_topics, vocab_size),
            dm: TopicWordCounts::zeros(num_topics, vocab_size),
            assignments: vec![Vec::new(); num_docs],
        }
    }

    /// Uniform random topic per document, fair coin per token for the
    /// generating component.
    pub fn init_random<R: Rng + ?Sized>(
        corpus: &Corpus,
        vocab_size: usize,
        num_topics: usize,
        rng: &mut R,
    ) -> Self {
        let mut state = Self::empty(corpus.len(), vocab_size, num_topics);
        for (doc_id, document) in corpus.documents().enumerate() {
            let topic = rng.random_range(0..num_topics);
            state.topic_doc_count[topic] += 1;
            state.doc_topic[doc_id] = topic;
            let mut tokens = Vec::with_capacity(document.len());
            for &word in document {
                let component = if rng.random::<bool>() {
                    Component::Multinomial
                } else {
                    Component::LatentFeature
                };
                match component {
                    Component::LatentFeature => state.lf.increment(topic, word),
                    Component::Multinomial => state.dm.increment(topic, word),
                }
                tokens.push(encode(topic, component, num_topics));
            }
            state.assignments[doc_id] = tokens;
        }
        state
    }

    /// Replay a persisted assignment sequence. The document topic is the
    /// first value modulo `num_topics`; every token in a document must
    /// agree with it. Totals must match the corpus exactly.
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
            let topic = tokens.first().map_or(0, |&v| v % num_topics);
            state.topic_doc_count[topic] += 1;
            state.doc_topic[doc_id] = topic;
            for (&word, &value) in document.iter().zip(tokens.iter()) {
                if value % num_topics != topic {
                    return Err(Error::Inconsistent(format!(
                        "document {doc_id}: assignment {value} disagrees with document topic {topic}"
                    )));
                }
                if value == topic {
                    state.lf.increment(topic, word);
                } else {
                    state.dm.increment(topic, word);
                }
            }
        }
        state.assignments = assignments;
        Ok(state)
    }

    /// Seed topic-word counts from a trained model before assigning an
    /// unseen corpus on top (inference mode). Per-topic document counts
    /// stay zero: they belong to the unseen documents only.
    pub fn seed_topic_word_counts(&mut self, tokens: &[(usize, usize)]) {
        for &(word, value) in tokens {
            let (topic, component) = super::decode(value, self.num_topics);
            match component {
                Component::LatentFeature => self.lf.increment(topic, word),
                Component::Multinomial => self.dm.increment(topic, word),
            }
        }
    }

    /// Retract a whole document from its current topic (leave-one-out).
    pub fn decrement_doc(&mut self, doc: usize, words: &[usize]) {
        let topic = self.doc_topic[doc];
        debug_assert!(self.topic_doc_count[topic] > 0);
        self.topic_doc_count[topic] -= 1;
        for (position, &word) in words.iter().enumerate() {
            if self.assignments[doc][position] == topic {
                self.lf.decrement(topic, word);
            } else {
                self.dm.decrement(topic, word);
            }
        }
    }

    /// Re-add the document under `topic` with a per-token component
    /// decision, recording the new assignments.
    pub fn increment_doc(
        &mut self,
        doc: usize,
        words: &[usize],
        topic: usize,
        components: &[Component],
    ) {
        debug_assert_eq!(words.len(), components.len());
        self.topic_doc_count[topic] += 1;
        self.doc_topic[doc] = topic;
        for (position, (&word, &component)) in words.iter().zip(components.iter()).enumerate() {
            match component {
                Component::LatentFeature => self.lf.increment(topic, word),
                Component::Multinomial => self.dm.increment(topic, word),
            }
            self.assignments[doc][position] = encode(topic, component, self.num_topics);
        }
    }

    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    pub fn topic_doc_count(&self, topic: usize) -> u32 {
        self.topic_doc_count[topic]
    }

    pub fn doc_topic(&self, doc: usize) -> usize {
        self.doc_topic[doc]
    }

    pub fn assignments(&self) -> &[Vec<usize>] {
        &self.assignments
    }

    /// Audit every invariant against the corpus.
    pub fn check_consistency(&self, corpus: &Corpus) -> Result<()> {
        let doc_total: u32 = self.topic_doc_count.iter().sum();
        if doc_total as usize != corpus.len() {
            return Err(Error::Inconsistent(format!(
                "topic document counts sum to {doc_total}, expected {}",
                corpus.len()
            )));
        }
        for (doc_id, document) in corpus.documents().enumerate() {
            let topic = self.doc_topic[doc_id];
            if topic >= self.num_topics {
                return Err(Error::Inconsistent(format!(
                    "document {doc_id}: topic {topic} out of range"
                )));
            }
            if self.assignments[doc_id].len() != document.len() {
                return Err(Error::Inconsistent(format!(
                    "document {doc_id}: assignment length disagrees with corpus"
                )));
            }
            for &value in &self.assignments[doc_id] {
                if value >= 2 * self.num_topics || value % self.num_topics != topic {
                    return Err(Error::Inconsistent(format!(
                        "document {doc_id}: assignment {value} inconsistent with topic {topic}"
                    )));
                }
            }
        }
        let word_total = (0..self.num_topics)
            .map(|t| self.lf.row_sum(t) + self.dm.row_sum(t))
            .sum::<u32>();
        if word_total as usize != corpus.num_tokens() {
            return Err(Error::Inconsistent(format!(
                "topic-word counts sum to {word_total}, expected {}",
                corpus.num_tokens()
            )));
        }
        if !self.lf.row_sums_consistent() || !self.dm.row_sums_consistent() {
            return Err(Error::Inconsistent(
                "topic-word row sums disagree with per-word counts".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tiny_corpus() -> Corpus {
        Corpus::from_documents(vec![vec![0, 1], vec![2, 3, 4], vec![1, 1]])
    }

    #[test]
    fn random_init_is_consistent() {
        let corpus = tiny_corpus();
        let mut rng = StdRng::seed_from_u64(11);
        let state = DmmState::init_random(&corpus, 5, 3, &mut rng);
        state.check_consistency(&corpus).unwrap();
    }

    #[test]
    fn replay_matches_random_init() {
        let corpus = tiny_corpus();
        let mut rng = StdRng::seed_from_u64(12);
        let random = DmmState::init_random(&corpus, 5, 3, &mut rng);
        let replayed =
            DmmState::init_from_assignments(&corpus, 5, 3, random.assignments().to_vec()).unwrap();
        replayed.check_consistency(&corpus).unwrap();
        assert_eq!(replayed.lf, random.lf);
        assert_eq!(replayed.dm, random.dm);
        assert_eq!(replayed.topic_doc_count, random.topic_doc_count);
    }

    #[test]
    fn replay_rejects_mixed_topics_within_document() {
        let corpus = Corpus::from_documents(vec![vec![0, 1]]);
        // First token says topic 0, second token says topic 1.
        let bad = vec![vec![0, 1]];
        assert!(matches!(
            DmmState::init_from_assignments(&corpus, 2, 2, bad),
            Err(Error::Inconsistent(_))
        ));
    }

    #[test]
    fn decrement_increment_round_trips() {
        let corpus = tiny_corpus();
        let mut rng = StdRng::seed_from_u64(13);
        let mut state = DmmState::init_random(&corpus, 5, 3, &mut rng);
        let before = state.clone();

        let doc = 1;
        let words = corpus.document(doc);
        let topic = state.doc_topic(doc);
        let components: Vec<Component> = state.assignments()[doc]
            .iter()
            .map(|&v| {
                if v == topic {
                    Component::LatentFeature
                } else {
                    Component::Multinomial
                }
            })
            .collect();

        state.decrement_doc(doc, words);
        state.increment_doc(doc, words, topic, &components);

        assert_eq!(state.lf, before.lf);
        assert_eq!(state.dm, before.dm);
        assert_eq!(state.topic_doc_count, before.topic_doc_count);
        assert_eq!(state.assignments, before.assignments);
    }
}
