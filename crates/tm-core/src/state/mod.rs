//! Count tables and discrete sampling state.
//!
//! Every sampling step is a strict decrement → resample → increment on
//! the cells touched by one unit (a token for the multi-topic variant, a
//! whole document for the single-topic variant). Nothing here is safe for
//! concurrent mutation; the samplers run single-threaded by design.

pub mod dmm;
pub mod lda;

pub use dmm::DmmState;
pub use lda::LdaState;

/// Which mixture component generated a word occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Softmax over topic-vector / word-embedding dot products.
    LatentFeature,
    /// Smoothed Dirichlet-multinomial count ratio.
    Multinomial,
}

/// Encode (topic, component) as one integer in `[0, 2*num_topics)`:
/// `topic` for the latent-feature component, `topic + num_topics` for the
/// Dirichlet-multinomial component.
pub fn encode(topic: usize, component: Component, num_topics: usize) -> usize {
    debug_assert!(topic < num_topics);
    match component {
        Component::LatentFeature => topic,
        Component::Multinomial => topic + num_topics,
    }
}

/// Inverse of [`encode`].
pub fn decode(value: usize, num_topics: usize) -> (usize, Component) {
    debug_assert!(value < 2 * num_topics);
    if value < num_topics {
        (value, Component::LatentFeature)
    } else {
        (value - num_topics, Component::Multinomial)
    }
}

/// Topic × vocabulary count matrix with maintained row sums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicWordCounts {
    counts: Vec<Vec<u32>>,
    row_sums: Vec<u32>,
}

impl TopicWordCounts {
    pub fn zeros(num_topics: usize, vocab_size: usize) -> Self {
        Self {
            counts: vec![vec![0; vocab_size]; num_topics],
            row_sums: vec![0; num_topics],
        }
    }

    pub fn increment(&mut self, topic: usize, word: usize) {
        self.counts[topic][word] += 1;
        self.row_sums[topic] += 1;
    }

    pub fn decrement(&mut self, topic: usize, word: usize) {
        debug_assert!(self.counts[topic][word] > 0);
        self.counts[topic][word] -= 1;
        self.row_sums[topic] -= 1;
    }

    pub fn count(&self, topic: usize, word: usize) -> u32 {
        self.counts[topic][word]
    }

    pub fn row_sum(&self, topic: usize) -> u32 {
        self.row_sums[topic]
    }

    pub fn row(&self, topic: usize) -> &[u32] {
        &self.counts[topic]
    }

    pub fn num_topics(&self) -> usize {
        self.counts.len()
    }

    pub fn vocab_size(&self) -> usize {
        self.counts.first().map_or(0, Vec::len)
    }

    /// True when every maintained row sum equals its recomputed value.
    pub fn row_sums_consistent(&self) -> bool {
        self.counts
            .iter()
            .zip(self.row_sums.iter())
            .all(|(row, &sum)| row.iter().sum::<u32>() == sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let k = 7;
        for topic in 0..k {
            for component in [Component::LatentFeature, Component::Multinomial] {
                let value = encode(topic, component, k);
                assert!(value < 2 * k);
                assert_eq!(decode(value, k), (topic, component));
                assert_eq!(value % k, topic);
            }
        }
    }

    #[test]
    fn counts_maintain_row_sums() {
        let mut counts = TopicWordCounts::zeros(2, 3);
        counts.increment(0, 1);
        counts.increment(0, 1);
        counts.increment(1, 2);
        assert_eq!(counts.count(0, 1), 2);
        assert_eq!(counts.row_sum(0), 2);
        assert_eq!(counts.row_sum(1), 1);
        counts.decrement(0, 1);
        assert_eq!(counts.row_sum(0), 1);
        assert!(counts.row_sums_consistent());
    }

    #[test]
    fn decrement_then_increment_is_identity() {
        let mut counts = TopicWordCounts::zeros(2, 2);
        counts.increment(1, 0);
        counts.increment(1, 1);
        let before = counts.clone();
        counts.decrement(1, 0);
        counts.increment(1, 0);
        assert_eq!(counts, before);
    }
}
