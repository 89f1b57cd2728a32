//! Per-topic MAP vector estimation.
//!
//! For one topic with latent-feature word counts `n`, the estimate
//! maximizes
//!
//! ```text
//! sum_w n[w] * <x, emb[w]>  -  N * log(sum_w exp<x, emb[w]>)  -  l2 * |x|^2
//! ```
//!
//! solved with L-BFGS on the negated objective. Numerical failures
//! escalate the regularization strength tenfold and retry from the
//! warm-start vector, up to a bounded number of escalations; a partition
//! value that is zero or non-finite after a successful solve is
//! recomputed with max-subtraction rather than discarded.

use tm_corpus::EmbeddingTable;
use tm_math::{softmax_shifted, two_norm_squared, ConvergenceStatus, Lbfgs};
use tracing::{debug, warn};

use crate::state::TopicWordCounts;
use crate::{Error, Result};

/// Base L2 regularizer for learning topic vectors.
pub const L2_REGULARIZER: f64 = 0.01;
/// Relative-change tolerance for L-BFGS convergence.
pub const TOLERANCE: f64 = 0.05;
/// L-BFGS iteration cap per solve.
pub const MAX_ITERATIONS: usize = 600;
/// Stored correction pairs.
const LBFGS_HISTORY: usize = 10;
/// Tenfold regularizer escalations permitted before the run aborts.
const MAX_ESCALATIONS: u32 = 8;

/// Softmax terms of one topic over the whole vocabulary: dot products,
/// their exponentials, and the partition sum. Replaced wholesale each
/// outer iteration; read-only during the following sampling sweep.
#[derive(Debug, Clone)]
pub struct TopicPartition {
    pub dot: Vec<f64>,
    pub exp: Vec<f64>,
    pub sum: f64,
}

/// All topics' partitions for one outer iteration.
#[derive(Debug, Clone)]
pub struct PartitionCache {
    topics: Vec<TopicPartition>,
}

impl PartitionCache {
    pub fn new(topics: Vec<TopicPartition>) -> Self {
        Self { topics }
    }

    /// Latent-feature probability of `word` under `topic`.
    pub fn word_prob(&self, topic: usize, word: usize) -> f64 {
        let partition = &self.topics[topic];
        partition.exp[word] / partition.sum
    }

    pub fn num_topics(&self) -> usize {
        self.topics.len()
    }
}

struct MapProblem<'a> {
    counts: &'a [u32],
    total: f64,
    expected: Vec<f64>,
    embeddings: &'a EmbeddingTable,
    l2: f64,
}

impl<'a> MapProblem<'a> {
    fn new(counts: &'a [u32], embeddings: &'a EmbeddingTable, l2: f64) -> Self {
        let dim = embeddings.dim();
        let total: f64 = counts.iter().map(|&c| f64::from(c)).sum();
        // expected[i] = sum_w counts[w] * emb[w][i], fixed per solve.
        let mut expected = vec![0.0; dim];
        for (word, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let row = embeddings.row(word);
            for (e, r) in expected.iter_mut().zip(row.iter()) {
                *e += f64::from(count) * r;
            }
        }
        Self {
            counts,
            total,
            expected,
            embeddings,
            l2,
        }
    }

    /// Fill per-word dot products and raw exponentials; return their sum.
    ///
    /// Deliberately unshifted: overflow here is what triggers the
    /// escalation path, and the shifted fallback belongs to the caller.
    fn partition(&self, x: &[f64], dots: &mut [f64], exps: &mut [f64]) -> f64 {
        let mut sum = 0.0;
        for word in 0..self.embeddings.len() {
            dots[word] = tm_math::dot(self.embeddings.row(word), x);
            exps[word] = dots[word].exp();
            sum += exps[word];
        }
        sum
    }

    /// Negated MAP objective (minimized).
    fn neg_value(&self, x: &[f64]) -> f64 {
        let v = self.embeddings.len();
        let mut dots = vec![0.0; v];
        let mut exps = vec![0.0; v];
        let log_partition = self.partition(x, &mut dots, &mut exps).ln();

        let mut value = 0.0;
        for (word, &count) in self.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            value += f64::from(count) * dots[word];
        }
        value -= self.total * log_partition;
        value -= self.l2 * two_norm_squared(x);
        -value
    }

    /// Gradient of the negated objective.
    fn neg_gradient(&self, x: &[f64]) -> Vec<f64> {
        let v = self.embeddings.len();
        let dim = x.len();
        let mut dots = vec![0.0; v];
        let mut exps = vec![0.0; v];
        let partition = self.partition(x, &mut dots, &mut exps);

        let mut gradient = vec![0.0; dim];
        for i in 0..dim {
            let mut expectation = 0.0;
            for word in 0..v {
                expectation += self.embeddings.row(word)[i] * exps[word];
            }
            expectation /= partition;
            gradient[i] = -(self.expected[i] - self.total * expectation - 2.0 * self.l2 * x[i]);
        }
        gradient
    }
}

/// Estimate one topic's vector from its latent-feature counts.
///
/// Returns the updated vector and its partition terms.
pub fn estimate_topic(
    topic: usize,
    warm_start: &[f64],
    counts: &[u32],
    embeddings: &EmbeddingTable,
) -> Result<(Vec<f64>, TopicPartition)> {
    let v = embeddings.len();
    let mut escalations = 0u32;
    loop {
        let l2 = L2_REGULARIZER * 10f64.powi(escalations as i32);
        let problem = MapProblem::new(counts, embeddings, l2);
        let mut solver = Lbfgs::new(MAX_ITERATIONS, TOLERANCE, LBFGS_HISTORY);
        let result = solver.minimize(
            |x| problem.neg_value(x),
            |x| problem.neg_gradient(x),
            warm_start.to_vec(),
        );

        if result.status == ConvergenceStatus::NumericalError {
            warn!(topic, l2, "topic vector optimization hit a numerical error, escalating");
        } else {
            let vector = result.solution;
            let mut dots = vec![0.0; v];
            let mut exps = vec![0.0; v];
            let mut sum = problem.partition(&vector, &mut dots, &mut exps);
            if sum == 0.0 || !sum.is_finite() {
                // Keep the solution; rescale the exponentials instead.
                sum = softmax_shifted(&dots, &mut exps);
            }
            if sum > 0.0 && sum.is_finite() {
                debug!(
                    topic,
                    iterations = result.iterations,
                    status = ?result.status,
                    "topic vector estimated"
                );
                return Ok((
                    vector,
                    TopicPartition {
                        dot: dots,
                        exp: exps,
                        sum,
                    },
                ));
            }
            warn!(topic, l2, "partition function degenerate after fallback, escalating");
        }

        escalations += 1;
        if escalations > MAX_ESCALATIONS {
            return Err(Error::NumericalInstability(format!(
                "topic {topic}: optimization failed after {MAX_ESCALATIONS} regularizer escalations"
            )));
        }
    }
}

/// Re-estimate every topic vector in parallel and build the next
/// partition cache. Vectors are warm-started from, and written back to,
/// `topic_vectors`. Blocks until all topics finish (hard barrier).
pub fn reestimate_all(
    pool: &crate::parallel::TopicPool,
    topic_vectors: &mut [Vec<f64>],
    lf_counts: &TopicWordCounts,
    embeddings: &EmbeddingTable,
) -> Result<PartitionCache> {
    let warm: &[Vec<f64>] = topic_vectors;
    let results = pool.map_topics(warm.len(), |topic| {
        estimate_topic(topic, &warm[topic], lf_counts.row(topic), embeddings)
    })?;

    let mut partitions = Vec::with_capacity(results.len());
    for (topic, (vector, partition)) in results.into_iter().enumerate() {
        topic_vectors[topic] = vector;
        partitions.push(partition);
    }
    Ok(PartitionCache::new(partitions))
}
