//! Single-topic-per-document sampler.
//!
//! A sweep visits every document, retracts all of its tokens from its
//! current shared topic, scores each candidate topic by the product of
//! its tokens' mixture probabilities, draws a topic, then re-decides
//! every token's generating component under the phase's
//! [`ComponentPolicy`].

use rand::Rng;
use tm_corpus::{Corpus, EmbeddingTable};
use tm_math::sample_discrete;
use tracing::{debug, info};

use crate::optimize::{reestimate_all, PartitionCache};
use crate::parallel::TopicPool;
use crate::state::{Component, DmmState};
use crate::Result;

use super::{ComponentPolicy, LfTerm, SamplerParams, Schedule};

/// LF-DMM model: one shared topic per document plus topic vectors.
pub struct LfDmm {
    pub params: SamplerParams,
    pub corpus: Corpus,
    pub state: DmmState,
    pub topic_vectors: Vec<Vec<f64>>,
    /// Partition terms of the most recent mixture iteration; `None` until
    /// the first one completes.
    pub cache: Option<PartitionCache>,
    weights: Vec<f64>,
    components: Vec<Component>,
}

impl LfDmm {
    pub fn new(params: SamplerParams, corpus: Corpus, state: DmmState, vector_dim: usize) -> Self {
        let num_topics = params.num_topics;
        Self {
            params,
            corpus,
            state,
            topic_vectors: vec![vec![0.0; vector_dim]; num_topics],
            cache: None,
            weights: vec![0.0; num_topics],
            components: Vec::new(),
        }
    }

    fn lf_prob(&self, term: LfTerm<'_>, topic: usize, word: usize) -> f64 {
        match term {
            LfTerm::Smoothed => {
                (f64::from(self.state.lf.count(topic, word)) + self.params.beta)
                    / (f64::from(self.state.lf.row_sum(topic)) + self.params.beta_sum)
            }
            LfTerm::Softmax(cache) => cache.word_prob(topic, word),
        }
    }

    fn dm_prob(&self, topic: usize, word: usize) -> f64 {
        (f64::from(self.state.dm.count(topic, word)) + self.params.beta)
            / (f64::from(self.state.dm.row_sum(topic)) + self.params.beta_sum)
    }

    /// One full pass over every document.
    pub fn sweep<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        term: LfTerm<'_>,
        policy: ComponentPolicy,
    ) {
        let k = self.params.num_topics;
        let alpha = self.params.alpha;
        let lambda = self.params.lambda;

        for doc in 0..self.corpus.len() {
            let words: Vec<usize> = self.corpus.document(doc).to_vec();
            self.state.decrement_doc(doc, &words);

            for topic in 0..k {
                let mut weight = f64::from(self.state.topic_doc_count(topic)) + alpha;
                for &word in &words {
                    let lf = self.lf_prob(term, topic, word);
                    let dm = self.dm_prob(topic, word);
                    weight *= lambda * lf + (1.0 - lambda) * dm;
                }
                self.weights[topic] = weight;
            }
            let topic = sample_discrete(rng, &self.weights);

            self.components.clear();
            for &word in &words {
                let lf_weight = lambda * self.lf_prob(term, topic, word);
                let dm_weight = (1.0 - lambda) * self.dm_prob(topic, word);
                let component = policy.choose(rng, lf_weight, dm_weight);
                self.components.push(component);
            }
            self.state
                .increment_doc(doc, &words, topic, &self.components);
        }
    }

    /// Run the two-phase schedule: Stochastic component choice while
    /// bootstrapping, Greedy once the mixture phase starts. `snapshot`
    /// fires after every `save_step`-th mixture iteration except the
    /// last.
    pub fn run<R, S>(
        &mut self,
        schedule: Schedule,
        embeddings: &EmbeddingTable,
        pool: &TopicPool,
        rng: &mut R,
        mut snapshot: S,
    ) -> Result<()>
    where
        R: Rng + ?Sized,
        S: FnMut(&LfDmm, usize) -> Result<()>,
    {
        info!(
            init = schedule.init_iterations,
            em = schedule.em_iterations,
            "running LF-DMM Gibbs sampling"
        );
        for iteration in 1..=schedule.init_iterations {
            debug!(iteration, "bootstrap sampling iteration");
            self.sweep(rng, LfTerm::Smoothed, ComponentPolicy::Stochastic);
        }
        for iteration in 1..=schedule.em_iterations {
            debug!(iteration, "mixture sampling iteration");
            let cache =
                reestimate_all(pool, &mut self.topic_vectors, &self.state.lf, embeddings)?;
            self.sweep(rng, LfTerm::Softmax(&cache), ComponentPolicy::Greedy);
            self.cache = Some(cache);

            if schedule.save_step > 0
                && iteration % schedule.save_step == 0
                && iteration < schedule.em_iterations
            {
                info!(iteration, "writing snapshot");
                snapshot(&*self, iteration)?;
            }
        }
        info!("sampling completed");
        Ok(())
    }
}
