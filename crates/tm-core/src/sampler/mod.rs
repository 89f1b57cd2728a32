//! Collapsed Gibbs samplers.
//!
//! Both variants run the same two-phase schedule: a bootstrap phase in
//! which each component is scored by its smoothed count ratio (topic
//! vectors do not exist yet), then a mixture phase in which the
//! latent-feature term reads the softmax partition cache re-estimated at
//! the top of every iteration. Sweeps are strictly sequential; each unit
//! follows decrement → resample → increment so it is excluded from the
//! posterior it is drawn from.
//!
//! Component selection differs by variant and phase. The multi-topic
//! sampler always draws the (topic, component) pair jointly. The
//! single-topic sampler draws the topic first, then re-decides every
//! token's component under [`ComponentPolicy`]: `Stochastic` during
//! bootstrap, `Greedy` during mixture sweeps.

pub mod lfdmm;
pub mod lflda;

pub use lfdmm::LfDmm;
pub use lflda::LfLda;

use rand::Rng;

use crate::optimize::PartitionCache;
use crate::state::Component;

/// Iteration counts of the two-phase schedule.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    /// Bootstrap sweeps before topic vectors exist.
    pub init_iterations: usize,
    /// Mixture sweeps, each preceded by vector re-estimation.
    pub em_iterations: usize,
    /// Snapshot cadence in mixture iterations; 0 disables snapshots.
    pub save_step: usize,
}

/// Hyperparameters shared by both variants.
#[derive(Debug, Clone, Copy)]
pub struct SamplerParams {
    pub num_topics: usize,
    pub alpha: f64,
    pub beta: f64,
    pub lambda: f64,
    /// `beta * vocabulary_size`, the smoothing mass of one topic row.
    pub beta_sum: f64,
}

impl SamplerParams {
    pub fn new(num_topics: usize, alpha: f64, beta: f64, lambda: f64, vocab_size: usize) -> Self {
        Self {
            num_topics,
            alpha,
            beta,
            lambda,
            beta_sum: beta * vocab_size as f64,
        }
    }
}

/// Source of the latent-feature topic-word probability for one sweep.
#[derive(Clone, Copy)]
pub enum LfTerm<'a> {
    /// Smoothed ratio over latent-feature counts (bootstrap phase).
    Smoothed,
    /// Softmax of topic-vector dot products (mixture phase).
    Softmax(&'a PartitionCache),
}

/// How a token's generating component is chosen once its topic is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentPolicy {
    /// Draw proportionally to the two component weights.
    Stochastic,
    /// Take the numerically larger weight.
    Greedy,
}

impl ComponentPolicy {
    pub fn choose<R: Rng + ?Sized>(
        self,
        rng: &mut R,
        lf_weight: f64,
        dm_weight: f64,
    ) -> Component {
        match self {
            ComponentPolicy::Greedy => {
                if lf_weight > dm_weight {
                    Component::LatentFeature
                } else {
                    Component::Multinomial
                }
            }
            ComponentPolicy::Stochastic => {
                let total = lf_weight + dm_weight;
                if rng.random::<f64>() * total < lf_weight {
                    Component::LatentFeature
                } else {
                    Component::Multinomial
                }
            }
        }
    }
}
