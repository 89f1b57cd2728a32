//! Bounded worker pool for the per-topic optimization fan-out.
//!
//! Topic-vector estimation is the only parallel stage in a run: each
//! topic's subproblem is independent, and the sampler blocks on the full
//! result set before its next sweep, so the collect below doubles as the
//! synchronization barrier. Everything else stays single-threaded.

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::{Error, Result};

/// Rayon pool scoped to topic-index fan-outs.
pub struct TopicPool {
    pool: ThreadPool,
}

impl TopicPool {
    /// Build a pool with `threads` workers; `None` uses one per core.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.unwrap_or(0))
            .build()
            .map_err(|e| Error::Config(format!("failed to build worker pool: {e}")))?;
        Ok(Self { pool })
    }

    /// Apply `f` to every topic index and join all results before
    /// returning. No cross-topic ordering is guaranteed; the first error
    /// aborts the batch.
    pub fn map_topics<T, F>(&self, num_topics: usize, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> Result<T> + Sync,
    {
        self.pool
            .install(|| (0..num_topics).into_par_iter().map(|t| f(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn maps_every_topic_in_index_order() {
        let pool = TopicPool::new(Some(4)).unwrap();
        let out = pool.map_topics(16, |t| Ok(t * t)).unwrap();
        assert_eq!(out, (0..16).map(|t| t * t).collect::<Vec<_>>());
    }

    #[test]
    fn error_aborts_the_batch() {
        let pool = TopicPool::new(Some(2)).unwrap();
        let result: Result<Vec<usize>> = pool.map_topics(8, |t| {
            if t == 5 {
                Err(Error::NumericalInstability("topic 5".to_string()))
            } else {
                Ok(t)
            }
        });
        assert!(matches!(result, Err(Error::NumericalInstability(_))));
    }

    #[test]
    fn all_topics_run_exactly_once() {
        let pool = TopicPool::new(None).unwrap();
        let counter = AtomicUsize::new(0);
        let _ = pool
            .map_topics(32, |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 32);
    }
}
