//! Latent-feature topic model engine.
//!
//! Two collapsed-Gibbs model variants over a shared count/state core:
//! - `sampler::lflda` — one (topic, component) assignment per token
//! - `sampler::lfdmm` — one topic per document, per-token component
//!
//! Both blend a Dirichlet-multinomial topic-word term with a latent-feature
//! term whose per-topic vectors are re-estimated by MAP (L-BFGS) once per
//! EM-phase iteration, in parallel across topics.
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod error;
pub mod eval;
pub mod infer;
pub mod logging;
pub mod optimize;
pub mod parallel;
pub mod report;
pub mod sampler;
pub mod state;
pub mod train;

pub use error::{Error, Result};
