//! Training entry point: load, initialize, sample, write artifacts.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tm_corpus::{read_assignments, Corpus, EmbeddingTable, Vocabulary};
use tracing::info;

use crate::config::{ModelKind, TrainOptions};
use crate::parallel::TopicPool;
use crate::report::Reporter;
use crate::sampler::{LfDmm, LfLda, SamplerParams, Schedule};
use crate::state::{DmmState, LdaState};
use crate::Result;

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Run one training experiment to completion.
pub fn run(options: &TrainOptions) -> Result<()> {
    options.validate()?;

    let mut vocab = Vocabulary::new();
    let corpus = Corpus::load(&options.corpus, &mut vocab)?;
    let embeddings = EmbeddingTable::load(&options.vectors, &vocab)?;

    info!(
        model = %options.model,
        topics = options.num_topics,
        alpha = options.alpha,
        beta = options.beta,
        lambda = options.lambda,
        "starting training run"
    );

    let mut rng = seeded_rng(options.seed);
    let pool = TopicPool::new(options.threads)?;
    let params = SamplerParams::new(
        options.num_topics,
        options.alpha,
        options.beta,
        options.lambda,
        vocab.len(),
    );
    let schedule = Schedule {
        init_iterations: options.init_iterations,
        em_iterations: options.em_iterations,
        save_step: options.save_step,
    };
    let reporter = Reporter::new(options.output_dir(), options.top_words);

    match options.model {
        ModelKind::Lflda => {
            let state = match &options.init_assignments {
                Some(path) => {
                    info!(path = %path.display(), "replaying topic assignments");
                    let assignments = read_assignments(path, options.num_topics)?;
                    LdaState::init_from_assignments(
                        &corpus,
                        vocab.len(),
                        options.num_topics,
                        assignments,
                    )?
                }
                None => {
                    info!("randomly initializing topic assignments");
                    LdaState::init_random(&corpus, vocab.len(), options.num_topics, &mut rng)
                }
            };
            let mut model = LfLda::new(params, corpus, state, embeddings.dim());
            model.run(schedule, &embeddings, &pool, &mut rng, |model, iteration| {
                reporter.write_lflda(&format!("{}-{iteration}", options.name), model, &vocab)
            })?;

            options.write_manifest()?;
            info!("writing output from the last sample");
            reporter.write_lflda(&options.name, &model, &vocab)?;
            reporter.write_topic_vectors(&options.name, &model.topic_vectors)?;
        }
        ModelKind::Lfdmm => {
            let state = match &options.init_assignments {
                Some(path) => {
                    info!(path = %path.display(), "replaying topic assignments");
                    let assignments = read_assignments(path, options.num_topics)?;
                    DmmState::init_from_assignments(
                        &corpus,
                        vocab.len(),
                        options.num_topics,
                        assignments,
                    )?
                }
                None => {
                    info!("randomly initializing topic assignments");
                    DmmState::init_random(&corpus, vocab.len(), options.num_topics, &mut rng)
                }
            };
            let mut model = LfDmm::new(params, corpus, state, embeddings.dim());
            model.run(schedule, &embeddings, &pool, &mut rng, |model, iteration| {
                reporter.write_lfdmm(&format!("{}-{iteration}", options.name), model, &vocab)
            })?;

            options.write_manifest()?;
            info!("writing output from the last sample");
            reporter.write_lfdmm(&options.name, &model, &vocab)?;
            reporter.write_topic_vectors(&options.name, &model.topic_vectors)?;
        }
    }
    Ok(())
}
