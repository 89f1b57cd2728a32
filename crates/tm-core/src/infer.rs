//! Inference of topic distributions on an unseen corpus.
//!
//! A trained experiment is reconstructed from its hyperparameter
//! manifest: the training corpus rebuilds the vocabulary, the persisted
//! assignment file replays the trained topic-word counts, and the unseen
//! corpus is loaded against that fixed vocabulary with unknown tokens
//! silently dropped. Sampling then runs the normal two-phase schedule
//! with the trained counts as a fixed base; only the unseen documents'
//! assignments and document-level counts are drawn fresh.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tm_corpus::{read_assignments, Corpus, EmbeddingTable, Vocabulary};
use tracing::info;

use crate::config::{ModelKind, TrainOptions};
use crate::parallel::TopicPool;
use crate::report::Reporter;
use crate::sampler::{LfDmm, LfLda, SamplerParams, Schedule};
use crate::state::{DmmState, LdaState};
use crate::{Error, Result};

/// Options of an inference run over unseen text.
#[derive(Debug, Clone)]
pub struct InferOptions {
    /// `.paras` manifest of the trained experiment.
    pub manifest: PathBuf,
    /// Unseen corpus path.
    pub corpus: PathBuf,
    pub init_iterations: usize,
    pub em_iterations: usize,
    pub top_words: usize,
    pub name: String,
    pub save_step: usize,
    pub seed: Option<u64>,
    pub threads: Option<usize>,
}

/// Flatten the trained (word, assignment) pairs, checking that the
/// assignment file still agrees with the training corpus.
fn training_tokens(corpus: &Corpus, assignments: &[Vec<usize>]) -> Result<Vec<(usize, usize)>> {
    if assignments.len() != corpus.len() {
        return Err(Error::Inconsistent(format!(
            "trained assignment file has {} documents, training corpus has {}",
            assignments.len(),
            corpus.len()
        )));
    }
    let mut tokens = Vec::with_capacity(corpus.num_tokens());
    for (doc_id, (document, values)) in corpus.documents().zip(assignments.iter()).enumerate() {
        if document.len() != values.len() {
            return Err(Error::Inconsistent(format!(
                "training document {doc_id} has {} tokens but {} assignments",
                document.len(),
                values.len()
            )));
        }
        for (&word, &value) in document.iter().zip(values.iter()) {
            tokens.push((word, value));
        }
    }
    Ok(tokens)
}

/// Run inference to completion, writing artifacts next to the unseen
/// corpus under `options.name`.
pub fn run(options: &InferOptions) -> Result<()> {
    let trained = TrainOptions::read_manifest(&options.manifest)?;
    info!(model = %trained.model, name = trained.name, "loading pre-trained model");

    let mut vocab = Vocabulary::new();
    let train_corpus = Corpus::load(&trained.corpus, &mut vocab)?;
    let assignments_path = trained
        .output_dir()
        .join(format!("{}.topicAssignments", trained.name));
    let trained_assignments = read_assignments(&assignments_path, trained.num_topics)?;
    let tokens = training_tokens(&train_corpus, &trained_assignments)?;

    let unseen = Corpus::load_with_vocab(&options.corpus, &vocab)?;
    let embeddings = EmbeddingTable::load(&trained.vectors, &vocab)?;

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let pool = TopicPool::new(options.threads)?;
    let params = SamplerParams::new(
        trained.num_topics,
        trained.alpha,
        trained.beta,
        trained.lambda,
        vocab.len(),
    );
    let schedule = Schedule {
        init_iterations: options.init_iterations,
        em_iterations: options.em_iterations,
        save_step: options.save_step,
    };
    let output_dir = options
        .corpus
        .parent()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let reporter = Reporter::new(output_dir.clone(), options.top_words);

    match trained.model {
        ModelKind::Lflda => {
            let mut state =
                LdaState::init_random(&unseen, vocab.len(), trained.num_topics, &mut rng);
            state.seed_topic_word_counts(&tokens);
            let mut model = LfLda::new(params, unseen, state, embeddings.dim());
            model.run(schedule, &embeddings, &pool, &mut rng, |model, iteration| {
                reporter.write_lflda(&format!("{}-{iteration}", options.name), model, &vocab)
            })?;
            reporter.write_lflda(&options.name, &model, &vocab)?;
            reporter.write_topic_vectors(&options.name, &model.topic_vectors)?;
        }
        ModelKind::Lfdmm => {
            let mut state =
                DmmState::init_random(&unseen, vocab.len(), trained.num_topics, &mut rng);
            state.seed_topic_word_counts(&tokens);
            let mut model = LfDmm::new(params, unseen, state, embeddings.dim());
            model.run(schedule, &embeddings, &pool, &mut rng, |model, iteration| {
                reporter.write_lfdmm(&format!("{}-{iteration}", options.name), model, &vocab)
            })?;
            reporter.write_lfdmm(&options.name, &model, &vocab)?;
            reporter.write_topic_vectors(&options.name, &model.topic_vectors)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_tokens_flattens_in_order() {
        let corpus = Corpus::from_documents(vec![vec![3, 1], vec![4]]);
        let assignments = vec![vec![0, 2], vec![1]];
        let tokens = training_tokens(&corpus, &assignments).unwrap();
        assert_eq!(tokens, vec![(3, 0), (1, 2), (4, 1)]);
    }

    #[test]
    fn training_tokens_rejects_document_mismatch() {
        let corpus = Corpus::from_documents(vec![vec![3, 1], vec![4]]);
        let assignments = vec![vec![0, 2]];
        assert!(matches!(
            training_tokens(&corpus, &assignments),
            Err(Error::Inconsistent(_))
        ));
    }

    #[test]
    fn training_tokens_rejects_length_mismatch() {
        let corpus = Corpus::from_documents(vec![vec![3, 1]]);
        let assignments = vec![vec![0]];
        assert!(matches!(
            training_tokens(&corpus, &assignments),
            Err(Error::Inconsistent(_))
        ));
    }
}
