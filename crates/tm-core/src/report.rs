//! Output artifact writers.
//!
//! Every artifact is plain text named `<experiment>.<kind>` in the run's
//! output directory:
//! - `.theta` — document-topic distribution, one normalized row per doc
//! - `.phi` — topic-word mixture distribution, one row per topic
//! - `.topWords` — ranked most probable words per topic
//! - `.topicAssignments` — raw per-token assignment dump
//! - `.topicVectors` — one topic vector per line
//!
//! Writers read sampler state only; they never mutate it. Snapshots use
//! the same writers under an iteration-suffixed experiment name.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tm_corpus::{write_assignments, Vocabulary};

use crate::optimize::PartitionCache;
use crate::sampler::{LfDmm, LfLda, SamplerParams};
use crate::state::TopicWordCounts;
use crate::Result;

/// Writes artifacts for one experiment directory.
pub struct Reporter {
    dir: PathBuf,
    top_words: usize,
}

/// Mixture topic-word probability. Falls back to the smoothed
/// latent-feature ratio when no partition cache exists yet (a run with
/// zero mixture iterations).
fn word_prob(
    params: &SamplerParams,
    cache: Option<&PartitionCache>,
    lf: &TopicWordCounts,
    dm: &TopicWordCounts,
    topic: usize,
    word: usize,
) -> f64 {
    let lf_prob = match cache {
        Some(cache) => cache.word_prob(topic, word),
        None => {
            (f64::from(lf.count(topic, word)) + params.beta)
                / (f64::from(lf.row_sum(topic)) + params.beta_sum)
        }
    };
    let dm_prob = (f64::from(dm.count(topic, word)) + params.beta)
        / (f64::from(dm.row_sum(topic)) + params.beta_sum);
    params.lambda * lf_prob + (1.0 - params.lambda) * dm_prob
}

impl Reporter {
    pub fn new(dir: PathBuf, top_words: usize) -> Self {
        Self { dir, top_words }
    }

    fn create(&self, name: &str, kind: &str) -> Result<BufWriter<File>> {
        let path = self.dir.join(format!("{name}.{kind}"));
        Ok(BufWriter::new(File::create(path)?))
    }

    /// Write theta, phi, top words, and assignments for an LF-LDA model.
    pub fn write_lflda(&self, name: &str, model: &LfLda, vocab: &Vocabulary) -> Result<()> {
        self.write_theta_lflda(name, model)?;
        self.write_phi(
            name,
            &model.params,
            model.cache.as_ref(),
            &model.state.lf,
            &model.state.dm,
        )?;
        self.write_top_words(
            name,
            &model.params,
            model.cache.as_ref(),
            &model.state.lf,
            &model.state.dm,
            vocab,
        )?;
        write_assignments(
            &self.dir.join(format!("{name}.topicAssignments")),
            model.state.assignments(),
        )?;
        Ok(())
    }

    /// Write theta, phi, top words, and assignments for an LF-DMM model.
    pub fn write_lfdmm(&self, name: &str, model: &LfDmm, vocab: &Vocabulary) -> Result<()> {
        self.write_theta_lfdmm(name, model)?;
        self.write_phi(
            name,
            &model.params,
            model.cache.as_ref(),
            &model.state.lf,
            &model.state.dm,
        )?;
        self.write_top_words(
            name,
            &model.params,
            model.cache.as_ref(),
            &model.state.lf,
            &model.state.dm,
            vocab,
        )?;
        write_assignments(
            &self.dir.join(format!("{name}.topicAssignments")),
            model.state.assignments(),
        )?;
        Ok(())
    }

    /// Smoothed per-document topic proportions.
    fn write_theta_lflda(&self, name: &str, model: &LfLda) -> Result<()> {
        let mut writer = self.create(name, "theta")?;
        let k = model.params.num_topics;
        let alpha_sum = model.params.alpha * k as f64;
        for doc in 0..model.corpus.len() {
            let denominator = f64::from(model.state.doc_len(doc)) + alpha_sum;
            for topic in 0..k {
                let p = (f64::from(model.state.doc_topic_count(doc, topic)) + model.params.alpha)
                    / denominator;
                write!(writer, "{p} ")?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Posterior topic weight of each whole document, normalized.
    fn write_theta_lfdmm(&self, name: &str, model: &LfDmm) -> Result<()> {
        let mut writer = self.create(name, "theta")?;
        let k = model.params.num_topics;
        for doc in 0..model.corpus.len() {
            let mut weights = vec![0.0; k];
            let mut total = 0.0;
            for (topic, weight) in weights.iter_mut().enumerate() {
                let mut value = f64::from(model.state.topic_doc_count(topic)) + model.params.alpha;
                for &word in model.corpus.document(doc) {
                    value *= word_prob(
                        &model.params,
                        model.cache.as_ref(),
                        &model.state.lf,
                        &model.state.dm,
                        topic,
                        word,
                    );
                }
                *weight = value;
                total += value;
            }
            for weight in &weights {
                // A long document can underflow every weight to zero;
                // degenerate rows fall back to uniform.
                let p = if total > 0.0 {
                    weight / total
                } else {
                    1.0 / k as f64
                };
                write!(writer, "{p} ")?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_phi(
        &self,
        name: &str,
        params: &SamplerParams,
        cache: Option<&PartitionCache>,
        lf: &TopicWordCounts,
        dm: &TopicWordCounts,
    ) -> Result<()> {
        let mut writer = self.create(name, "phi")?;
        for topic in 0..params.num_topics {
            for word in 0..lf.vocab_size() {
                let p = word_prob(params, cache, lf, dm, topic, word);
                write!(writer, "{p} ")?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_top_words(
        &self,
        name: &str,
        params: &SamplerParams,
        cache: Option<&PartitionCache>,
        lf: &TopicWordCounts,
        dm: &TopicWordCounts,
        vocab: &Vocabulary,
    ) -> Result<()> {
        let mut writer = self.create(name, "topWords")?;
        for topic in 0..params.num_topics {
            let mut ranked: Vec<(usize, f64)> = (0..lf.vocab_size())
                .map(|word| (word, word_prob(params, cache, lf, dm, topic, word)))
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

            write!(writer, "Topic{topic}:")?;
            for (word, _) in ranked.iter().take(self.top_words) {
                let token = vocab.word(*word).unwrap_or_default();
                write!(writer, " {token}")?;
            }
            writeln!(writer)?;
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// One topic vector per line, components space-separated.
    pub fn write_topic_vectors(&self, name: &str, topic_vectors: &[Vec<f64>]) -> Result<()> {
        let mut writer = self.create(name, "topicVectors")?;
        for vector in topic_vectors {
            for component in vector {
                write!(writer, "{component} ")?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }
}
