//! Run configuration and the hyperparameter manifest.
//!
//! The manifest is a tab-separated `-key value` file written next to the
//! training corpus as `<name>.paras`. It records everything needed to
//! rebuild the trained count tables later (inference on unseen text keys
//! off it), so the key set and spellings stay compatible with existing
//! `.paras` files.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which model variant a run trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ModelKind {
    /// Multi-topic-per-document variant (one assignment per token).
    Lflda,
    /// Single-topic-per-document variant.
    Lfdmm,
}

impl ModelKind {
    /// Manifest spelling, kept compatible with existing `.paras` files.
    pub fn manifest_name(self) -> &'static str {
        match self {
            ModelKind::Lflda => "LFLDA",
            ModelKind::Lfdmm => "LFDMM",
        }
    }

    pub fn from_manifest_name(name: &str) -> Option<Self> {
        match name {
            "LFLDA" => Some(ModelKind::Lflda),
            "LFDMM" => Some(ModelKind::Lfdmm),
            _ => None,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.manifest_name())
    }
}

/// Full configuration of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainOptions {
    pub model: ModelKind,
    pub corpus: PathBuf,
    pub vectors: PathBuf,
    pub num_topics: usize,
    pub alpha: f64,
    pub beta: f64,
    pub lambda: f64,
    /// Sweeps of the pure Dirichlet-multinomial bootstrap phase.
    pub init_iterations: usize,
    /// Sweeps of the mixture phase, each preceded by vector re-estimation.
    pub em_iterations: usize,
    pub top_words: usize,
    /// Experiment name; prefixes every output artifact.
    pub name: String,
    /// Warm-start assignment file; random initialization when absent.
    pub init_assignments: Option<PathBuf>,
    /// Snapshot every N mixture iterations; 0 disables snapshots.
    pub save_step: usize,
    /// RNG seed; absent means seeded from OS entropy.
    pub seed: Option<u64>,
    /// Worker threads for topic-vector estimation; absent uses all cores.
    pub threads: Option<usize>,
}

impl TrainOptions {
    pub fn validate(&self) -> Result<()> {
        if self.num_topics == 0 {
            return Err(Error::Config("ntopics must be at least 1".to_string()));
        }
        if !(self.alpha > 0.0) {
            return Err(Error::Config(format!("alpha must be positive: {}", self.alpha)));
        }
        if !(self.beta > 0.0) {
            return Err(Error::Config(format!("beta must be positive: {}", self.beta)));
        }
        if !(0.0..=1.0).contains(&self.lambda) {
            return Err(Error::Config(format!(
                "lambda must lie in [0, 1]: {}",
                self.lambda
            )));
        }
        if self.name.is_empty() {
            return Err(Error::Config("experiment name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Directory every output artifact lands in (next to the corpus).
    pub fn output_dir(&self) -> PathBuf {
        self.corpus
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Path of the `<name>.paras` manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir().join(format!("{}.paras", self.name))
    }

    /// Write the manifest.
    pub fn write_manifest(&self) -> Result<()> {
        let mut writer = BufWriter::new(File::create(self.manifest_path())?);
        writeln!(writer, "-model\t{}", self.model.manifest_name())?;
        writeln!(writer, "-corpus\t{}", self.corpus.display())?;
        writeln!(writer, "-vectors\t{}", self.vectors.display())?;
        writeln!(writer, "-ntopics\t{}", self.num_topics)?;
        writeln!(writer, "-alpha\t{}", self.alpha)?;
        writeln!(writer, "-beta\t{}", self.beta)?;
        writeln!(writer, "-lambda\t{}", self.lambda)?;
        writeln!(writer, "-initers\t{}", self.init_iterations)?;
        writeln!(writer, "-niters\t{}", self.em_iterations)?;
        writeln!(writer, "-twords\t{}", self.top_words)?;
        writeln!(writer, "-name\t{}", self.name)?;
        if let Some(path) = &self.init_assignments {
            writeln!(writer, "-initFile\t{}", path.display())?;
        }
        if self.save_step > 0 {
            writeln!(writer, "-sstep\t{}", self.save_step)?;
        }
        if let Some(seed) = self.seed {
            writeln!(writer, "-seed\t{seed}")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a manifest back into options.
    pub fn read_manifest(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut entries = HashMap::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                return Err(Error::InvalidManifest(format!("malformed line: {line:?}")));
            };
            entries.insert(key.to_string(), value.to_string());
        }

        let get = |key: &str| -> Result<String> {
            entries
                .get(key)
                .cloned()
                .ok_or_else(|| Error::InvalidManifest(format!("missing key {key}")))
        };
        let parse = |key: &str, value: &str| {
            Error::InvalidManifest(format!("bad value for {key}: {value:?}"))
        };

        let model_name = get("-model")?;
        let model = ModelKind::from_manifest_name(&model_name)
            .ok_or_else(|| parse("-model", &model_name))?;

        macro_rules! field {
            ($key:literal, $ty:ty) => {{
                let raw = get($key)?;
                raw.parse::<$ty>().map_err(|_| parse($key, &raw))?
            }};
        }

        let options = Self {
            model,
            corpus: PathBuf::from(get("-corpus")?),
            vectors: PathBuf::from(get("-vectors")?),
            num_topics: field!("-ntopics", usize),
            alpha: field!("-alpha", f64),
            beta: field!("-beta", f64),
            lambda: field!("-lambda", f64),
            init_iterations: field!("-initers", usize),
            em_iterations: field!("-niters", usize),
            top_words: field!("-twords", usize),
            name: get("-name")?,
            init_assignments: entries.get("-initFile").map(PathBuf::from),
            save_step: match entries.get("-sstep") {
                Some(raw) => raw.parse().map_err(|_| parse("-sstep", raw))?,
                None => 0,
            },
            seed: match entries.get("-seed") {
                Some(raw) => Some(raw.parse().map_err(|_| parse("-seed", raw))?),
                None => None,
            },
            threads: None,
        };
        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dir: &Path) -> TrainOptions {
        TrainOptions {
            model: ModelKind::Lflda,
            corpus: dir.join("corpus.txt"),
            vectors: dir.join("vectors.txt"),
            num_topics: 4,
            alpha: 0.1,
            beta: 0.01,
            lambda: 0.6,
            init_iterations: 20,
            em_iterations: 10,
            top_words: 5,
            name: "exp".to_string(),
            init_assignments: None,
            save_step: 0,
            seed: Some(13),
            threads: None,
        }
    }

    #[test]
    fn manifest_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        opts.write_manifest().unwrap();
        let back = TrainOptions::read_manifest(&opts.manifest_path()).unwrap();
        assert_eq!(back.model, ModelKind::Lflda);
        assert_eq!(back.num_topics, 4);
        assert_eq!(back.alpha, 0.1);
        assert_eq!(back.lambda, 0.6);
        assert_eq!(back.name, "exp");
        assert_eq!(back.seed, Some(13));
        assert_eq!(back.save_step, 0);
    }

    #[test]
    fn unknown_model_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.paras");
        std::fs::write(&path, "-model\tLDA\n-corpus\tc\n").unwrap();
        assert!(matches!(
            TrainOptions::read_manifest(&path),
            Err(Error::InvalidManifest(_))
        ));
    }

    #[test]
    fn validation_rejects_bad_lambda() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.lambda = 1.5;
        assert!(matches!(opts.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn validation_rejects_zero_topics() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.num_topics = 0;
        assert!(opts.validate().is_err());
    }
}
