//! Latent-feature topic modeling - training, inference, and evaluation.
//!
//! Subcommands:
//! - `train` - fit LF-LDA or LF-DMM on a corpus
//! - `infer` - topic distributions for an unseen corpus from a trained model
//! - `eval`  - purity/NMI clustering scores against gold labels

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tm_core::config::{ModelKind, TrainOptions};
use tm_core::eval::EvalOptions;
use tm_core::infer::InferOptions;
use tm_core::{eval, infer, logging, train};

/// Latent-feature topic models with collapsed Gibbs sampling
#[derive(Parser)]
#[command(name = "tm-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a topic model on a corpus
    Train(TrainArgs),

    /// Infer topic distributions on an unseen corpus
    Infer(InferArgs),

    /// Evaluate document clusterings against gold labels
    Eval(EvalArgs),
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Model variant
    #[arg(long, value_enum)]
    model: ModelKind,

    /// Path to the topic modeling corpus
    #[arg(long)]
    corpus: PathBuf,

    /// Path to the file containing word vectors
    #[arg(long)]
    vectors: PathBuf,

    /// Number of topics
    #[arg(long, default_value_t = 20)]
    ntopics: usize,

    /// Document-topic smoothing
    #[arg(long, default_value_t = 0.1)]
    alpha: f64,

    /// Topic-word smoothing
    #[arg(long, default_value_t = 0.01)]
    beta: f64,

    /// Mixture weight of the latent-feature component
    #[arg(long, default_value_t = 0.6)]
    lambda: f64,

    /// Number of initial sampling iterations
    #[arg(long, default_value_t = 2000)]
    initers: usize,

    /// Number of EM-style sampling iterations
    #[arg(long, default_value_t = 200)]
    niters: usize,

    /// Number of top topical words to report
    #[arg(long, default_value_t = 20)]
    twords: usize,

    /// Experiment name
    #[arg(long, default_value = "model")]
    name: String,

    /// Warm-start topic assignment file
    #[arg(long)]
    init_file: Option<PathBuf>,

    /// Snapshot cadence in EM iterations (0 = final output only)
    #[arg(long, default_value_t = 0)]
    sstep: usize,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads for topic-vector estimation
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Args, Debug)]
struct InferArgs {
    /// Manifest (.paras) of the trained experiment
    #[arg(long)]
    paras: PathBuf,

    /// Path to the unseen corpus
    #[arg(long)]
    corpus: PathBuf,

    /// Number of initial sampling iterations
    #[arg(long, default_value_t = 100)]
    initers: usize,

    /// Number of EM-style sampling iterations
    #[arg(long, default_value_t = 20)]
    niters: usize,

    /// Number of top topical words to report
    #[arg(long, default_value_t = 20)]
    twords: usize,

    /// Experiment name for the inference outputs
    #[arg(long, default_value = "modelinf")]
    name: String,

    /// Snapshot cadence in EM iterations (0 = final output only)
    #[arg(long, default_value_t = 0)]
    sstep: usize,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads for topic-vector estimation
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Args, Debug)]
struct EvalArgs {
    /// Gold label file, one label per line
    #[arg(long)]
    label: PathBuf,

    /// Directory of document-topic distribution files
    #[arg(long)]
    dir: PathBuf,

    /// File suffix selecting the distributions to score
    #[arg(long, default_value = "theta")]
    prob: String,
}

fn run(cli: Cli) -> tm_core::Result<()> {
    match cli.command {
        Commands::Train(args) => {
            let options = TrainOptions {
                model: args.model,
                corpus: args.corpus,
                vectors: args.vectors,
                num_topics: args.ntopics,
                alpha: args.alpha,
                beta: args.beta,
                lambda: args.lambda,
                init_iterations: args.initers,
                em_iterations: args.niters,
                top_words: args.twords,
                name: args.name,
                init_assignments: args.init_file,
                save_step: args.sstep,
                seed: args.seed,
                threads: args.threads,
            };
            train::run(&options)
        }
        Commands::Infer(args) => {
            let options = InferOptions {
                manifest: args.paras,
                corpus: args.corpus,
                init_iterations: args.initers,
                em_iterations: args.niters,
                top_words: args.twords,
                name: args.name,
                save_step: args.sstep,
                seed: args.seed,
                threads: args.threads,
            };
            infer::run(&options)
        }
        Commands::Eval(args) => eval::evaluate(&EvalOptions {
            labels: args.label,
            dir: args.dir,
            suffix: args.prob,
        }),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.global.verbose, cli.global.quiet);

    if let Err(err) = run(cli) {
        tracing::error!(code = err.code(), "{err}");
        std::process::exit(err.code() as i32);
    }
}
