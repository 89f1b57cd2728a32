//! Criterion benchmarks for the Gibbs sampling hot path.
//!
//! The corpus is synthetic and seeded so runs are deterministic in CI and
//! on developer machines.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tm_core::sampler::{LfTerm, LfLda, SamplerParams};
use tm_core::state::LdaState;
use tm_corpus::Corpus;

const VOCAB_SIZE: usize = 500;
const NUM_TOPICS: usize = 20;
const NUM_DOCS: usize = 200;
const DOC_LEN: usize = 30;

fn synthetic_corpus(rng: &mut StdRng) -> Corpus {
    let documents = (0..NUM_DOCS)
        .map(|_| {
            (0..DOC_LEN)
                .map(|_| rng.random_range(0..VOCAB_SIZE))
                .collect()
        })
        .collect();
    Corpus::from_documents(documents)
}

fn bench_bootstrap_sweep(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1234);
    let corpus = synthetic_corpus(&mut rng);
    let params = SamplerParams::new(NUM_TOPICS, 0.1, 0.01, 0.6, VOCAB_SIZE);
    let state = LdaState::init_random(&corpus, VOCAB_SIZE, NUM_TOPICS, &mut rng);
    let mut model = LfLda::new(params, corpus, state, 50);

    c.bench_function("lflda_bootstrap_sweep", |b| {
        b.iter(|| {
            model.sweep(&mut rng, LfTerm::Smoothed);
            black_box(model.state.doc_topic_count(0, 0));
        })
    });
}

criterion_group!(benches, bench_bootstrap_sweep);
criterion_main!(benches);
