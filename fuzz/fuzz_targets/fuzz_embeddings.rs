//! Fuzz target for word-vector file loading.

#![no_main]

use std::io::Write;

use libfuzzer_sys::fuzz_target;
use tm_corpus::{EmbeddingTable, Vocabulary};

fuzz_target!(|data: &[u8]| {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    let mut vocab = Vocabulary::new();
    vocab.intern("alpha");
    vocab.intern("beta");
    let _ = EmbeddingTable::load(file.path(), &vocab);
});
