//! Fuzz target for corpus file loading.
//!
//! Arbitrary bytes must never panic the loader, only return an error.

#![no_main]

use std::io::Write;

use libfuzzer_sys::fuzz_target;
use tm_corpus::{Corpus, Vocabulary};

fuzz_target!(|data: &[u8]| {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    let mut vocab = Vocabulary::new();
    let _ = Corpus::load(file.path(), &mut vocab);
});
