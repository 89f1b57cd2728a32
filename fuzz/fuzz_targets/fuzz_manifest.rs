//! Fuzz target for hyperparameter manifest parsing.

#![no_main]

use std::io::Write;

use libfuzzer_sys::fuzz_target;
use tm_core::config::TrainOptions;

fuzz_target!(|data: &[u8]| {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    let _ = TrainOptions::read_manifest(file.path());
});
