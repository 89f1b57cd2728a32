//! Fuzz target for topic-assignment file parsing.

#![no_main]

use std::io::Write;

use libfuzzer_sys::fuzz_target;
use tm_corpus::read_assignments;

fuzz_target!(|data: &[u8]| {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    let _ = read_assignments(file.path(), 16);
});
