//! Persisted (topic, component) assignment files.
//!
//! One line per document, whitespace-separated integers. Each value
//! encodes a topic and a generating component as `topic` (latent-feature)
//! or `topic + num_topics` (Dirichlet-multinomial); range validation
//! against `2 * num_topics` happens here so replay code can trust it.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::{CorpusError, Result};

/// Read an assignment file. Every value must lie in `[0, 2*num_topics)`.
pub fn read_assignments(path: &Path, num_topics: usize) -> Result<Vec<Vec<usize>>> {
    let reader = BufReader::new(File::open(path)?);
    let bound = 2 * num_topics;

    let mut documents = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut values = Vec::new();
        for part in line.split_whitespace() {
            let value: usize =
                part.parse()
                    .map_err(|_| CorpusError::MalformedAssignmentLine {
                        line: index + 1,
                        message: format!("not an integer: {part:?}"),
                    })?;
            if value >= bound {
                return Err(CorpusError::MalformedAssignmentLine {
                    line: index + 1,
                    message: format!("value {value} out of range [0, {bound})"),
                });
            }
            values.push(value);
        }
        documents.push(values);
    }
    Ok(documents)
}

/// Write assignments in the same one-line-per-document format.
pub fn write_assignments(path: &Path, assignments: &[Vec<usize>]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for document in assignments {
        let mut first = true;
        for value in document {
            if !first {
                write!(writer, " ")?;
            }
            write!(writer, "{value}")?;
            first = false;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
