//! Document clustering evaluation: purity and NMI.
//!
//! A post-hoc, read-only computation over completed document-topic
//! distributions. Each document's cluster is the argmax of its `.theta`
//! row; gold clusters come from a label file with one label per line.
//! `evaluate` scores every matching file in a directory and writes a
//! summary report with per-file scores plus mean and standard deviation.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::{Error, Result};

/// Options of a batch evaluation run.
#[derive(Debug, Clone)]
pub struct EvalOptions {
    /// Gold label file, one label per line.
    pub labels: PathBuf,
    /// Directory holding document-topic distribution files.
    pub dir: PathBuf,
    /// File suffix selecting the distributions to score (e.g. `theta`).
    pub suffix: String,
}

/// Purity: each predicted cluster votes for its best-overlapping gold
/// cluster; the matched mass is averaged over all documents.
pub fn purity(gold: &[String], predicted: &[usize]) -> f64 {
    debug_assert_eq!(gold.len(), predicted.len());
    let gold_clusters = group_by_label(gold);
    let predicted_clusters = group_by_id(predicted);

    let mut matched = 0usize;
    for docs in predicted_clusters.values() {
        let best = gold_clusters
            .values()
            .map(|gold_docs| intersection_size(docs, gold_docs))
            .max()
            .unwrap_or(0);
        matched += best;
    }
    matched as f64 / gold.len() as f64
}

/// Normalized mutual information: `2 * MI / (H(predicted) + H(gold))`.
pub fn nmi(gold: &[String], predicted: &[usize]) -> f64 {
    debug_assert_eq!(gold.len(), predicted.len());
    let n = gold.len() as f64;
    let gold_clusters = group_by_label(gold);
    let predicted_clusters = group_by_id(predicted);

    let mut mutual_information = 0.0;
    for docs in predicted_clusters.values() {
        for gold_docs in gold_clusters.values() {
            let overlap = intersection_size(docs, gold_docs) as f64;
            if overlap == 0.0 {
                continue;
            }
            mutual_information +=
                (overlap / n) * (overlap * n / (docs.len() as f64 * gold_docs.len() as f64)).ln();
        }
    }

    let mut entropy = 0.0;
    for docs in predicted_clusters.values() {
        let fraction = docs.len() as f64 / n;
        entropy -= fraction * fraction.ln();
    }
    for docs in gold_clusters.values() {
        let fraction = docs.len() as f64 / n;
        entropy -= fraction * fraction.ln();
    }

    2.0 * mutual_information / entropy
}

fn group_by_label(labels: &[String]) -> HashMap<&str, Vec<usize>> {
    let mut clusters: HashMap<&str, Vec<usize>> = HashMap::new();
    for (doc, label) in labels.iter().enumerate() {
        clusters.entry(label.as_str()).or_default().push(doc);
    }
    clusters
}

fn group_by_id(ids: &[usize]) -> HashMap<usize, Vec<usize>> {
    let mut clusters: HashMap<usize, Vec<usize>> = HashMap::new();
    for (doc, &id) in ids.iter().enumerate() {
        clusters.entry(id).or_default().push(doc);
    }
    clusters
}

fn intersection_size(a: &[usize], b: &[usize]) -> usize {
    // Cluster member lists are built in document order, so a merge scan
    // suffices.
    let mut count = 0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}

fn read_labels(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut labels = Vec::new();
    for line in reader.lines() {
        labels.push(line?.trim().to_string());
    }
    Ok(labels)
}

/// Argmax topic of every row in a document-topic distribution file.
fn read_cluster_ids(path: &Path) -> Result<Vec<usize>> {
    let reader = BufReader::new(File::open(path)?);
    let mut ids = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut best = 0usize;
        let mut best_prob = f64::NEG_INFINITY;
        for (topic, part) in line.split_whitespace().enumerate() {
            let prob: f64 = part
                .parse()
                .map_err(|_| Error::Config(format!("bad probability in {}: {part:?}", path.display())))?;
            if prob > best_prob {
                best_prob = prob;
                best = topic;
            }
        }
        ids.push(best);
    }
    Ok(ids)
}

/// Score one distribution file against gold labels.
pub fn evaluate_file(labels: &[String], path: &Path) -> Result<(f64, f64)> {
    let predicted = read_cluster_ids(path)?;
    if predicted.len() != labels.len() {
        return Err(Error::Inconsistent(format!(
            "{}: {} documents but {} labels",
            path.display(),
            predicted.len(),
            labels.len()
        )));
    }
    Ok((purity(labels, &predicted), nmi(labels, &predicted)))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn stddev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Score every `<suffix>`-ending file in `options.dir` and write the
/// `<suffix>.PurityNMI` summary report there. Fails when no file
/// matches.
pub fn evaluate(options: &EvalOptions) -> Result<()> {
    let labels = read_labels(&options.labels)?;
    info!(labels = labels.len(), dir = %options.dir.display(), "evaluating clusterings");

    let mut paths: Vec<PathBuf> = std::fs::read_dir(&options.dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&options.suffix) && !n.ends_with(".PurityNMI"))
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(Error::Config(format!(
            "no file ending with {:?} in {}",
            options.suffix,
            options.dir.display()
        )));
    }

    let report_path = options.dir.join(format!("{}.PurityNMI", options.suffix));
    let mut writer = BufWriter::new(File::create(&report_path)?);
    writeln!(writer, "Golden labels in: {}\n", options.labels.display())?;

    let mut purities = Vec::new();
    let mut nmis = Vec::new();
    for path in &paths {
        let (purity_score, nmi_score) = evaluate_file(&labels, path)?;
        info!(file = %path.display(), purity = purity_score, nmi = nmi_score, "scored");
        writeln!(writer, "Results for: {}", path.display())?;
        writeln!(writer, "\tPurity: {purity_score}")?;
        writeln!(writer, "\tNMI: {nmi_score}")?;
        purities.push(purity_score);
        nmis.push(nmi_score);
    }

    writeln!(
        writer,
        "\n---\nMean purity: {}, standard deviation: {}",
        mean(&purities),
        stddev(&purities)
    )?;
    writeln!(
        writer,
        "Mean NMI: {}, standard deviation: {}",
        mean(&nmis),
        stddev(&nmis)
    )?;
    writer.flush()?;
    Ok(())
}
