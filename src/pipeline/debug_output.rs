
use anyhow::Context;
use itertools::Itertools;
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;

use crate::data_types::cluster::{BreakpointCluster, ClusterMap};
use crate::data_types::evidence::SampleLabel;

/// Splits `items` into `k` contiguous slices; the first `len % k` slices get one extra item
pub fn split_evenly<T>(items: &[T], k: usize) -> Vec<&[T]> {
    let k = k.max(1);
    let quotient = items.len() / k;
    let remainder = items.len() % k;
    (0..k)
        .map(|i| {
            let start = i * quotient + i.min(remainder);
            let end = (i + 1) * quotient + (i + 1).min(remainder);
            &items[start..end]
        })
        .collect()
}

#[derive(Serialize)]
struct ClusterBedRow<'a> {
    contig: &'a str,
    start: u64,
    end: u64,
    name: &'a str,
    support: usize,
    bp_notation: String
}

/// Writes one BED line per cluster spanning its first-breakend positions
/// # Errors
/// * if the file cannot be written
pub fn write_cluster_bed(clusters: &ClusterMap, filename: &Path) -> anyhow::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(filename)
        .with_context(|| format!("Error while creating {filename:?}:"))?;
    for (class, class_clusters) in clusters.iter() {
        for cluster in class_clusters.iter() {
            let (min_start, max_start) = cluster.start_range();
            csv_writer.serialize(ClusterBedRow {
                contig: cluster.contig(),
                start: min_start,
                end: max_start + 1,
                name: cluster.id(),
                support: cluster.unique_support(),
                bp_notation: class.to_string()
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

/// Summary statistics for one orientation class
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClusterStatsRow {
    bp_notation: String,
    count: usize,
    mean_support: Option<f64>,
    min_support: Option<usize>,
    max_support: Option<usize>,
    mean_span: Option<f64>
}

/// Per-class cluster count, support and span statistics; classes with no clusters get empty values
pub fn compute_cluster_stats(clusters: &ClusterMap) -> Vec<ClusterStatsRow> {
    clusters.iter()
        .map(|(class, class_clusters)| {
            let supports: Vec<usize> = class_clusters.iter().map(|c| c.unique_support()).collect();
            let spans: Vec<u64> = class_clusters.iter()
                .map(|c| {
                    let (lo, hi) = c.start_range();
                    hi - lo
                })
                .collect();
            let count = class_clusters.len();
            let mean = |total: f64| if count > 0 { Some(total / count as f64) } else { None };
            ClusterStatsRow {
                bp_notation: class.to_string(),
                count,
                mean_support: mean(supports.iter().sum::<usize>() as f64),
                min_support: supports.iter().min().copied(),
                max_support: supports.iter().max().copied(),
                mean_span: mean(spans.iter().sum::<u64>() as f64)
            }
        })
        .collect()
}

/// Writes the output of `compute_cluster_stats` as a TSV
pub fn write_cluster_stats(clusters: &ClusterMap, filename: &Path) -> anyhow::Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(filename)
        .with_context(|| format!("Error while creating {filename:?}:"))?;
    for row in compute_cluster_stats(clusters).into_iter() {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct ClusterEvidenceRow<'a> {
    read_name: &'a str,
    sample: SampleLabel,
    start: String,
    end: String,
    inserted_length: u64,
    mapq: u8
}

/// Writes `<cluster id>.tsv` with the evidence of every cluster in the slice
/// # Errors
/// * if any file cannot be written
pub fn materialize_cluster_reads(slice: &[BreakpointCluster], folder: &Path) -> anyhow::Result<()> {
    for cluster in slice.iter() {
        let filename = folder.join(format!("{}.tsv", cluster.id()));
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(&filename)
            .with_context(|| format!("Error while creating {filename:?}:"))?;
        for e in cluster.evidence().iter().sorted_by(|a, b| (a.sample(), a.read_name()).cmp(&(b.sample(), b.read_name()))) {
            csv_writer.serialize(ClusterEvidenceRow {
                read_name: e.read_name(),
                sample: e.sample(),
                start: e.start().to_string(),
                end: e.end().to_string(),
                inserted_length: e.inserted_length(),
                mapq: e.mapq()
            })?;
        }
        csv_writer.flush()?;
    }
    Ok(())
}

/// Writes all the diagnostic cluster files into the output folder.
/// Each class's clusters are split into `threads` slices and written on the global pool.
/// # Errors
/// * on any write failure; callers treat this as non-fatal
pub fn write_debug_outputs(clusters: &ClusterMap, output_folder: &Path, threads: usize) -> anyhow::Result<()> {
    let cluster_folder = output_folder.join("clusters");
    info!("Writing cluster evidence to {cluster_folder:?}...");
    std::fs::create_dir_all(&cluster_folder)
        .with_context(|| format!("Error while creating {cluster_folder:?}:"))?;

    for (class, class_clusters) in clusters.iter() {
        let slices = split_evenly(class_clusters, threads);
        debug!("{class}: {} clusters in {} slices", class_clusters.len(), slices.len());
        slices.into_par_iter()
            .map(|slice| materialize_cluster_reads(slice, &cluster_folder))
            .collect::<anyhow::Result<()>>()?;
    }

    write_cluster_bed(clusters, &output_folder.join("clusters.bed"))?;
    write_cluster_stats(clusters, &output_folder.join("cluster_stats.tsv"))?;
    Ok(())
}
