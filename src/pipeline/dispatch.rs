
use indicatif::ParallelProgressIterator;
use log::{debug, info};
use rayon::prelude::*;

use crate::data_types::cluster::ClusterMap;
use crate::data_types::evidence::{merge_evidence, EvidenceByContig};
use crate::data_types::work_unit::{ClusterWorkUnit, WorkUnit};
use crate::engine::{EvidenceClusterer, EvidenceExtractor};
use crate::errors::SavanaError;
use crate::pipeline::config::RunConfig;
use crate::util::progress_bar::stage_progress_bar;

/// Runs evidence extraction for every unit on the global pool and merges the results per contig.
/// Blocks until every unit is done.
/// # Arguments
/// * `extractor` - the evidence extraction implementation
/// * `units` - the partitioned work; each unit is moved to exactly one worker
/// # Errors
/// * the first worker failure, as `SavanaError::WorkerFault`; no partial result is returned
pub fn dispatch_extraction<E: EvidenceExtractor>(extractor: &E, units: Vec<WorkUnit>) -> Result<EvidenceByContig, SavanaError> {
    info!("Extracting evidence from {} work units...", units.len());
    let progress = stage_progress_bar(units.len(), "extraction");
    let results: Vec<EvidenceByContig> = units.into_par_iter()
        .map(|unit| {
            extractor.extract_evidence(&unit)
                .map_err(|e| SavanaError::WorkerFault {
                    stage: "evidence extraction".to_string(),
                    unit: unit.description(),
                    source: e
                })
        })
        .progress_with(progress)
        .collect::<Result<_, _>>()?;

    let mut merged = EvidenceByContig::default();
    for result in results.into_iter() {
        merge_evidence(&mut merged, result);
    }
    debug!(
        "Collected {} evidence records across {} contigs",
        merged.values().map(|v| v.len()).sum::<usize>(), merged.len()
    );
    Ok(merged)
}

/// Clusters each contig's merged evidence on the global pool, then concatenates the per-class lists.
/// # Arguments
/// * `clusterer` - the clustering implementation
/// * `evidence` - merged evidence keyed by contig, consumed
/// * `config` - cloned into every unit
/// # Errors
/// * the first worker failure, as `SavanaError::WorkerFault`
pub fn dispatch_clustering<C: EvidenceClusterer>(
    clusterer: &C, evidence: EvidenceByContig, config: &RunConfig
) -> Result<ClusterMap, SavanaError> {
    let units: Vec<ClusterWorkUnit> = evidence.into_iter()
        .map(|(contig, records)| ClusterWorkUnit::new(contig, records, config.clone()))
        .collect();

    info!("Clustering evidence on {} contigs...", units.len());
    let progress = stage_progress_bar(units.len(), "clustering");
    let results: Vec<ClusterMap> = units.into_par_iter()
        .map(|unit| {
            let (contig, records, unit_config) = unit.into_parts();
            clusterer.cluster_evidence(&contig, records, &unit_config)
                .map_err(|e| SavanaError::WorkerFault {
                    stage: "clustering".to_string(),
                    unit: contig,
                    source: e
                })
        })
        .progress_with(progress)
        .collect::<Result<_, _>>()?;

    let mut merged = ClusterMap::default();
    for result in results.into_iter() {
        merged.extend(result);
    }
    debug!("Collected {} clusters", merged.total_clusters());
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use crate::data_types::cluster::BreakpointCluster;
    use crate::data_types::evidence::{BreakpointLocation, EvidenceRecord, SampleLabel};
    use crate::data_types::genomic_interval::GenomicInterval;
    use crate::data_types::orientation::OrientationClass;
    use crate::engine::clustering::SweepClusterer;
    use crate::parsing::contigs::ContigAllowList;
    use crate::pipeline::partition::chunk_contig;

    /// Emits one insertion every 1000 bases inside the unit, as if each were a read start
    struct GridExtractor;

    impl EvidenceExtractor for GridExtractor {
        fn extract_evidence(&self, unit: &WorkUnit) -> anyhow::Result<EvidenceByContig> {
            let (start, end) = match unit.interval() {
                Some(interval) => (interval.start(), interval.end()),
                None => (0, 2_000_000)
            };
            let first = start.div_ceil(1000) * 1000;
            let records = (first..end).step_by(1000)
                .map(|pos| EvidenceRecord::new_insertion(
                    format!("read_{pos}"), unit.sample(),
                    BreakpointLocation::new(unit.contig().to_string(), pos), 50, 60
                ))
                .collect();
            let mut result = EvidenceByContig::default();
            result.insert(unit.contig().to_string(), records);
            Ok(result)
        }
    }

    /// Fails on one specific chunk
    struct FaultyExtractor;

    impl EvidenceExtractor for FaultyExtractor {
        fn extract_evidence(&self, unit: &WorkUnit) -> anyhow::Result<EvidenceByContig> {
            match unit.interval() {
                Some(interval) if interval.start() == 500_000 => anyhow::bail!("truncated BGZF block"),
                _ => Ok(EvidenceByContig::default())
            }
        }
    }

    fn units(intervals: Vec<Option<GenomicInterval>>) -> Vec<WorkUnit> {
        let allowlist = Arc::new(ContigAllowList::from_names(["chr1"]));
        intervals.into_iter()
            .map(|interval| WorkUnit::new(
                PathBuf::from("tumour.bam"), RunConfig::default(), SampleLabel::Tumour, allowlist.clone(),
                "chr1".to_string(), interval
            ))
            .collect()
    }

    #[test]
    fn test_chunked_merge_matches_whole() {
        let whole = dispatch_extraction(&GridExtractor, units(vec![
            Some(GenomicInterval::new("chr1".to_string(), 0, 2_000_000).unwrap())
        ])).unwrap();
        let chunked = dispatch_extraction(&GridExtractor, units(
            chunk_contig("chr1", 2_000_000, 300_000).into_iter().map(Some).collect()
        )).unwrap();

        assert_eq!(whole["chr1"].len(), 2000);
        assert_eq!(chunked["chr1"].len(), whole["chr1"].len());
    }

    #[test]
    fn test_worker_fault() {
        let err = dispatch_extraction(&FaultyExtractor, units(
            chunk_contig("chr1", 1_200_000, 500_000).into_iter().map(Some).collect()
        )).unwrap_err();
        assert!(!err.is_input_validation());
        assert!(err.to_string().contains("tumour chr1:500000-1000000"));
    }

    #[test]
    fn test_dispatch_clustering() {
        let mut evidence = EvidenceByContig::default();
        for contig in ["chr1", "chr2"] {
            let records = ["a", "b", "c"].iter()
                .map(|read| EvidenceRecord::new_insertion(
                    read.to_string(), SampleLabel::Tumour, BreakpointLocation::new(contig.to_string(), 1000), 50, 60
                ))
                .collect();
            evidence.insert(contig.to_string(), records);
        }

        let clusters = dispatch_clustering(&SweepClusterer, evidence, &RunConfig::default()).unwrap();
        assert_eq!(clusters.num_classes(), 5);
        let ids: Vec<&str> = clusters.get(OrientationClass::Insertion).iter().map(BreakpointCluster::id).collect();
        assert_eq!(ids, vec!["chr1_INS_0", "chr2_INS_0"]);
    }
}
