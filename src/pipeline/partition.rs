
use log::{debug, trace};
use std::sync::Arc;

use crate::data_types::genomic_interval::GenomicInterval;
use crate::data_types::work_unit::WorkUnit;
use crate::parsing::alignments::AlignmentSource;
use crate::parsing::contigs::ContigAllowList;
use crate::pipeline::config::RunConfig;

/// Splits `[0, length)` into contiguous chunks of `chunk_size`, the last one truncated to `length`.
/// # Arguments
/// * `contig` - name of the contig being split
/// * `length` - contig length in bases
/// * `chunk_size` - maximum interval length, must be >0
pub fn chunk_contig(contig: &str, length: u64, chunk_size: u64) -> Vec<GenomicInterval> {
    assert!(chunk_size > 0, "chunk_size must be >0");
    (0..length).step_by(chunk_size as usize)
        .filter_map(|start| {
            // start < end always holds inside the range, so nothing is dropped here
            let end = (start + chunk_size).min(length);
            GenomicInterval::new(contig.to_string(), start, end).ok()
        })
        .collect()
}

/// Builds the extraction work units for every sample source.
/// Contigs absent from the allow-list, with no mapped reads, or with zero length are skipped.
/// Contigs no longer than `chunk_size` are processed whole.
/// # Arguments
/// * `sources` - the indexed alignment inputs
/// * `allowlist` - contigs to consider
/// * `config` - run parameters, cloned into each unit
/// * `chunk_size` - the maximum interval length per unit
pub fn partition_genome(
    sources: &[AlignmentSource], allowlist: Arc<ContigAllowList>, config: &RunConfig, chunk_size: u64
) -> Vec<WorkUnit> {
    let mut units = vec![];
    for source in sources.iter() {
        for contig in source.contigs().iter() {
            if !allowlist.contains(contig.name()) {
                trace!("Skipping {} reads aligned to {}, not in allowed contigs", source.sample(), contig.name());
                continue;
            }
            if contig.mapped() == 0 || contig.length() == 0 {
                continue;
            }

            if contig.length() > chunk_size {
                for interval in chunk_contig(contig.name(), contig.length(), chunk_size) {
                    units.push(WorkUnit::new(
                        source.path().to_path_buf(), config.clone(), source.sample(), allowlist.clone(),
                        contig.name().to_string(), Some(interval)
                    ));
                }
            } else {
                units.push(WorkUnit::new(
                    source.path().to_path_buf(), config.clone(), source.sample(), allowlist.clone(),
                    contig.name().to_string(), None
                ));
            }
        }
    }
    debug!("Generated {} extraction work units", units.len());
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::evidence::SampleLabel;
    use crate::parsing::alignments::ContigStats;
    use crate::pipeline::config::CHUNK_SIZE;
    use std::path::PathBuf;

    /// Checks the intervals tile [0, length) exactly
    fn assert_tiles(intervals: &[GenomicInterval], length: u64) {
        assert!(!intervals.is_empty());
        assert_eq!(intervals[0].start(), 0);
        assert_eq!(intervals.last().unwrap().end(), length);
        for pair in intervals.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start());
        }
        assert!(intervals.iter().all(|i| i.len() <= CHUNK_SIZE && i.start() < length));
        assert_eq!(intervals.iter().map(|i| i.len()).sum::<u64>(), length);
    }

    #[test]
    fn test_chunk_tiling() {
        for length in [1, 499_999, 500_000, 500_001, 999_999, 1_000_000, 1_000_001, 248_956_422] {
            let intervals = chunk_contig("chr1", length, CHUNK_SIZE);
            assert_tiles(&intervals, length);
            assert_eq!(intervals.len() as u64, length.div_ceil(CHUNK_SIZE));
        }
    }

    #[test]
    fn test_chunk_empty() {
        assert!(chunk_contig("chr1", 0, CHUNK_SIZE).is_empty());
    }

    #[test]
    fn test_partition_genome() {
        let tumour = AlignmentSource::new(SampleLabel::Tumour, PathBuf::from("tumour.bam"), vec![
            ContigStats::new("chr1".to_string(), 1_200_000, 10),
            ContigStats::new("chr2".to_string(), 400_000, 5),
            ContigStats::new("chrUn".to_string(), 1_000, 5),
            ContigStats::new("chr3".to_string(), 400_000, 0),
        ]);
        let normal = AlignmentSource::new(SampleLabel::Normal, PathBuf::from("normal.bam"), vec![
            ContigStats::new("chr1".to_string(), 1_200_000, 10),
            ContigStats::new("chr2".to_string(), 400_000, 0),
        ]);
        let allowlist = Arc::new(ContigAllowList::from_names(["chr1", "chr2", "chr3"]));
        let units = partition_genome(&[tumour, normal], allowlist, &RunConfig::default(), CHUNK_SIZE);

        let descriptions: Vec<String> = units.iter().map(|u| u.description()).collect();
        assert_eq!(descriptions, vec![
            "tumour chr1:0-500000",
            "tumour chr1:500000-1000000",
            "tumour chr1:1000000-1200000",
            "tumour chr2",
            "normal chr1:0-500000",
            "normal chr1:500000-1000000",
            "normal chr1:1000000-1200000",
        ]);
        assert!(units[3].interval().is_none());
        assert_eq!(units[4].source(), PathBuf::from("normal.bam").as_path());
    }
}
