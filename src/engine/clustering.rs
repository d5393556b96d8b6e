
use log::trace;
use std::cmp::Ordering;
use strum::IntoEnumIterator;

use crate::data_types::cluster::{BreakpointCluster, ClusterMap};
use crate::data_types::evidence::EvidenceRecord;
use crate::data_types::orientation::OrientationClass;
use crate::engine::EvidenceClusterer;
use crate::pipeline::config::RunConfig;

/// Sweep-line clusterer: evidence joins an open cluster when both breakends lie within `buffer` of it
#[derive(Clone, Copy, Debug, Default)]
pub struct SweepClusterer;

impl EvidenceClusterer for SweepClusterer {
    fn cluster_evidence(&self, contig: &str, evidence: Vec<EvidenceRecord>, config: &RunConfig) -> anyhow::Result<ClusterMap> {
        let mut cluster_map = ClusterMap::default();
        for class in OrientationClass::iter() {
            let mut class_evidence: Vec<EvidenceRecord> = evidence.iter()
                .filter(|e| e.orientation() == class)
                .cloned()
                .collect();
            // a total order on the evidence makes the output independent of the merge order upstream
            class_evidence.sort_by(compare_evidence);

            let groups = sweep(class_evidence, config.buffer());
            let mut n = 0;
            for group in groups.into_iter() {
                let id = format!("{contig}_{}_{n}", class.code());
                let cluster = BreakpointCluster::new(id, class, group)?;
                if cluster.unique_support() < config.min_depth() {
                    continue;
                }
                cluster_map.push(cluster);
                n += 1;
            }
        }
        trace!("{contig}: {} clusters", cluster_map.total_clusters());
        Ok(cluster_map)
    }
}

fn compare_evidence(a: &EvidenceRecord, b: &EvidenceRecord) -> Ordering {
    a.start().position().cmp(&b.start().position())
        .then_with(|| a.end().contig().cmp(b.end().contig()))
        .then_with(|| a.end().position().cmp(&b.end().position()))
        .then_with(|| a.sample().cmp(&b.sample()))
        .then_with(|| a.read_name().cmp(b.read_name()))
        .then_with(|| a.inserted_length().cmp(&b.inserted_length()))
}

/// An open cluster while sweeping
struct OpenCluster {
    last_start: u64,
    end_contig: String,
    end_min: u64,
    end_max: u64,
    evidence: Vec<EvidenceRecord>
}

impl OpenCluster {
    fn new(record: EvidenceRecord) -> Self {
        Self {
            last_start: record.start().position(),
            end_contig: record.end().contig().to_string(),
            end_min: record.end().position(),
            end_max: record.end().position(),
            evidence: vec![record]
        }
    }

    fn accepts(&self, record: &EvidenceRecord, buffer: u64) -> bool {
        let end = record.end().position();
        record.start().position() - self.last_start <= buffer &&
            record.end().contig() == self.end_contig &&
            end + buffer >= self.end_min &&
            end <= self.end_max + buffer
    }

    fn add(&mut self, record: EvidenceRecord) {
        self.last_start = record.start().position();
        self.end_min = self.end_min.min(record.end().position());
        self.end_max = self.end_max.max(record.end().position());
        self.evidence.push(record);
    }
}

/// Groups evidence that is sorted by start position.
/// Returned groups are ordered by their first evidence.
fn sweep(sorted_evidence: Vec<EvidenceRecord>, buffer: u64) -> Vec<Vec<EvidenceRecord>> {
    let mut open: Vec<OpenCluster> = vec![];
    let mut closed: Vec<OpenCluster> = vec![];

    for record in sorted_evidence.into_iter() {
        let start = record.start().position();

        // anything more than `buffer` behind can never accept again
        let (still_open, done): (Vec<OpenCluster>, Vec<OpenCluster>) = open.into_iter()
            .partition(|c| start - c.last_start <= buffer);
        open = still_open;
        closed.extend(done);

        match open.iter_mut().find(|c| c.accepts(&record, buffer)) {
            Some(cluster) => cluster.add(record),
            None => open.push(OpenCluster::new(record))
        };
    }
    closed.extend(open);

    let mut groups: Vec<Vec<EvidenceRecord>> = closed.into_iter().map(|c| c.evidence).collect();
    groups.sort_by(|a, b| compare_evidence(&a[0], &b[0]));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::evidence::{BreakpointLocation, SampleLabel};
    use crate::pipeline::config::RunConfigBuilder;

    fn deletion(read: &str, sample: SampleLabel, start: u64, end: u64) -> EvidenceRecord {
        EvidenceRecord::new_breakend(
            read.to_string(), sample, OrientationClass::PlusMinus,
            BreakpointLocation::new("chr1".to_string(), start),
            BreakpointLocation::new("chr1".to_string(), end),
            60
        )
    }

    fn insertion(read: &str, pos: u64) -> EvidenceRecord {
        EvidenceRecord::new_insertion(
            read.to_string(), SampleLabel::Tumour, BreakpointLocation::new("chr1".to_string(), pos), 80, 60
        )
    }

    fn config(min_depth: usize) -> RunConfig {
        RunConfigBuilder::default()
            .buffer(10)
            .min_depth(min_depth)
            .build().unwrap()
    }

    #[test]
    fn test_sweep_groups() {
        let evidence = vec![
            deletion("a", SampleLabel::Tumour, 100, 1000),
            deletion("b", SampleLabel::Tumour, 105, 1004),
            deletion("c", SampleLabel::Normal, 112, 1009),
            // same start, different end
            deletion("d", SampleLabel::Tumour, 106, 5000),
            // too far away
            deletion("e", SampleLabel::Tumour, 200, 1000),
        ];
        let map = SweepClusterer.cluster_evidence("chr1", evidence, &config(1)).unwrap();
        let clusters = map.get(OrientationClass::PlusMinus);
        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0].id(), "chr1_PM_0");
        assert_eq!(clusters[0].evidence().len(), 3);
        assert_eq!(clusters[0].start_range(), (100, 112));
        assert_eq!(clusters[1].evidence().len(), 1);
        assert_eq!(clusters[1].end_range(), (5000, 5000));
        assert_eq!(clusters[2].start_range(), (200, 200));
        assert_eq!(map.total_clusters(), 3);
        assert_eq!(map.num_classes(), 5);
    }

    #[test]
    fn test_depth_filter() {
        let evidence = vec![
            insertion("a", 100),
            insertion("b", 102),
            // same read twice only counts once
            insertion("c", 500),
            insertion("c", 501),
            insertion("d", 505),
        ];
        let map = SweepClusterer.cluster_evidence("chr1", evidence.clone(), &config(2)).unwrap();
        let clusters = map.get(OrientationClass::Insertion);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[1].id(), "chr1_INS_1");

        let map = SweepClusterer.cluster_evidence("chr1", evidence, &config(3)).unwrap();
        assert_eq!(map.total_clusters(), 0);
    }

    #[test]
    fn test_order_insensitive() {
        let evidence = vec![
            deletion("a", SampleLabel::Tumour, 100, 1000),
            deletion("b", SampleLabel::Tumour, 105, 1004),
            deletion("c", SampleLabel::Tumour, 300, 900),
            deletion("d", SampleLabel::Normal, 303, 905),
            insertion("e", 700),
        ];
        let mut reversed = evidence.clone();
        reversed.reverse();

        let forward = SweepClusterer.cluster_evidence("chr1", evidence, &config(1)).unwrap();
        let backward = SweepClusterer.cluster_evidence("chr1", reversed, &config(1)).unwrap();
        assert_eq!(forward, backward);
    }
}
