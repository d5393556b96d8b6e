
use anyhow::anyhow;
use log::debug;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::data_types::breakpoint::BreakpointCall;
use crate::data_types::cluster::{BreakpointCluster, ClusterMap};
use crate::data_types::evidence::{BreakpointLocation, SampleLabel};
use crate::engine::ConsensusCaller;
use crate::parsing::contigs::ContigAllowList;

/// Calls one breakpoint per cluster at the median positions, then merges adjacent calls of the same class
#[derive(Clone, Debug)]
pub struct MedianConsensusCaller {
    /// Provides the contig ordering of the output
    allowlist: Arc<ContigAllowList>
}

impl MedianConsensusCaller {
    pub fn new(allowlist: Arc<ContigAllowList>) -> Self {
        Self { allowlist }
    }

    /// Sort key for the final enumeration; contigs missing from the allow-list go last
    fn location_key(&self, location: &BreakpointLocation) -> (usize, u64) {
        (self.allowlist.rank(location.contig()).unwrap_or(usize::MAX), location.position())
    }
}

impl ConsensusCaller for MedianConsensusCaller {
    fn call_consensus(&self, clusters: &ClusterMap, buffer: u64) -> anyhow::Result<Vec<BreakpointCall>> {
        let mut calls: Vec<BreakpointCall> = clusters.iter()
            .flat_map(|(_class, class_clusters)| class_clusters.iter())
            .map(cluster_consensus)
            .collect::<anyhow::Result<_>>()?;

        calls.sort_by(|a, b| {
            self.location_key(a.start()).cmp(&self.location_key(b.start()))
                .then_with(|| a.orientation().cmp(&b.orientation()))
                .then_with(|| self.location_key(a.end()).cmp(&self.location_key(b.end())))
                .then_with(|| a.cluster_ids().cmp(b.cluster_ids()))
        });
        let num_calls = calls.len();

        let mut merged: Vec<BreakpointCall> = Vec::with_capacity(num_calls);
        for call in calls.into_iter() {
            // only calls starting within `buffer` can be adjacent, and they are all at the tail
            let target = merged.iter_mut()
                .rev()
                .take_while(|previous| {
                    previous.start().contig() == call.start().contig() &&
                        previous.start().position().abs_diff(call.start().position()) <= buffer
                })
                .find(|previous| is_adjacent(previous, &call, buffer));
            match target {
                Some(previous) => previous.absorb(call),
                None => merged.push(call)
            }
        }
        debug!("Merged {num_calls} cluster calls into {} breakpoints", merged.len());
        Ok(merged)
    }
}

/// True if both breakends of `next` lie within `buffer` of `previous` and the class matches
fn is_adjacent(previous: &BreakpointCall, next: &BreakpointCall, buffer: u64) -> bool {
    previous.orientation() == next.orientation() &&
        previous.start().contig() == next.start().contig() &&
        previous.end().contig() == next.end().contig() &&
        previous.start().position().abs_diff(next.start().position()) <= buffer &&
        previous.end().position().abs_diff(next.end().position()) <= buffer
}

/// Lower median, so the result is always one of the observed values
fn median(mut values: Vec<u64>) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    Some(values[(values.len() - 1) / 2])
}

/// Collapses a single cluster into a call
fn cluster_consensus(cluster: &BreakpointCluster) -> anyhow::Result<BreakpointCall> {
    let evidence = cluster.evidence();
    let start = median(evidence.iter().map(|e| e.start().position()).collect())
        .ok_or(anyhow!("Cluster {} has no evidence", cluster.id()))?;
    let end = median(evidence.iter().map(|e| e.end().position()).collect())
        .ok_or(anyhow!("Cluster {} has no evidence", cluster.id()))?;
    let inserted_length = if cluster.orientation().is_insertion() {
        median(evidence.iter().map(|e| e.inserted_length()).collect()).unwrap_or(0)
    } else {
        0
    };

    let reads = |sample: SampleLabel| -> BTreeSet<String> {
        cluster.supporting_reads(sample).into_iter().map(String::from).collect()
    };

    Ok(BreakpointCall::new(
        cluster.orientation(),
        BreakpointLocation::new(cluster.contig().to_string(), start),
        BreakpointLocation::new(evidence[0].end().contig().to_string(), end),
        inserted_length,
        reads(SampleLabel::Tumour),
        reads(SampleLabel::Normal),
        vec![cluster.id().to_string()]
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::evidence::EvidenceRecord;
    use crate::data_types::orientation::OrientationClass;

    fn breakend(read: &str, sample: SampleLabel, class: OrientationClass, contig: &str, start: u64, end: u64) -> EvidenceRecord {
        EvidenceRecord::new_breakend(
            read.to_string(), sample, class,
            BreakpointLocation::new(contig.to_string(), start),
            BreakpointLocation::new(contig.to_string(), end),
            60
        )
    }

    fn cluster(id: &str, evidence: Vec<EvidenceRecord>) -> BreakpointCluster {
        let class = evidence[0].orientation();
        BreakpointCluster::new(id.to_string(), class, evidence).unwrap()
    }

    fn caller() -> MedianConsensusCaller {
        MedianConsensusCaller::new(Arc::new(ContigAllowList::from_names(["chr1", "chr2"])))
    }

    #[test]
    fn test_median() {
        assert_eq!(median(vec![]), None);
        assert_eq!(median(vec![5]), Some(5));
        assert_eq!(median(vec![9, 1, 5]), Some(5));
        assert_eq!(median(vec![10, 1, 4, 7]), Some(4));
    }

    #[test]
    fn test_cluster_consensus() {
        let c = cluster("chr1_PM_0", vec![
            breakend("a", SampleLabel::Tumour, OrientationClass::PlusMinus, "chr1", 100, 1000),
            breakend("b", SampleLabel::Tumour, OrientationClass::PlusMinus, "chr1", 104, 1008),
            breakend("b", SampleLabel::Tumour, OrientationClass::PlusMinus, "chr1", 104, 1008),
            breakend("n", SampleLabel::Normal, OrientationClass::PlusMinus, "chr1", 102, 1003),
        ]);
        let call = cluster_consensus(&c).unwrap();
        assert_eq!(call.start().position(), 102);
        assert_eq!(call.end().position(), 1003);
        assert_eq!(call.support(SampleLabel::Tumour), 2);
        assert_eq!(call.support(SampleLabel::Normal), 1);
        assert_eq!(call.cluster_ids(), &["chr1_PM_0".to_string()]);
    }

    #[test]
    fn test_ordering_and_merge() {
        let mut clusters = ClusterMap::default();
        // chr2 comes later in the allow-list even though its cluster is pushed first
        clusters.push(cluster("chr2_PP_0", vec![
            breakend("x", SampleLabel::Tumour, OrientationClass::PlusPlus, "chr2", 50, 900),
        ]));
        clusters.push(cluster("chr1_PM_0", vec![
            breakend("a", SampleLabel::Tumour, OrientationClass::PlusMinus, "chr1", 500, 2000),
        ]));
        // adjacent to chr1_PM_0 at both ends, gets merged
        clusters.push(cluster("chr1_PM_1", vec![
            breakend("b", SampleLabel::Tumour, OrientationClass::PlusMinus, "chr1", 508, 2005),
        ]));
        // same start but different class, stays separate
        clusters.push(cluster("chr1_MM_0", vec![
            breakend("c", SampleLabel::Normal, OrientationClass::MinusMinus, "chr1", 505, 2005),
        ]));
        clusters.push(cluster("chr1_PM_2", vec![
            breakend("d", SampleLabel::Tumour, OrientationClass::PlusMinus, "chr1", 100, 300),
        ]));

        let calls = caller().call_consensus(&clusters, 10).unwrap();
        let ids: Vec<Vec<String>> = calls.iter().map(|c| c.cluster_ids().to_vec()).collect();
        assert_eq!(ids, vec![
            vec!["chr1_PM_2".to_string()],
            vec!["chr1_PM_0".to_string(), "chr1_PM_1".to_string()],
            vec!["chr1_MM_0".to_string()],
            vec!["chr2_PP_0".to_string()],
        ]);
        assert_eq!(calls[1].support(SampleLabel::Tumour), 2);
        assert_eq!(calls[1].start().position(), 500);
    }
}
