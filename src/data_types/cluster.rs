
use anyhow::ensure;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use strum::IntoEnumIterator;

use crate::data_types::evidence::{EvidenceRecord, SampleLabel};
use crate::data_types::orientation::OrientationClass;

/// A group of evidence of one orientation class on one contig, believed to share a breakpoint
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BreakpointCluster {
    /// Unique identifier, carried through to the consensus calls and output files
    id: String,
    /// Class shared by all the evidence
    orientation: OrientationClass,
    /// The grouped evidence, never empty
    evidence: Vec<EvidenceRecord>
}

impl BreakpointCluster {
    /// Constructor with checks
    /// # Errors
    /// * if `evidence` is empty
    /// * if any evidence has a different class or contig than the first entry
    pub fn new(id: String, orientation: OrientationClass, evidence: Vec<EvidenceRecord>) -> anyhow::Result<Self> {
        ensure!(!evidence.is_empty(), "Cluster {id} has no evidence");
        let contig = evidence[0].contig();
        ensure!(
            evidence.iter().all(|e| e.orientation() == orientation && e.contig() == contig),
            "Cluster {id} mixes orientation classes or contigs"
        );
        Ok(Self {
            id, orientation, evidence
        })
    }

    pub fn contig(&self) -> &str {
        self.evidence[0].contig()
    }

    /// Min and max of the first breakend positions
    pub fn start_range(&self) -> (u64, u64) {
        position_range(self.evidence.iter().map(|e| e.start().position()))
    }

    /// Min and max of the second breakend positions
    pub fn end_range(&self) -> (u64, u64) {
        position_range(self.evidence.iter().map(|e| e.end().position()))
    }

    /// Unique read names supporting the cluster from one sample
    pub fn supporting_reads(&self, sample: SampleLabel) -> BTreeSet<&str> {
        self.evidence.iter()
            .filter(|e| e.sample() == sample)
            .map(|e| e.read_name())
            .collect()
    }

    /// Number of unique reads across both samples
    pub fn unique_support(&self) -> usize {
        self.evidence.iter()
            .map(|e| (e.sample(), e.read_name()))
            .collect::<BTreeSet<_>>()
            .len()
    }

    // getters
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn orientation(&self) -> OrientationClass {
        self.orientation
    }

    pub fn evidence(&self) -> &[EvidenceRecord] {
        &self.evidence
    }
}

fn position_range(positions: impl Iterator<Item = u64>) -> (u64, u64) {
    positions.fold((u64::MAX, u64::MIN), |(lo, hi), p| (lo.min(p), hi.max(p)))
}

/// Clusters keyed by orientation class. Always holds exactly the five class keys, in canonical order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterMap {
    clusters: IndexMap<OrientationClass, Vec<BreakpointCluster>>
}

impl Default for ClusterMap {
    fn default() -> Self {
        Self {
            clusters: OrientationClass::iter().map(|c| (c, vec![])).collect()
        }
    }
}

impl ClusterMap {
    /// Adds a cluster under its own class
    pub fn push(&mut self, cluster: BreakpointCluster) {
        self.clusters.entry(cluster.orientation()).or_default().push(cluster);
    }

    /// Concatenates every class list of `other` onto ours
    pub fn extend(&mut self, other: ClusterMap) {
        for (class, clusters) in other.clusters.into_iter() {
            self.clusters.entry(class).or_default().extend(clusters);
        }
    }

    /// Clusters for a single class
    pub fn get(&self, class: OrientationClass) -> &[BreakpointCluster] {
        self.clusters.get(&class).map(|v| v.as_slice()).unwrap_or_default()
    }

    /// Iterates (class, clusters) in canonical class order
    pub fn iter(&self) -> impl Iterator<Item = (&OrientationClass, &Vec<BreakpointCluster>)> {
        self.clusters.iter()
    }

    /// Total clusters across all classes
    pub fn total_clusters(&self) -> usize {
        self.clusters.values().map(|v| v.len()).sum()
    }

    pub fn num_classes(&self) -> usize {
        self.clusters.len()
    }
}
