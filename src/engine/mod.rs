/*!
# Evidence engine
The three collaborators the pipeline drives: evidence extraction, clustering, and consensus calling.
The pipeline only depends on the traits here; the submodules hold the default alignment-based implementations.
*/
/// Groups evidence per contig into orientation-class clusters
pub mod clustering;
/// Reduces the merged cluster set into ordered breakpoint calls
pub mod consensus;
/// Reads indexed alignments and extracts breakpoint evidence
pub mod extraction;

use crate::data_types::breakpoint::BreakpointCall;
use crate::data_types::cluster::ClusterMap;
use crate::data_types::evidence::{EvidenceByContig, EvidenceRecord};
use crate::data_types::work_unit::WorkUnit;
use crate::pipeline::config::RunConfig;

/// Extracts evidence for a single work unit. Called concurrently from the worker pool.
pub trait EvidenceExtractor: Sync {
    /// Returns every evidence record found in the unit, keyed by contig
    fn extract_evidence(&self, unit: &WorkUnit) -> anyhow::Result<EvidenceByContig>;
}

/// Clusters the complete evidence of one contig. Called concurrently from the worker pool.
pub trait EvidenceClusterer: Sync {
    /// Returns a map holding all five orientation classes; the input order of `evidence` must not matter
    fn cluster_evidence(&self, contig: &str, evidence: Vec<EvidenceRecord>, config: &RunConfig) -> anyhow::Result<ClusterMap>;
}

/// Calls consensus breakpoints over the full cluster set in a single pass
pub trait ConsensusCaller {
    /// Returns calls in their final enumeration order
    fn call_consensus(&self, clusters: &ClusterMap, buffer: u64) -> anyhow::Result<Vec<BreakpointCall>>;
}
