
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data_types::evidence::{EvidenceRecord, SampleLabel};
use crate::data_types::genomic_interval::GenomicInterval;
use crate::parsing::contigs::ContigAllowList;
use crate::pipeline::config::RunConfig;

/// Self-contained description of one evidence extraction task.
/// Owned by exactly one worker; nothing in it is mutated after creation.
#[derive(Clone, Debug)]
pub struct WorkUnit {
    /// Indexed alignment file to read
    source: PathBuf,
    /// Run parameters
    config: RunConfig,
    /// Which sample the alignments belong to
    sample: SampleLabel,
    /// Contigs that evidence may refer to
    allowlist: Arc<ContigAllowList>,
    /// Contig being processed
    contig: String,
    /// Sub-interval of the contig; `None` means the whole contig
    interval: Option<GenomicInterval>
}

impl WorkUnit {
    pub fn new(
        source: PathBuf, config: RunConfig, sample: SampleLabel, allowlist: Arc<ContigAllowList>,
        contig: String, interval: Option<GenomicInterval>
    ) -> Self {
        Self {
            source, config, sample, allowlist, contig, interval
        }
    }

    /// Human readable description for logging and errors
    pub fn description(&self) -> String {
        match self.interval.as_ref() {
            Some(interval) => format!("{} {interval}", self.sample),
            None => format!("{} {}", self.sample, self.contig)
        }
    }

    // getters
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn sample(&self) -> SampleLabel {
        self.sample
    }

    pub fn allowlist(&self) -> &ContigAllowList {
        &self.allowlist
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn interval(&self) -> Option<&GenomicInterval> {
        self.interval.as_ref()
    }
}

/// One clustering task: the fully merged evidence of a single contig
#[derive(Clone, Debug)]
pub struct ClusterWorkUnit {
    contig: String,
    evidence: Vec<EvidenceRecord>,
    config: RunConfig
}

impl ClusterWorkUnit {
    pub fn new(contig: String, evidence: Vec<EvidenceRecord>, config: RunConfig) -> Self {
        Self {
            contig, evidence, config
        }
    }

    /// Splits the unit into its parts so the evidence can be moved into the clusterer
    pub fn into_parts(self) -> (String, Vec<EvidenceRecord>, RunConfig) {
        (self.contig, self.evidence, self.config)
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn evidence(&self) -> &[EvidenceRecord] {
        &self.evidence
    }
}
