
use std::collections::BTreeSet;

use crate::data_types::evidence::{BreakpointLocation, SampleLabel};
use crate::data_types::orientation::OrientationClass;

/// A consensus call before it has a place in the final enumeration
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BreakpointCall {
    /// Orientation class of the call
    orientation: OrientationClass,
    /// First breakend
    start: BreakpointLocation,
    /// Second breakend; same as `start` for insertions
    end: BreakpointLocation,
    /// Representative insertion length, 0 for non-insertions
    inserted_length: u64,
    /// Unique tumour reads supporting the call
    tumour_reads: BTreeSet<String>,
    /// Unique normal reads supporting the call
    normal_reads: BTreeSet<String>,
    /// Every cluster that contributed to this call
    cluster_ids: Vec<String>
}

impl BreakpointCall {
    pub fn new(
        orientation: OrientationClass, start: BreakpointLocation, end: BreakpointLocation, inserted_length: u64,
        tumour_reads: BTreeSet<String>, normal_reads: BTreeSet<String>, cluster_ids: Vec<String>
    ) -> Self {
        Self {
            orientation, start, end, inserted_length,
            tumour_reads, normal_reads, cluster_ids
        }
    }

    /// Folds another call into this one, keeping our positions
    pub fn absorb(&mut self, other: BreakpointCall) {
        self.tumour_reads.extend(other.tumour_reads);
        self.normal_reads.extend(other.normal_reads);
        self.cluster_ids.extend(other.cluster_ids);
        self.inserted_length = self.inserted_length.max(other.inserted_length);
    }

    /// Length reported in SVLEN: insert size, intra-contig span, or 0 across contigs
    pub fn sv_length(&self) -> u64 {
        if self.orientation.is_insertion() {
            self.inserted_length
        } else if self.start.contig() == self.end.contig() {
            self.end.position().abs_diff(self.start.position())
        } else {
            0
        }
    }

    pub fn support(&self, sample: SampleLabel) -> usize {
        match sample {
            SampleLabel::Tumour => self.tumour_reads.len(),
            SampleLabel::Normal => self.normal_reads.len()
        }
    }

    pub fn supporting_reads(&self, sample: SampleLabel) -> &BTreeSet<String> {
        match sample {
            SampleLabel::Tumour => &self.tumour_reads,
            SampleLabel::Normal => &self.normal_reads
        }
    }

    // getters
    pub fn orientation(&self) -> OrientationClass {
        self.orientation
    }

    pub fn start(&self) -> &BreakpointLocation {
        &self.start
    }

    pub fn end(&self) -> &BreakpointLocation {
        &self.end
    }

    pub fn inserted_length(&self) -> u64 {
        self.inserted_length
    }

    pub fn cluster_ids(&self) -> &[String] {
        &self.cluster_ids
    }
}

/// A call with its final ordinal. The ordinal is the only identifier shared by every output file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConsensusBreakpoint {
    ordinal: usize,
    call: BreakpointCall
}

impl ConsensusBreakpoint {
    /// Label used as the record identifier in every output
    pub fn label(&self) -> String {
        format!("ID_{}", self.ordinal)
    }

    pub fn tumour_support(&self) -> usize {
        self.call.support(SampleLabel::Tumour)
    }

    pub fn normal_support(&self) -> usize {
        self.call.support(SampleLabel::Normal)
    }

    // getters
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn call(&self) -> &BreakpointCall {
        &self.call
    }
}

/// Assigns dense, zero-based ordinals in enumeration order. This is the only place ordinals are created.
pub fn enumerate_breakpoints(calls: Vec<BreakpointCall>) -> Vec<ConsensusBreakpoint> {
    calls.into_iter()
        .enumerate()
        .map(|(ordinal, call)| ConsensusBreakpoint { ordinal, call })
        .collect()
}
