
use indexmap::IndexMap;
use serde::Serialize;

use crate::data_types::orientation::OrientationClass;

/// The two alignment inputs of a paired run
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
    strum_macros::AsRefStr, strum_macros::Display, strum_macros::EnumIter, strum_macros::EnumString)]
pub enum SampleLabel {
    #[strum(serialize = "tumour")]
    #[serde(rename = "tumour")]
    Tumour,
    #[strum(serialize = "normal")]
    #[serde(rename = "normal")]
    Normal
}

/// A single 0-based position on a contig
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct BreakpointLocation {
    contig: String,
    position: u64
}

impl BreakpointLocation {
    pub fn new(contig: String, position: u64) -> Self {
        Self { contig, position }
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn position(&self) -> u64 {
        self.position
    }
}

impl std::fmt::Display for BreakpointLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.contig, self.position)
    }
}

/// One observation from one read that supports a breakpoint.
/// Both ends are stored for every class; insertions repeat the site as the end.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EvidenceRecord {
    /// Name of the read that produced the observation
    read_name: String,
    /// Which input the read came from
    sample: SampleLabel,
    /// Orientation of the breakend pair
    orientation: OrientationClass,
    /// First breakend; this determines the contig the evidence belongs to
    start: BreakpointLocation,
    /// Second breakend
    end: BreakpointLocation,
    /// Inserted bases, only non-zero for insertions
    inserted_length: u64,
    /// Mapping quality of the primary alignment
    mapq: u8
}

impl EvidenceRecord {
    /// Creates a paired breakend observation
    pub fn new_breakend(
        read_name: String, sample: SampleLabel, orientation: OrientationClass,
        start: BreakpointLocation, end: BreakpointLocation, mapq: u8
    ) -> Self {
        Self {
            read_name, sample, orientation, start, end,
            inserted_length: 0,
            mapq
        }
    }

    /// Creates an insertion observation at a single site
    pub fn new_insertion(
        read_name: String, sample: SampleLabel, site: BreakpointLocation, inserted_length: u64, mapq: u8
    ) -> Self {
        Self {
            read_name, sample,
            orientation: OrientationClass::Insertion,
            end: site.clone(),
            start: site,
            inserted_length,
            mapq
        }
    }

    /// The contig this evidence is grouped under
    pub fn contig(&self) -> &str {
        self.start.contig()
    }

    // getters
    pub fn read_name(&self) -> &str {
        &self.read_name
    }

    pub fn sample(&self) -> SampleLabel {
        self.sample
    }

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

    pub fn mapq(&self) -> u8 {
        self.mapq
    }
}

/// Evidence grouped by contig, the unit of merging between pipeline stages
pub type EvidenceByContig = IndexMap<String, Vec<EvidenceRecord>>;

/// Concatenates `other` into `target` under matching contig keys.
/// Within-contig order is whatever the inputs provide; nothing downstream relies on it.
pub fn merge_evidence(target: &mut EvidenceByContig, other: EvidenceByContig) {
    for (contig, evidence) in other.into_iter() {
        target.entry(contig).or_default().extend(evidence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deletion(read: &str, contig: &str, pos: u64) -> EvidenceRecord {
        EvidenceRecord::new_breakend(
            read.to_string(), SampleLabel::Tumour, OrientationClass::PlusMinus,
            BreakpointLocation::new(contig.to_string(), pos),
            BreakpointLocation::new(contig.to_string(), pos + 100),
            60
        )
    }

    #[test]
    fn test_insertion_site() {
        let ins = EvidenceRecord::new_insertion(
            "r1".to_string(), SampleLabel::Normal, BreakpointLocation::new("chr3".to_string(), 77), 45, 20
        );
        assert_eq!(ins.orientation(), OrientationClass::Insertion);
        assert_eq!(ins.start(), ins.end());
        assert_eq!(ins.contig(), "chr3");
        assert_eq!(ins.inserted_length(), 45);
    }

    #[test]
    fn test_merge_evidence() {
        let mut merged = EvidenceByContig::default();
        let mut chunk_a = EvidenceByContig::default();
        chunk_a.insert("chr1".to_string(), vec![deletion("a", "chr1", 10), deletion("b", "chr1", 20)]);
        let mut chunk_b = EvidenceByContig::default();
        chunk_b.insert("chr1".to_string(), vec![deletion("c", "chr1", 600_000)]);
        chunk_b.insert("chr2".to_string(), vec![deletion("d", "chr2", 5)]);

        merge_evidence(&mut merged, chunk_a);
        merge_evidence(&mut merged, chunk_b);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["chr1"].len(), 3);
        assert_eq!(merged["chr2"].len(), 1);
    }

    #[test]
    fn test_sample_label() {
        assert_eq!(SampleLabel::Tumour.to_string(), "tumour");
        assert_eq!(SampleLabel::Normal.as_ref(), "normal");
    }
}
