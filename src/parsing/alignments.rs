
use anyhow::Context;
use log::debug;
use noodles::bam;
use noodles::csi::binning_index::ReferenceSequence as _;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::data_types::evidence::SampleLabel;
use crate::errors::SavanaError;

/// Per-contig summary pulled from an alignment file header and its index
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContigStats {
    name: String,
    length: u64,
    mapped: u64
}

impl ContigStats {
    pub fn new(name: String, length: u64, mapped: u64) -> Self {
        Self { name, length, mapped }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn mapped(&self) -> u64 {
        self.mapped
    }
}

/// An indexed alignment file along with what the partitioner needs to know about it
#[derive(Clone, Debug)]
pub struct AlignmentSource {
    sample: SampleLabel,
    path: PathBuf,
    contigs: Vec<ContigStats>
}

impl AlignmentSource {
    /// Constructor for pre-computed statistics
    pub fn new(sample: SampleLabel, path: PathBuf, contigs: Vec<ContigStats>) -> Self {
        Self { sample, path, contigs }
    }

    /// Opens a BAM file and its BAI index, collecting contig lengths and mapped read counts.
    /// # Arguments
    /// * `sample` - the label this file is processed under
    /// * `bam_fn` - the BAM file path
    /// # Errors
    /// * if the index cannot be found
    /// * if the header or index cannot be parsed
    pub fn open(sample: SampleLabel, bam_fn: &Path) -> anyhow::Result<Self> {
        let index_fn = find_bam_index(bam_fn)?;

        let mut reader = File::open(bam_fn)
            .map(bam::io::Reader::new)
            .with_context(|| format!("Error while opening {bam_fn:?}:"))?;
        let header = reader.read_header()
            .with_context(|| format!("Error while reading header of {bam_fn:?}:"))?;
        let index = bam::bai::fs::read(&index_fn)
            .with_context(|| format!("Error while reading index {index_fn:?}:"))?;

        // reference sequences in the index follow header order; missing metadata means nothing was mapped
        let mapped_counts: Vec<u64> = index.reference_sequences().iter()
            .map(|rs| rs.metadata().map(|m| m.mapped_record_count()).unwrap_or(0))
            .collect();

        let contigs: Vec<ContigStats> = header.reference_sequences().iter()
            .enumerate()
            .map(|(i, (name, map))| ContigStats::new(
                name.to_string(),
                map.length().get() as u64,
                mapped_counts.get(i).copied().unwrap_or(0)
            ))
            .collect();
        debug!("Loaded {} contigs from {sample} alignments {bam_fn:?}", contigs.len());

        Ok(Self {
            sample,
            path: bam_fn.to_path_buf(),
            contigs
        })
    }

    // getters
    pub fn sample(&self) -> SampleLabel {
        self.sample
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contigs(&self) -> &[ContigStats] {
        &self.contigs
    }
}

/// Finds the BAI for a BAM, trying `<bam>.bai` first and then `<stem>.bai`
/// # Errors
/// * if neither candidate exists
pub fn find_bam_index(bam_fn: &Path) -> Result<PathBuf, SavanaError> {
    let mut appended = bam_fn.to_owned().into_os_string();
    appended.push(".bai");
    let candidates = vec![PathBuf::from(appended), bam_fn.with_extension("bai")];

    candidates.iter()
        .find(|p| p.exists())
        .cloned()
        .ok_or(SavanaError::MissingIndex {
            label: format!("BAM {bam_fn:?}"),
            tried: candidates
        })
}
