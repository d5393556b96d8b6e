
use anyhow::{anyhow, Context};
use noodles::core::{Position, Region};
use noodles::fasta;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::parsing::contigs::read_fai;

/// Random access to reference bases through the FASTA index.
/// Opened once per run and only read from.
pub struct ReferenceReader {
    reader: fasta::io::IndexedReader<BufReader<File>>
}

impl ReferenceReader {
    /// Opens an uncompressed FASTA with an explicit index path
    /// # Errors
    /// * if either file cannot be opened or the index cannot be parsed
    pub fn open(reference_fn: &Path, index_fn: &Path) -> anyhow::Result<Self> {
        let index = read_fai(index_fn)?;
        let inner = File::open(reference_fn)
            .map(BufReader::new)
            .with_context(|| format!("Error while opening {reference_fn:?}:"))?;
        Ok(Self {
            reader: fasta::io::IndexedReader::new(inner, index)
        })
    }

    /// Returns the upper-cased base at a 0-based position
    /// # Errors
    /// * if the contig is not in the index or the position is out of range
    pub fn base_at(&mut self, contig: &str, position: u64) -> anyhow::Result<char> {
        let pos = Position::try_from(position as usize + 1)?;
        let region = Region::new(contig, pos..=pos);
        let record = self.reader.query(&region)
            .with_context(|| format!("Error while fetching reference base at {contig}:{}", position + 1))?;
        let base = record.sequence().as_ref().first()
            .ok_or(anyhow!("No reference base at {contig}:{}", position + 1))?;
        Ok(base.to_ascii_uppercase() as char)
    }
}
