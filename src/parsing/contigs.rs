
use anyhow::{anyhow, Context};
use indexmap::IndexSet;
use log::debug;
use noodles::fasta;
use std::io::BufReader;
use std::path::Path;

/// A contig name and length as listed in the reference index
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReferenceContig {
    name: String,
    length: u64
}

impl ReferenceContig {
    pub fn new(name: String, length: u64) -> Self {
        Self { name, length }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn length(&self) -> u64 {
        self.length
    }
}

/// Loads the contig names and lengths from a FASTA index (.fai), preserving file order
/// # Arguments
/// * `fai_fn` - path to the .fai file
/// # Errors
/// * if the file cannot be opened or parsed
pub fn load_fasta_index(fai_fn: &Path) -> anyhow::Result<Vec<ReferenceContig>> {
    let index = read_fai(fai_fn)?;
    let contigs: Vec<ReferenceContig> = index.as_ref().iter()
        .map(|record| ReferenceContig::new(
            String::from_utf8_lossy(record.name()).to_string(),
            record.length()
        ))
        .collect();
    debug!("Loaded {} contigs from {fai_fn:?}", contigs.len());
    Ok(contigs)
}

/// Parses a FASTA index (.fai)
/// # Errors
/// * if the file cannot be opened or parsed
pub fn read_fai(fai_fn: &Path) -> anyhow::Result<fasta::fai::Index> {
    let reader = std::fs::File::open(fai_fn)
        .map(BufReader::new)
        .with_context(|| format!("Error while opening {fai_fn:?}:"))?;
    fasta::fai::io::Reader::new(reader)
        .read_index()
        .with_context(|| format!("Error while parsing {fai_fn:?}:"))
}

/// Ordered set of the contigs a run considers. The order doubles as the contig sort order for outputs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ContigAllowList {
    contigs: IndexSet<String>
}

impl ContigAllowList {
    /// Builds from any list of names; duplicates keep their first position
    pub fn from_names<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            contigs: names.into_iter().map(|s| s.as_ref().to_string()).collect()
        }
    }

    /// Every contig in the reference index
    pub fn from_reference(reference: &[ReferenceContig]) -> Self {
        Self::from_names(reference.iter().map(|c| c.name()))
    }

    /// Loads a contig file with one name per line; only the first tab-delimited column is used.
    /// Blank entries are skipped.
    /// # Errors
    /// * if the file cannot be opened or read
    pub fn from_file(filename: &Path) -> anyhow::Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_path(filename)
            .with_context(|| format!("Error while opening {filename:?}:"))?;

        let mut names = vec![];
        for result in csv_reader.records() {
            let row = result.with_context(|| format!("Error while reading {filename:?}"))?;
            let name = row.get(0).ok_or(anyhow!("Missing contig on row: {row:?}"))?.trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
        Ok(Self::from_names(names))
    }

    pub fn contains(&self, contig: &str) -> bool {
        self.contigs.contains(contig)
    }

    /// Position of the contig in the allow-list, used for ordering
    pub fn rank(&self, contig: &str) -> Option<usize> {
        self.contigs.get_index_of(contig)
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.contigs.iter()
    }
}
