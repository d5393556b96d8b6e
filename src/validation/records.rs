
use anyhow::{anyhow, Context};
use std::path::Path;
use std::str::FromStr;

use crate::data_types::orientation::OrientationClass;
use crate::validation::vcf_text::{read_vcf_lines, InfoFields, VcfLine};
use crate::writers::breakpoint_records::{BP_NOTATION_KEY, CLUSTER_KEY, NORMAL_SUPPORT_KEY, SVLEN_KEY, SVTYPE_KEY, TUMOUR_SUPPORT_KEY};

/// Prefix whose presence decides a truth set's chromosome naming convention
pub const CHROM_PREFIX: &str = "chr";

/// One entry of the truth set
#[derive(Clone, Debug, PartialEq)]
pub struct TruthRecord {
    pub chrom: String,
    /// 1-based
    pub pos: u64,
    pub label: String,
    pub alt: String,
    pub info: InfoFields,
    pub sv_type: String,
    /// 0 when absent or unparseable
    pub sv_len: i64
}

impl TruthRecord {
    /// # Errors
    /// * if SVTYPE is missing
    pub fn from_line(line: VcfLine) -> anyhow::Result<Self> {
        let info = InfoFields::parse(&line.info);
        let sv_type = info.get_str(SVTYPE_KEY)
            .ok_or(anyhow!("Truth record {} at {}:{} has no {SVTYPE_KEY}", line.label, line.chrom, line.pos))?
            .to_string();
        let sv_len = info.get_i64(SVLEN_KEY).unwrap_or(0);
        Ok(Self {
            chrom: line.chrom,
            pos: line.pos,
            label: line.label,
            alt: line.alt,
            info,
            sv_type,
            sv_len
        })
    }
}

/// One called breakpoint being scored
#[derive(Clone, Debug, PartialEq)]
pub struct CompareRecord {
    /// Name as written in the file
    pub raw_chrom: String,
    /// Name in the truth set's convention
    pub chrom: String,
    /// 1-based
    pub pos: u64,
    pub label: String,
    pub alt: String,
    pub info: InfoFields,
    pub cluster_ids: Option<Vec<String>>,
    pub orientation: Option<OrientationClass>,
    pub sv_len: Option<i64>,
    /// 0 when absent
    pub tumour_support: u64,
    /// 0 when absent
    pub normal_support: u64
}

impl CompareRecord {
    /// # Arguments
    /// * `line` - the raw VCF columns
    /// * `chrom_prefixed` - the truth set convention
    pub fn from_line(line: VcfLine, chrom_prefixed: bool) -> Self {
        let info = InfoFields::parse(&line.info);
        let support = |key: &str| info.get_i64(key).and_then(|v| u64::try_from(v).ok()).unwrap_or(0);
        Self {
            chrom: normalize_chrom(&line.chrom, chrom_prefixed),
            raw_chrom: line.chrom,
            pos: line.pos,
            label: line.label,
            alt: line.alt,
            cluster_ids: info.get_list(CLUSTER_KEY),
            orientation: info.get_str(BP_NOTATION_KEY).and_then(|v| OrientationClass::from_str(v).ok()),
            sv_len: info.get_i64(SVLEN_KEY),
            tumour_support: support(TUMOUR_SUPPORT_KEY),
            normal_support: support(NORMAL_SUPPORT_KEY),
            info
        }
    }
}

/// Converts a chromosome name to the given convention; idempotent
/// # Arguments
/// * `chrom` - name to convert
/// * `prefixed` - true if the target convention uses the "chr" prefix
pub fn normalize_chrom(chrom: &str, prefixed: bool) -> String {
    match (prefixed, chrom.strip_prefix(CHROM_PREFIX)) {
        (true, Some(_)) | (false, None) => chrom.to_string(),
        (true, None) => format!("{CHROM_PREFIX}{chrom}"),
        (false, Some(stripped)) => stripped.to_string()
    }
}

/// A loaded truth set and its naming convention
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TruthSet {
    pub records: Vec<TruthRecord>,
    /// Inferred from the first record only
    pub chrom_prefixed: bool
}

/// Loads a truth VCF
/// # Errors
/// * if the file cannot be read or any record lacks SVTYPE
pub fn load_truth_set(filename: &Path) -> anyhow::Result<TruthSet> {
    let records: Vec<TruthRecord> = read_vcf_lines(filename)?
        .into_iter()
        .map(TruthRecord::from_line)
        .collect::<anyhow::Result<_>>()
        .with_context(|| format!("Error while parsing truth set {filename:?}:"))?;
    let chrom_prefixed = records.first()
        .map(|r| r.chrom.starts_with(CHROM_PREFIX))
        .unwrap_or(false);
    Ok(TruthSet { records, chrom_prefixed })
}

/// Loads a compare VCF, normalizing chromosome names to the truth convention
/// # Errors
/// * if the file cannot be read
pub fn load_compare_set(filename: &Path, chrom_prefixed: bool) -> anyhow::Result<Vec<CompareRecord>> {
    Ok(read_vcf_lines(filename)?
        .into_iter()
        .map(|line| CompareRecord::from_line(line, chrom_prefixed))
        .collect())
}
