
/// Labels calls against somatic/germline truth sets
pub mod evaluate;
/// Greedy truth-set matching
pub mod matcher;
/// Truth and compare record types
pub mod records;
/// Text report of a comparison
pub mod report;
/// Minimal VCF text reader used for matching
pub mod vcf_text;
