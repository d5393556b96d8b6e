
use anyhow::Context;
use log::{info, warn};
use std::io::Write;
use std::path::Path;

use crate::validation::matcher::{match_breakpoints, sv_type_breakdown, MatchConfig, MatchResult};
use crate::validation::records::{load_compare_set, load_truth_set, CompareRecord, TruthRecord};

/// Name of the report written next to the run outputs
pub const VALIDATION_REPORT_NAME: &str = "validation.stats";

/// Builds the text report for one comparison. Lines starting with an empty string become blank lines.
/// Precision/recall/F-measure are omitted with a warning if any of them is undefined.
/// # Arguments
/// * `truth_label` - how the truth file is named in the report heading
/// * `truth` - truth records used for matching
/// * `compare` - compare records used for matching
/// * `result` - the classification
pub fn build_report(truth_label: &str, truth: &[TruthRecord], compare: &[CompareRecord], result: &MatchResult) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!("Evaluating compared to provided validation file: '{truth_label}'"),
        String::new(),
        "DUPLICATE BREAKPOINTS".to_string()
    ];
    for dup in result.duplicates.iter() {
        let claimed_by = dup.claimed_by.as_ref()
            .map(|ids| ids.join(","))
            .unwrap_or("None".to_string());
        lines.push(format!("{} validated by {claimed_by} - {} marked as FP", dup.truth_label, dup.compare_label));
    }

    lines.push(String::new());
    lines.push("MISSED BREAKPOINTS".to_string());
    for &ti in result.false_negatives.iter() {
        lines.push(format!("{} not validated", truth[ti].label));
    }

    let metrics = result.metrics();
    lines.push(String::new());
    lines.push("EVALUATION OF BREAKPOINTS".to_string());
    lines.push(format!("True Positives: {}", result.true_positives.len()));
    lines.push(format!("False Positives: {}", result.false_positives.len()));
    lines.push(format!("False Negatives: {}", result.false_negatives.len()));

    match (metrics.precision(), metrics.recall(), metrics.f1()) {
        (Some(precision), Some(recall), Some(f_measure)) => {
            lines.push(String::new());
            lines.push("STATISTICS".to_string());
            lines.push(format!("Precision: {precision:.3}"));
            lines.push(format!("Recall: {recall:.3}"));
            lines.push(format!("F-measure: {f_measure:.3}"));
        },
        _ => {
            warn!(
                "Unable to calculate validation statistics due to a zero denominator ({} calls, {} truth records)",
                compare.len(), truth.len()
            );
        }
    };

    lines.push(String::new());
    lines.push("VALIDATION BY SV TYPE".to_string());
    for (sv_type, (seen, total)) in sv_type_breakdown(truth, result).into_iter() {
        let percent = 100.0 * seen as f64 / total as f64;
        lines.push(format!("{sv_type}: identified {seen} of {total} ({percent:.2}%)"));
    }
    lines
}

/// Loads both VCFs, matches them and writes the report.
/// # Arguments
/// * `compare_vcf` - the calls to score
/// * `truth_vcf` - the truth set; its first record decides the chromosome convention
/// * `config` - matcher tolerance
/// * `stats_fn` - report destination, stdout if `None`
/// # Errors
/// * if either VCF cannot be loaded or the report cannot be written
pub fn validate_vcf(compare_vcf: &Path, truth_vcf: &Path, config: MatchConfig, stats_fn: Option<&Path>) -> anyhow::Result<MatchResult> {
    let truth_set = load_truth_set(truth_vcf)?;
    let compare = load_compare_set(compare_vcf, truth_set.chrom_prefixed)?;
    info!("Validating {} calls against {} truth records with tolerance {}", compare.len(), truth_set.records.len(), config.tolerance());

    let result = match_breakpoints(&truth_set.records, &compare, config)?;
    let lines = build_report(&truth_vcf.to_string_lossy(), &truth_set.records, &compare, &result);
    write_report(&lines, stats_fn)?;
    Ok(result)
}

/// Writes report lines to a file, or stdout if `filename` is `None`
/// # Errors
/// * if the output cannot be written
pub fn write_report(lines: &[String], filename: Option<&Path>) -> anyhow::Result<()> {
    let mut fp: Box<dyn Write> = match filename {
        Some(filename) => Box::new(
            std::fs::File::create(filename)
                .with_context(|| format!("Error while creating {filename:?}:"))?
        ),
        None => Box::new(std::io::stdout())
    };
    for line in lines.iter() {
        writeln!(fp, "{line}")?;
    }
    fp.flush()?;
    Ok(())
}
