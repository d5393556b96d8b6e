
/*!
# Evaluate labelling
Scores a breakpoint VCF against a somatic truth set (and optionally a germline one) and writes a labelled copy.
*/

use anyhow::{ensure, Context};
use log::{debug, info};
use noodles::vcf;
use noodles::vcf::header::record::value::map::{self, Info};
use noodles::vcf::header::record::value::Map;
use noodles::vcf::variant::io::Write;
use noodles::vcf::variant::record_buf::info::field::Value as InfoValue;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use strum_macros::{AsRefStr, Display};

use crate::validation::matcher::{match_breakpoints, MatchConfig, MatchResult};
use crate::validation::records::{load_compare_set, load_truth_set};
use crate::validation::report::{build_report, write_report};
use crate::validation::vcf_text::open_vcf_stream;

/// INFO key added to every labelled record
pub const LABEL_KEY: &str = "LABEL";

/// Outcome of a call after evaluation
#[derive(AsRefStr, Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum CallLabel {
    #[strum(serialize = "SOMATIC")]
    Somatic,
    #[strum(serialize = "GERMLINE")]
    Germline,
    #[strum(serialize = "NOT_IN_COMPARISON")]
    NotInComparison
}

/// Everything the evaluate command needs
#[derive(Clone, Debug)]
pub struct EvaluateJob {
    /// Calls to label
    pub input_vcf: PathBuf,
    pub somatic_vcf: PathBuf,
    pub germline_vcf: Option<PathBuf>,
    pub output_vcf: PathBuf,
    /// Report destination; stdout if `None`
    pub stats_fn: Option<PathBuf>,
    pub config: MatchConfig
}

/// Labels each call: somatic matches win over germline ones
/// # Arguments
/// * `num_calls` - number of calls in the input
/// * `somatic` - matching against the somatic set
/// * `germline` - matching against the germline set, if any
pub fn assign_labels(num_calls: usize, somatic: &MatchResult, germline: Option<&MatchResult>) -> Vec<CallLabel> {
    (0..num_calls)
        .map(|ci| {
            if somatic.state.compare_match(ci).is_some() {
                CallLabel::Somatic
            } else if germline.map(|g| g.state.compare_match(ci).is_some()).unwrap_or(false) {
                CallLabel::Germline
            } else {
                CallLabel::NotInComparison
            }
        })
        .collect()
}

/// Matches one truth file and returns the result with its report lines
fn score_against(input_vcf: &Path, truth_vcf: &Path, config: MatchConfig) -> anyhow::Result<(MatchResult, usize, Vec<String>)> {
    let truth_set = load_truth_set(truth_vcf)?;
    let compare = load_compare_set(input_vcf, truth_set.chrom_prefixed)?;
    let result = match_breakpoints(&truth_set.records, &compare, config)?;
    let lines = build_report(&truth_vcf.to_string_lossy(), &truth_set.records, &compare, &result);
    Ok((result, compare.len(), lines))
}

/// Copies the input VCF to `output_vcf`, adding the label INFO field to the header and every record
/// # Errors
/// * if the input cannot be parsed or the output cannot be written
/// * if the number of records differs from the number of labels
pub fn write_labelled_vcf(input_vcf: &Path, output_vcf: &Path, labels: &[CallLabel]) -> anyhow::Result<()> {
    let mut reader = vcf::io::Reader::new(open_vcf_stream(input_vcf)?);
    let mut header = reader.read_header()
        .with_context(|| format!("Error while reading header of {input_vcf:?}:"))?;
    header.infos_mut().insert(
        LABEL_KEY.to_string(),
        Map::<Info>::new(map::info::Number::Count(1), map::info::Type::String, "Evaluation outcome (SOMATIC, GERMLINE, NOT_IN_COMPARISON)")
    );

    let file = File::create(output_vcf)
        .with_context(|| format!("Error while creating {output_vcf:?}:"))?;
    let mut writer = vcf::io::Writer::new(BufWriter::new(file));
    writer.write_header(&header)?;

    let mut num_written = 0;
    for result in reader.record_bufs(&header) {
        let mut record = result
            .with_context(|| format!("Error while reading record from {input_vcf:?}:"))?;
        let label = labels.get(num_written)
            .with_context(|| format!("More records in {input_vcf:?} than labels ({})", labels.len()))?;
        record.info_mut().extend([
            (LABEL_KEY.to_string(), Some(InfoValue::from(label.to_string())))
        ]);
        writer.write_variant_record(&header, &record)?;
        num_written += 1;
    }
    ensure!(num_written == labels.len(), "Expected {} records in {input_vcf:?}, found {num_written}", labels.len());
    debug!("Wrote {num_written} labelled records to {output_vcf:?}");
    Ok(())
}

/// Runs the full evaluation: matching, labelled VCF and report
/// # Errors
/// * if any input cannot be loaded or any output cannot be written
pub fn run_evaluation(job: &EvaluateJob) -> anyhow::Result<Vec<CallLabel>> {
    info!("Comparing {:?} against somatic set {:?}...", job.input_vcf, job.somatic_vcf);
    let (somatic, num_calls, mut report) = score_against(&job.input_vcf, &job.somatic_vcf, job.config)?;

    let germline = match job.germline_vcf.as_ref() {
        Some(germline_vcf) => {
            info!("Comparing {:?} against germline set {germline_vcf:?}...", job.input_vcf);
            let (germline, _, germline_report) = score_against(&job.input_vcf, germline_vcf, job.config)?;
            report.push(String::new());
            report.push("GERMLINE COMPARISON".to_string());
            report.extend(germline_report);
            Some(germline)
        },
        None => None
    };

    let labels = assign_labels(num_calls, &somatic, germline.as_ref());
    for label in [CallLabel::Somatic, CallLabel::Germline, CallLabel::NotInComparison] {
        let count = labels.iter().filter(|&&l| l == label).count();
        info!("\t{label}: {count}");
    }

    write_labelled_vcf(&job.input_vcf, &job.output_vcf, &labels)?;
    write_report(&report, job.stats_fn.as_deref())?;
    Ok(labels)
}
