
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_optional_filename, check_required_filename, AFTER_HELP, FULL_VERSION};
use crate::validation::evaluate::EvaluateJob;
use crate::validation::matcher::MatchConfigBuilder;

#[derive(Args, Clone, Debug, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct EvaluateSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    savana_version: String,

    /// Breakpoint VCF to label
    #[clap(required = true)]
    #[clap(long = "input")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub input_vcf: PathBuf,

    /// Somatic truth VCF
    #[clap(required = true)]
    #[clap(long = "somatic")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub somatic_vcf: PathBuf,

    /// Germline truth VCF
    #[clap(long = "germline")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub germline_vcf: Option<PathBuf>,

    /// Labelled output VCF
    #[clap(required = true)]
    #[clap(long = "output")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_vcf: PathBuf,

    /// Statistics report [default: stdout]
    #[clap(long = "stats")]
    #[clap(value_name = "FILE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub stats_fn: Option<PathBuf>,

    /// Maximum distance between a call and a truth entry
    #[clap(long = "buffer")]
    #[clap(value_name = "BP")]
    #[clap(help_heading = Some("Matching parameters"))]
    #[clap(default_value = "100")]
    pub buffer: u64,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

impl EvaluateSettings {
    /// Converts checked settings into the evaluation job
    /// # Errors
    /// * if the match configuration fails to build
    pub fn evaluate_job(&self) -> anyhow::Result<EvaluateJob> {
        let config = MatchConfigBuilder::default()
            .tolerance(self.buffer)
            .build()?;
        Ok(EvaluateJob {
            input_vcf: self.input_vcf.clone(),
            somatic_vcf: self.somatic_vcf.clone(),
            germline_vcf: self.germline_vcf.clone(),
            output_vcf: self.output_vcf.clone(),
            stats_fn: self.stats_fn.clone(),
            config
        })
    }
}

pub fn check_evaluate_settings(mut settings: EvaluateSettings) -> anyhow::Result<EvaluateSettings> {
    // hard code the version in
    settings.savana_version = FULL_VERSION.clone();
    info!("SAVANA version: {:?}", &settings.savana_version);
    info!("Sub-command: evaluate");
    info!("Inputs:");

    check_required_filename(&settings.input_vcf, "Input VCF")?;
    check_required_filename(&settings.somatic_vcf, "Somatic VCF")?;
    check_optional_filename(settings.germline_vcf.as_deref(), "Germline VCF")?;

    info!("\tInput VCF: {:?}", &settings.input_vcf);
    info!("\tSomatic VCF: {:?}", &settings.somatic_vcf);
    if let Some(germline_vcf) = settings.germline_vcf.as_deref() {
        info!("\tGermline VCF: {germline_vcf:?}");
    } else {
        info!("\tGermline VCF: None");
    }

    info!("Outputs:");
    info!("\tOutput VCF: {:?}", &settings.output_vcf);
    if let Some(stats_fn) = settings.stats_fn.as_deref() {
        info!("\tStatistics: {stats_fn:?}");
    } else {
        info!("\tStatistics: stdout");
    }

    info!("Matching parameters:");
    info!("\tBuffer: {}", settings.buffer);

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_evaluate_settings() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let input_vcf = tmp_dir.path().join("calls.vcf");
        let somatic_vcf = tmp_dir.path().join("somatic.vcf");
        std::fs::write(&input_vcf, b"").unwrap();
        std::fs::write(&somatic_vcf, b"").unwrap();

        let settings = EvaluateSettings {
            input_vcf,
            somatic_vcf,
            output_vcf: tmp_dir.path().join("labelled.vcf"),
            buffer: 250,
            ..Default::default()
        };
        let settings = check_evaluate_settings(settings).unwrap();
        let job = settings.evaluate_job().unwrap();
        assert_eq!(job.config.tolerance(), 250);
        assert!(job.germline_vcf.is_none());

        let mut settings = settings.clone();
        settings.germline_vcf = Some(tmp_dir.path().join("germline.vcf"));
        assert!(check_evaluate_settings(settings).is_err());
    }
}
