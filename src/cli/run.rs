
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::core::{check_optional_filename, check_required_filename, AFTER_HELP, FULL_VERSION};
use crate::errors::SavanaError;
use crate::parsing::alignments::find_bam_index;
use crate::pipeline::config::{RunConfig, RunConfigBuilder};

#[derive(Args, Clone, Debug, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct RunSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    savana_version: String,

    /// Tumour alignment file (indexed BAM)
    #[clap(required = true)]
    #[clap(long = "tumour")]
    #[clap(value_name = "BAM")]
    #[clap(help_heading = Some("Input/Output"))]
    pub tumour_fn: PathBuf,

    /// Normal alignment file (indexed BAM)
    #[clap(required = true)]
    #[clap(long = "normal")]
    #[clap(value_name = "BAM")]
    #[clap(help_heading = Some("Input/Output"))]
    pub normal_fn: PathBuf,

    /// Reference FASTA file
    #[clap(required = true)]
    #[clap(long = "ref")]
    #[clap(value_name = "FASTA")]
    #[clap(help_heading = Some("Input/Output"))]
    pub reference_fn: PathBuf,

    /// Reference FASTA index [default: <FASTA>.fai]
    #[clap(long = "ref_index")]
    #[clap(value_name = "FAI")]
    #[clap(help_heading = Some("Input/Output"))]
    pub reference_index_fn: Option<PathBuf>,

    /// Contigs to consider, one name per line [default: every contig in the FASTA index]
    #[clap(long = "contigs")]
    #[clap(value_name = "TXT")]
    #[clap(help_heading = Some("Input/Output"))]
    pub contigs_fn: Option<PathBuf>,

    /// Output directory; must be absent or empty
    #[clap(required = true)]
    #[clap(long = "outdir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub output_folder: PathBuf,

    /// Sample name used as the output file prefix [default: tumour file stem]
    #[clap(long = "sample")]
    #[clap(value_name = "SAMPLE")]
    #[clap(help_heading = Some("Input/Output"))]
    #[clap(default_value = "", hide_default_value = true)]
    pub sample: String,

    /// Truth VCF to validate the calls against once the run completes
    #[clap(long = "validation")]
    #[clap(value_name = "VCF")]
    #[clap(help_heading = Some("Input/Output"))]
    pub validation_fn: Option<PathBuf>,

    /// Minimum SV length to consider
    #[clap(long = "length")]
    #[clap(value_name = "BP")]
    #[clap(help_heading = Some("Calling parameters"))]
    #[clap(default_value = "30")]
    pub min_length: u64,

    /// Minimum mapping quality of reads and split alignments
    #[clap(long = "mapq")]
    #[clap(value_name = "MAPQ")]
    #[clap(help_heading = Some("Calling parameters"))]
    #[clap(default_value = "5")]
    pub min_mapq: u8,

    /// Distance used to cluster evidence and merge adjacent breakpoints
    #[clap(long = "buffer")]
    #[clap(value_name = "BP")]
    #[clap(help_heading = Some("Calling parameters"))]
    #[clap(default_value = "10")]
    pub buffer: u64,

    /// Minimum unique supporting reads to keep a cluster
    #[clap(long = "depth")]
    #[clap(value_name = "READS")]
    #[clap(help_heading = Some("Calling parameters"))]
    #[clap(default_value = "3")]
    pub min_depth: usize,

    /// Number of threads to use [default: logical core count]
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    pub threads: Option<usize>,

    /// Records per-stage timing and writes cluster debug files
    #[clap(long = "debug")]
    pub debug: bool,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

impl RunSettings {
    /// Run parameters handed to the pipeline; call after `check_run_settings`
    /// # Errors
    /// * if the thread count has not been resolved
    pub fn run_config(&self) -> anyhow::Result<RunConfig> {
        let threads = self.threads.ok_or(SavanaError::InvalidThreadCount)?;
        Ok(RunConfigBuilder::default()
            .min_length(self.min_length)
            .min_mapq(self.min_mapq)
            .buffer(self.buffer)
            .min_depth(self.min_depth)
            .threads(threads)
            .debug(self.debug)
            .build()?)
    }

    /// The resolved FASTA index; call after `check_run_settings`
    pub fn reference_index(&self) -> PathBuf {
        self.reference_index_fn.clone()
            .unwrap_or_else(|| default_fai(&self.reference_fn))
    }
}

/// `<fasta>.fai`
fn default_fai(reference_fn: &Path) -> PathBuf {
    let mut appended = reference_fn.to_owned().into_os_string();
    appended.push(".fai");
    PathBuf::from(appended)
}

/// Fails if the output directory exists and holds anything, or is not a directory at all
/// # Errors
/// * `SavanaError::OutputDirectoryNotEmpty`
pub fn check_output_directory(output_folder: &Path) -> Result<(), SavanaError> {
    if !output_folder.exists() {
        return Ok(());
    }
    let occupied = !output_folder.is_dir() || std::fs::read_dir(output_folder)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(true);
    if occupied {
        Err(SavanaError::OutputDirectoryNotEmpty { path: output_folder.to_path_buf() })
    } else {
        Ok(())
    }
}

pub fn check_run_settings(mut settings: RunSettings) -> anyhow::Result<RunSettings> {
    // hard code the version in
    settings.savana_version = FULL_VERSION.clone();
    info!("SAVANA version: {:?}", &settings.savana_version);
    info!("Sub-command: run");

    // nothing gets read before the output location is known to be clean
    check_output_directory(&settings.output_folder)?;

    info!("Inputs:");
    check_required_filename(&settings.tumour_fn, "Tumour BAM")?;
    find_bam_index(&settings.tumour_fn)?;
    check_required_filename(&settings.normal_fn, "Normal BAM")?;
    find_bam_index(&settings.normal_fn)?;
    check_required_filename(&settings.reference_fn, "Reference FASTA")?;
    check_optional_filename(settings.contigs_fn.as_deref(), "Contigs")?;

    let fai_fn = settings.reference_index();
    if !fai_fn.exists() {
        return Err(SavanaError::MissingIndex {
            label: format!("Reference FASTA {:?}", settings.reference_fn),
            tried: vec![fai_fn]
        }.into());
    }
    settings.reference_index_fn = Some(fai_fn);

    if settings.sample.is_empty() {
        settings.sample = settings.tumour_fn.file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or("sample".to_string());
    }

    info!("\tTumour: {:?}", &settings.tumour_fn);
    info!("\tNormal: {:?}", &settings.normal_fn);
    info!("\tReference: {:?}", &settings.reference_fn);
    info!("\tReference index: {:?}", settings.reference_index());
    if let Some(contigs_fn) = settings.contigs_fn.as_deref() {
        info!("\tContigs: {contigs_fn:?}");
    } else {
        info!("\tContigs: all reference contigs");
    }

    info!("Outputs:");
    info!("\tOutput folder: {:?}", &settings.output_folder);
    info!("\tSample: {:?}", &settings.sample);
    if let Some(validation_fn) = settings.validation_fn.as_deref() {
        info!("\tValidation VCF: {validation_fn:?}");
    }

    info!("Calling parameters:");
    info!("\tMinimum length: {}", settings.min_length);
    info!("\tMinimum MAPQ: {}", settings.min_mapq);
    info!("\tBuffer: {}", settings.buffer);
    info!("\tMinimum depth: {}", settings.min_depth);

    settings.threads = match settings.threads {
        None | Some(0) => Some(num_cpus::get()),
        Some(t) => Some(t)
    };
    info!("Processing threads: {}", settings.threads.unwrap_or_default());
    if settings.debug {
        info!("Debug outputs: ENABLED");
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes empty placeholder inputs; only existence is checked here
    fn placeholder_settings(dir: &Path) -> RunSettings {
        for name in ["tumour.bam", "tumour.bam.bai", "normal.bam", "normal.bai", "ref.fa", "ref.fa.fai"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }
        RunSettings {
            tumour_fn: dir.join("tumour.bam"),
            normal_fn: dir.join("normal.bam"),
            reference_fn: dir.join("ref.fa"),
            output_folder: dir.join("out"),
            min_length: 30,
            min_mapq: 5,
            buffer: 10,
            min_depth: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_check_output_directory() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let output_folder = tmp_dir.path().join("out");

        // absent and empty are both fine
        assert!(check_output_directory(&output_folder).is_ok());
        std::fs::create_dir(&output_folder).unwrap();
        assert!(check_output_directory(&output_folder).is_ok());

        std::fs::write(output_folder.join("old.vcf"), b"").unwrap();
        let err = check_output_directory(&output_folder).unwrap_err();
        assert!(matches!(err, SavanaError::OutputDirectoryNotEmpty { .. }));
    }

    #[test]
    fn test_check_run_settings() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let settings = check_run_settings(placeholder_settings(tmp_dir.path())).unwrap();
        assert_eq!(settings.sample, "tumour");
        assert_eq!(settings.reference_index(), tmp_dir.path().join("ref.fa.fai"));
        assert_eq!(settings.threads, Some(num_cpus::get()));

        let config = settings.run_config().unwrap();
        assert_eq!(config.min_depth(), 3);
        assert_eq!(config.buffer(), 10);
        assert!(!config.debug());
    }

    #[test]
    fn test_thread_count() {
        let tmp_dir = tempfile::tempdir().unwrap();

        // zero falls back to every logical core
        let mut settings = placeholder_settings(tmp_dir.path());
        settings.threads = Some(0);
        let settings = check_run_settings(settings).unwrap();
        assert_eq!(settings.threads, Some(num_cpus::get()));
        assert_eq!(settings.run_config().unwrap().threads(), num_cpus::get());

        let mut settings = placeholder_settings(tmp_dir.path());
        settings.threads = Some(2);
        assert_eq!(check_run_settings(settings).unwrap().threads, Some(2));
    }

    #[test]
    fn test_missing_validation_vcf_is_deferred() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let mut settings = placeholder_settings(tmp_dir.path());
        settings.validation_fn = Some(tmp_dir.path().join("missing_truth.vcf"));

        // only the validation pass itself reports this, as a warning
        let settings = check_run_settings(settings).unwrap();
        assert_eq!(settings.validation_fn, Some(tmp_dir.path().join("missing_truth.vcf")));
    }

    #[test]
    fn test_non_empty_outdir_fails_first() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let mut settings = placeholder_settings(tmp_dir.path());
        std::fs::create_dir(&settings.output_folder).unwrap();
        std::fs::write(settings.output_folder.join("time.log"), b"").unwrap();
        // a missing input would also fail, but the directory check comes first
        settings.tumour_fn = tmp_dir.path().join("missing.bam");

        let err = check_run_settings(settings).unwrap_err();
        let err = err.downcast::<SavanaError>().unwrap();
        assert!(matches!(err, SavanaError::OutputDirectoryNotEmpty { .. }));
    }

    #[test]
    fn test_bad_inputs() {
        let tmp_dir = tempfile::tempdir().unwrap();

        let settings = placeholder_settings(tmp_dir.path());
        std::fs::remove_file(tmp_dir.path().join("normal.bai")).unwrap();
        let err = check_run_settings(settings).unwrap_err().downcast::<SavanaError>().unwrap();
        assert!(matches!(err, SavanaError::MissingIndex { .. }));

        let mut settings = placeholder_settings(tmp_dir.path());
        settings.reference_index_fn = Some(tmp_dir.path().join("other.fai"));
        let err = check_run_settings(settings).unwrap_err().downcast::<SavanaError>().unwrap();
        assert!(matches!(err, SavanaError::MissingIndex { .. }));
    }
}
