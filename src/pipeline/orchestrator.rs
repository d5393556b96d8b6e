
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::data_types::breakpoint::enumerate_breakpoints;
use crate::data_types::evidence::SampleLabel;
use crate::engine::clustering::SweepClusterer;
use crate::engine::consensus::MedianConsensusCaller;
use crate::engine::extraction::AlignmentEvidenceExtractor;
use crate::engine::{ConsensusCaller, EvidenceClusterer, EvidenceExtractor};
use crate::parsing::alignments::AlignmentSource;
use crate::parsing::contigs::{load_fasta_index, ContigAllowList, ReferenceContig};
use crate::parsing::reference::ReferenceReader;
use crate::pipeline::config::{RunConfig, CHUNK_SIZE};
use crate::pipeline::debug_output::write_debug_outputs;
use crate::pipeline::dispatch::{dispatch_clustering, dispatch_extraction};
use crate::pipeline::partition::partition_genome;
use crate::util::checkpoints::Checkpoints;
use crate::validation::matcher::MatchConfig;
use crate::validation::report::{validate_vcf, VALIDATION_REPORT_NAME};
use crate::writers::breakpoint_writer::{build_breakpoint_header, write_breakpoints, BreakpointOutputs, HeaderSamples};

/// Resolved file locations of a run
#[derive(Clone, Debug)]
pub struct RunInputs {
    pub tumour_fn: PathBuf,
    pub normal_fn: PathBuf,
    pub reference_fn: PathBuf,
    pub reference_index_fn: PathBuf,
    pub contigs_fn: Option<PathBuf>,
    pub output_folder: PathBuf,
    pub sample: String,
    pub validation_fn: Option<PathBuf>
}

/// Everything loaded before the first worker starts
#[derive(Clone, Debug)]
pub struct PreparedRun {
    pub reference_contigs: Vec<ReferenceContig>,
    pub allowlist: Arc<ContigAllowList>,
    pub sources: Vec<AlignmentSource>
}

/// The three collaborators driven by the pipeline
pub struct Engine<E, C, K> {
    pub extractor: E,
    pub clusterer: C,
    pub caller: K
}

/// The alignment-based implementations shipped with the crate
pub fn default_engine(allowlist: Arc<ContigAllowList>) -> Engine<AlignmentEvidenceExtractor, SweepClusterer, MedianConsensusCaller> {
    Engine {
        extractor: AlignmentEvidenceExtractor,
        clusterer: SweepClusterer,
        caller: MedianConsensusCaller::new(allowlist)
    }
}

/// What a completed run produced
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub num_breakpoints: usize,
    pub outputs: BreakpointOutputs,
    /// Set when the optional validation report was written
    pub validation_report: Option<PathBuf>
}

/// Loads the reference contigs, the allow-list, and both alignment sources
/// # Errors
/// * if the FASTA index, contig list, or either BAM cannot be read
pub fn prepare_run(inputs: &RunInputs) -> anyhow::Result<PreparedRun> {
    let reference_contigs = load_fasta_index(&inputs.reference_index_fn)?;
    let allowlist = match inputs.contigs_fn.as_deref() {
        Some(contigs_fn) => ContigAllowList::from_file(contigs_fn)?,
        None => ContigAllowList::from_reference(&reference_contigs)
    };
    info!("Considering {} contigs", allowlist.len());

    let sources = vec![
        AlignmentSource::open(SampleLabel::Tumour, &inputs.tumour_fn)?,
        AlignmentSource::open(SampleLabel::Normal, &inputs.normal_fn)?
    ];
    Ok(PreparedRun {
        reference_contigs,
        allowlist: Arc::new(allowlist),
        sources
    })
}

/// Runs every stage in order, each one joined before the next starts, then writes `time.log`.
/// # Arguments
/// * `inputs` - resolved file locations; the output folder must already exist
/// * `prepared` - loaded inputs from `prepare_run`
/// * `config` - run parameters
/// * `engine` - the collaborators
/// * `checkpoints` - timer started at the beginning of the run
/// # Errors
/// * on any worker fault or primary output failure; debug and validation failures are only logged
pub fn run_pipeline<E, C, K>(
    inputs: &RunInputs, prepared: &PreparedRun, config: &RunConfig, engine: &Engine<E, C, K>, mut checkpoints: Checkpoints
) -> anyhow::Result<RunSummary>
where
    E: EvidenceExtractor,
    C: EvidenceClusterer,
    K: ConsensusCaller
{
    // 1 - evidence
    let units = partition_genome(&prepared.sources, prepared.allowlist.clone(), config, CHUNK_SIZE);
    let evidence = dispatch_extraction(&engine.extractor, units)?;
    checkpoints.stage("Identified potential breakpoints");

    // 2 - clusters
    let clusters = dispatch_clustering(&engine.clusterer, evidence, config)?;
    checkpoints.stage("Clustered potential breakpoints");
    info!("Found {} clusters", clusters.total_clusters());

    if config.debug() {
        if let Err(e) = write_debug_outputs(&clusters, &inputs.output_folder, config.threads()) {
            warn!("Failed to write cluster debug outputs: {e:#}");
        }
        checkpoints.stage("Output originating clusters");
    }

    // 3 - consensus, single pass
    info!("Calling consensus breakpoints...");
    let calls = engine.caller.call_consensus(&clusters, config.buffer())?;
    let breakpoints = enumerate_breakpoints(calls);
    checkpoints.stage("Called consensus breakpoints");
    info!("Called {} breakpoints", breakpoints.len());

    let samples = HeaderSamples {
        sample: inputs.sample.clone(),
        tumour_fn: inputs.tumour_fn.clone(),
        normal_fn: inputs.normal_fn.clone()
    };
    let header = build_breakpoint_header(&prepared.reference_contigs, &samples)?;
    let mut reference = ReferenceReader::open(&inputs.reference_fn, &inputs.reference_index_fn)?;
    let outputs = BreakpointOutputs::new(&inputs.output_folder, &inputs.sample);
    write_breakpoints(&breakpoints, &header, &mut reference, &outputs)?;
    checkpoints.stage("Output consensus breakpoints");

    let validation_report = inputs.validation_fn.as_deref()
        .and_then(|truth_fn| run_validation(&outputs.vcf_fn, truth_fn, &inputs.output_folder));

    checkpoints.finish();
    checkpoints.write(&inputs.output_folder.join("time.log"))?;

    Ok(RunSummary {
        num_breakpoints: breakpoints.len(),
        outputs,
        validation_report
    })
}

/// Optional post-run validation; a failure is reported and swallowed
fn run_validation(vcf_fn: &Path, truth_fn: &Path, output_folder: &Path) -> Option<PathBuf> {
    let report_fn = output_folder.join(VALIDATION_REPORT_NAME);
    info!("Validating breakpoints against {truth_fn:?}...");
    match validate_vcf(vcf_fn, truth_fn, MatchConfig::validation_default(), Some(&report_fn)) {
        Ok(_) => Some(report_fn),
        Err(e) => {
            warn!("Validation of breakpoints against {truth_fn:?} failed: {e:#}");
            warn!(
                "You can retry by running \"savana evaluate --input {} --somatic {} --output <VCF> --stats {}\"",
                vcf_fn.display(), truth_fn.display(), report_fn.display()
            );
            None
        }
    }
}
