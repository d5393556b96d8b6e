
use log::{LevelFilter, error, info};

use savana::cli::core::{Commands, get_cli};
use savana::cli::evaluate::{EvaluateSettings, check_evaluate_settings};
use savana::cli::run::{RunSettings, check_run_settings};
use savana::pipeline::orchestrator::{RunInputs, default_engine, prepare_run, run_pipeline};
use savana::util::checkpoints::Checkpoints;
use savana::util::json_io::save_json;
use savana::validation::evaluate::run_evaluation;

fn init_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}

fn run_run(settings: RunSettings) {
    // start the timer
    let checkpoints = Checkpoints::new(settings.debug);

    // set up logging before we check the other settings
    init_logging(settings.verbosity);

    let settings = match check_run_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let run_config = match settings.run_config() {
        Ok(rc) => rc,
        Err(e) => {
            error!("Error while building run config: {e:#}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    // set up the number of threads for rayon
    match rayon::ThreadPoolBuilder::new().num_threads(run_config.threads()).build_global() {
        Ok(()) => {},
        Err(e) => {
            error!("Error while building thread pool: {e}");
            std::process::exit(exitcode::OSERR);
        }
    };

    // create the primary output folder
    info!("Creating output folder at {:?}...", settings.output_folder);
    match std::fs::create_dir_all(&settings.output_folder) {
        Ok(()) => {},
        Err(e) => {
            error!("Error while creating output folder: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    if settings.debug {
        // save the CLI options
        let cli_json = settings.output_folder.join("cli_settings.json");
        info!("Saving CLI options to {cli_json:?}...");
        if let Err(e) = save_json(&settings, &cli_json) {
            error!("Error while saving CLI options: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    let inputs = RunInputs {
        tumour_fn: settings.tumour_fn.clone(),
        normal_fn: settings.normal_fn.clone(),
        reference_fn: settings.reference_fn.clone(),
        reference_index_fn: settings.reference_index(),
        contigs_fn: settings.contigs_fn.clone(),
        output_folder: settings.output_folder.clone(),
        sample: settings.sample.clone(),
        validation_fn: settings.validation_fn.clone()
    };

    info!("Loading reference contigs and alignment indices...");
    let prepared = match prepare_run(&inputs) {
        Ok(p) => p,
        Err(e) => {
            error!("Error while loading inputs: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    let engine = default_engine(prepared.allowlist.clone());
    let summary = match run_pipeline(&inputs, &prepared, &run_config, &engine, checkpoints) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while running pipeline: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };

    info!("Wrote {} breakpoints to {:?}", summary.num_breakpoints, summary.outputs.vcf_fn);
    if let Some(report_fn) = summary.validation_report.as_deref() {
        info!("Validation report saved to {report_fn:?}");
    }
}

fn run_evaluate(settings: EvaluateSettings) {
    // set up logging before we check the other settings
    init_logging(settings.verbosity);

    let settings = match check_evaluate_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let job = match settings.evaluate_job() {
        Ok(j) => j,
        Err(e) => {
            error!("Error while building match config: {e:#}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    if let Err(e) = run_evaluation(&job) {
        error!("Error while evaluating {:?}: {e:#}", job.input_vcf);
        std::process::exit(exitcode::IOERR);
    }
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Run(settings) => {
            run_run(*settings);
        },
        Commands::Evaluate(settings) => {
            run_evaluate(*settings);
        }
    }

    info!("Process finished successfully.");
}
