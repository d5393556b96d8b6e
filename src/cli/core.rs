
use clap::{Parser, Subcommand};
use chrono::Datelike;
use lazy_static::lazy_static;
use std::path::Path;

use crate::cli::evaluate::EvaluateSettings;
use crate::cli::run::RunSettings;
use crate::errors::SavanaError;

lazy_static! {
    /// Stores the full version string we plan to use, which is generated in build.rs
    /// # Examples
    /// * `0.2.0-6bb9635-dirty` - while on a dirty branch
    /// * `0.2.0-6bb9635` - with a fresh commit
    pub static ref FULL_VERSION: String = format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("VERGEN_GIT_DESCRIBE"));

    /// Shared after help string
    pub static ref AFTER_HELP: String = format!("Copyright (C) 2023-{}     SAVANA developers
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year());
}

#[derive(Parser)]
#[clap(author,
    version = &**FULL_VERSION,
    about,
    after_help = &**AFTER_HELP)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

/// SAVANA, a somatic structural variant caller for long-read tumour/normal pairs.
/// Select a subcommand to see more usage information:
#[derive(Subcommand)]
pub enum Commands {
    /// Calls somatic breakpoints from a tumour and a normal alignment file
    Run(Box<RunSettings>),
    /// Labels a breakpoint VCF against somatic and germline truth sets
    Evaluate(Box<EvaluateSettings>)
}

pub fn get_cli() -> Cli {
    Cli::parse()
}

/// Checks if a file exists
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
/// # Errors
/// * `SavanaError::MissingInput` if the file is not there
pub fn check_required_filename(filename: &Path, label: &str) -> Result<(), SavanaError> {
    if !filename.exists() {
        return Err(SavanaError::MissingInput {
            label: label.to_string(),
            path: filename.to_path_buf()
        });
    }

    // file exists
    Ok(())
}

/// Checks if a file exists if one was provided
/// # Arguments
/// * `opt_filename` - the optional file path to check for
/// * `label` - the label to use for error messages
/// # Errors
/// * `SavanaError::MissingInput` if a file was given and it is not there
pub fn check_optional_filename(opt_filename: Option<&Path>, label: &str) -> Result<(), SavanaError> {
    if let Some(filename) = opt_filename {
        check_required_filename(filename, label)?;
    }

    // file either was not specified OR it exists
    Ok(())
}
