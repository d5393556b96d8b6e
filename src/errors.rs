
use std::path::PathBuf;

/// Fatal failures of a run. Anything recoverable is logged as a warning where it happens instead.
#[derive(thiserror::Error, Debug)]
pub enum SavanaError {
    #[error("{label} does not exist: {path:?}")]
    MissingInput { label: String, path: PathBuf },
    #[error("{label} index does not exist, tried: {tried:?}")]
    MissingIndex { label: String, tried: Vec<PathBuf> },
    #[error("Output directory {path:?} already exists and contains files. Please remove the files or supply a different directory name.")]
    OutputDirectoryNotEmpty { path: PathBuf },
    #[error("Thread count was not resolved to a positive integer")]
    InvalidThreadCount,
    #[error("Worker failed during {stage} for {unit}: {source:#}")]
    WorkerFault {
        stage: String,
        unit: String,
        source: anyhow::Error
    }
}

impl SavanaError {
    /// True for the failures detected before any worker starts
    pub fn is_input_validation(&self) -> bool {
        match self {
            SavanaError::MissingInput { .. } |
            SavanaError::MissingIndex { .. } |
            SavanaError::OutputDirectoryNotEmpty { .. } |
            SavanaError::InvalidThreadCount => true,

            SavanaError::WorkerFault { .. } => false
        }
    }
}
