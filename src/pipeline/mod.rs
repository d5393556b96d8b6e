/*!
# Pipeline
Drives a `run`: partitioning, the two parallel dispatch stages, the single-threaded consensus pass, and the outputs.
*/

/// Run parameters shared by every stage
pub mod config;
/// Optional per-cluster diagnostic files
pub mod debug_output;
/// Parallel fan-out/fan-in of extraction and clustering work
pub mod dispatch;
/// Stage sequencing for a full run
pub mod orchestrator;
/// Splits the genome into extraction work units
pub mod partition;
