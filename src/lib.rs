
/// Command line interface functionality
pub mod cli;
/// Contains various shared data types
pub mod data_types;
/// Evidence extraction, clustering and consensus collaborators
pub mod engine;
/// Fatal error taxonomy
pub mod errors;
/// Tooling for parsing input files into meaningful structs / data
pub mod parsing;
/// Stage orchestration for the run subcommand
pub mod pipeline;
/// Various utility functions that tend to be very generic
pub mod util;
/// Truth-set matching, reports and evaluate labelling
pub mod validation;
/// All output writers
pub mod writers;
