/*!
# Writers module
Contains the logic for writing the breakpoint outputs of the run command.
*/
/// Per-breakpoint VCF, BEDPE and read-support renderings
pub mod breakpoint_records;
/// Writes the three breakpoint files in lockstep
pub mod breakpoint_writer;
