
/// Stage timing recorder for time.log
pub mod checkpoints;
/// Helper functions for writing JSON via serde
pub mod json_io;
/// Helper functions for generating the progress bars
pub mod progress_bar;
