/// Consensus breakpoint calls and their enumeration
pub mod breakpoint;
/// Breakpoint clusters and the per-class cluster map
pub mod cluster;
/// Evidence records and sample labels
pub mod evidence;
/// Half-open intervals on a contig
pub mod genomic_interval;
/// The five breakpoint orientation classes
pub mod orientation;
/// Contains tracker for TP, FP, FN and derived metrics
pub mod summary_metrics;
/// Units of work handed to the worker pool
pub mod work_unit;
