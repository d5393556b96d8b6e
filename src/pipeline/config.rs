
use derive_builder::Builder;
use serde::Serialize;

/// Fixed size of the genome chunks handed to evidence extraction
pub const CHUNK_SIZE: u64 = 500_000;

/// Immutable run parameters. Every dispatched unit carries its own clone.
#[derive(Builder, Clone, Debug, Eq, PartialEq, Serialize)]
#[builder(default)]
pub struct RunConfig {
    /// Minimum SV length to record as evidence
    min_length: u64,
    /// Minimum mapping quality for reads and split alignments
    min_mapq: u8,
    /// Distance used when clustering and merging adjacent breakpoints
    buffer: u64,
    /// Minimum unique supporting reads required to keep a cluster
    min_depth: usize,
    /// Worker pool size
    threads: usize,
    /// Enables intermediate timing and the debug materializer
    debug: bool
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            min_length: 30,
            min_mapq: 5,
            buffer: 10,
            min_depth: 3,
            threads: 1,
            debug: false
        }
    }
}

impl RunConfig {
    // getters
    pub fn min_length(&self) -> u64 {
        self.min_length
    }

    pub fn min_mapq(&self) -> u8 {
        self.min_mapq
    }

    pub fn buffer(&self) -> u64 {
        self.buffer
    }

    pub fn min_depth(&self) -> usize {
        self.min_depth
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn debug(&self) -> bool {
        self.debug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = RunConfigBuilder::default()
            .buffer(25)
            .threads(8)
            .build().unwrap();
        assert_eq!(config.buffer(), 25);
        assert_eq!(config.threads(), 8);
        assert_eq!(config.min_length(), 30);
        assert_eq!(config.min_mapq(), 5);
        assert_eq!(config.min_depth(), 3);
        assert!(!config.debug());
    }
}
