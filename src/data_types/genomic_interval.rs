
use anyhow::{ensure, Context};
use noodles::core::{Position, Region};

/// A half-open, 0-based interval on a single contig.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct GenomicInterval {
    /// Contig / chromosome name
    contig: String,
    /// 0-based start, inclusive
    start: u64,
    /// 0-based end, exclusive
    end: u64
}

impl GenomicInterval {
    /// Constructor with sanity checks
    /// # Errors
    /// * if `start >= end`
    pub fn new(contig: String, start: u64, end: u64) -> anyhow::Result<Self> {
        ensure!(start < end, "Interval start must be < end: {contig}:{start}-{end}");
        Ok(Self {
            contig, start, end
        })
    }

    /// Number of bases covered by the interval
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Intervals are never constructed empty, provided for API completeness
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the 0-based `position` is inside the interval
    pub fn contains(&self, position: u64) -> bool {
        self.start <= position && position < self.end
    }

    /// Converts into a 1-based, fully-closed noodles region for indexed queries
    pub fn to_region(&self) -> anyhow::Result<Region> {
        let start = Position::try_from(self.start as usize + 1)
            .with_context(|| format!("Invalid start for {self}"))?;
        let end = Position::try_from(self.end as usize)
            .with_context(|| format!("Invalid end for {self}"))?;
        Ok(Region::new(self.contig.as_str(), start..=end))
    }

    // getters
    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }
}

impl std::fmt::Display for GenomicInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval() {
        let interval = GenomicInterval::new("chr1".to_string(), 10, 20).unwrap();
        assert_eq!(interval.len(), 10);
        assert!(interval.contains(10));
        assert!(interval.contains(19));
        assert!(!interval.contains(20));
        assert!(!interval.contains(9));
        assert_eq!(format!("{interval}"), "chr1:10-20");

        assert!(GenomicInterval::new("chr1".to_string(), 20, 20).is_err());
        assert!(GenomicInterval::new("chr1".to_string(), 21, 20).is_err());
    }

    #[test]
    fn test_to_region() {
        let interval = GenomicInterval::new("chr2".to_string(), 0, 500).unwrap();
        let region = interval.to_region().unwrap();
        assert_eq!(region.to_string(), "chr2:1-500");
    }
}
