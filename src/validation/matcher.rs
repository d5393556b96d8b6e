
use anyhow::ensure;
use derive_builder::Builder;
use indexmap::IndexMap;
use log::debug;
use rustc_hash::FxHashMap as HashMap;

use crate::data_types::summary_metrics::SummaryMetrics;
use crate::validation::records::{CompareRecord, TruthRecord};

/// Tolerance used when validating straight after a run
pub const VALIDATION_TOLERANCE: u64 = 100;

/// Configuration for the matcher
#[derive(Builder, Clone, Copy, Debug)]
#[builder(default)]
pub struct MatchConfig {
    /// Maximum distance between a call and a truth entry, in bases
    tolerance: u64
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::validation_default()
    }
}

impl MatchConfig {
    /// The fixed tolerance of the `run` validation path
    pub fn validation_default() -> Self {
        Self { tolerance: VALIDATION_TOLERANCE }
    }

    pub fn tolerance(&self) -> u64 {
        self.tolerance
    }
}

/// Details recorded on a truth entry when it gets matched
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TruthMatch {
    /// Index of the matching compare record
    pub compare_index: usize,
    /// Absolute distance between the two positions
    pub delta: u64,
    /// Clusters of the matching call, if it had any
    pub cluster_ids: Option<Vec<String>>
}

/// Match state for both record sets, keyed by record index.
/// Each side moves from unmatched to matched at most once.
#[derive(Clone, Debug, Default)]
pub struct MatchState {
    truth: Vec<Option<TruthMatch>>,
    compare: Vec<Option<usize>>
}

impl MatchState {
    fn new(num_truth: usize, num_compare: usize) -> Self {
        Self {
            truth: vec![None; num_truth],
            compare: vec![None; num_compare]
        }
    }

    pub fn truth_match(&self, truth_index: usize) -> Option<&TruthMatch> {
        self.truth[truth_index].as_ref()
    }

    pub fn compare_match(&self, compare_index: usize) -> Option<usize> {
        self.compare[compare_index]
    }

    /// The only transition; fails if either side was already matched
    fn claim(&mut self, truth_index: usize, compare_index: usize, delta: u64, cluster_ids: Option<Vec<String>>) -> anyhow::Result<()> {
        ensure!(self.truth[truth_index].is_none(), "Truth record #{truth_index} matched twice");
        ensure!(self.compare[compare_index].is_none(), "Compare record #{compare_index} matched twice");
        self.truth[truth_index] = Some(TruthMatch { compare_index, delta, cluster_ids });
        self.compare[compare_index] = Some(truth_index);
        Ok(())
    }
}

/// An in-range call that only found already matched truth entries
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DuplicateClaim {
    pub truth_label: String,
    /// Clusters of the call that owns the truth entry
    pub claimed_by: Option<Vec<String>>,
    pub compare_label: String
}

/// Classification of both record sets
#[derive(Clone, Debug, Default)]
pub struct MatchResult {
    /// Compare indices in priority order
    pub priority_order: Vec<usize>,
    /// Matched compare indices, in priority order
    pub true_positives: Vec<usize>,
    /// Unmatched compare indices, in priority order
    pub false_positives: Vec<usize>,
    /// Unmatched truth indices, in file order
    pub false_negatives: Vec<usize>,
    pub duplicates: Vec<DuplicateClaim>,
    pub state: MatchState
}

impl MatchResult {
    pub fn metrics(&self) -> SummaryMetrics {
        SummaryMetrics::new(
            self.true_positives.len() as u64,
            self.false_negatives.len() as u64,
            self.true_positives.len() as u64,
            self.false_positives.len() as u64
        )
    }
}

/// Sorts compare indices by normal support ascending, then tumour support descending; stable
pub fn priority_order(compare: &[CompareRecord]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..compare.len()).collect();
    order.sort_by_key(|&i| (compare[i].normal_support, std::cmp::Reverse(compare[i].tumour_support)));
    order
}

/// Greedy matching of calls against a truth set.
/// Calls are visited in priority order; each takes the first unmatched truth entry on its chromosome
/// (in file order) within the tolerance.
/// # Arguments
/// * `truth` - the truth records, in file order
/// * `compare` - the calls, with chromosomes already normalized to the truth convention
/// * `config` - matching tolerance
/// # Errors
/// * if the match state is ever asked to match a record twice
pub fn match_breakpoints(truth: &[TruthRecord], compare: &[CompareRecord], config: MatchConfig) -> anyhow::Result<MatchResult> {
    let mut truth_by_chrom: HashMap<&str, Vec<usize>> = HashMap::default();
    for (i, t) in truth.iter().enumerate() {
        truth_by_chrom.entry(t.chrom.as_str()).or_default().push(i);
    }

    let order = priority_order(compare);
    let mut state = MatchState::new(truth.len(), compare.len());
    // keyed by compare index, keeps the first-seen order
    let mut duplicates: IndexMap<usize, DuplicateClaim> = IndexMap::new();

    for &ci in order.iter() {
        let call = &compare[ci];
        let Some(candidates) = truth_by_chrom.get(call.chrom.as_str()) else {
            continue;
        };
        for &ti in candidates.iter() {
            let delta = truth[ti].pos.abs_diff(call.pos);
            if delta > config.tolerance() {
                continue;
            }
            match state.truth_match(ti) {
                None => {
                    state.claim(ti, ci, delta, call.cluster_ids.clone())?;
                    duplicates.shift_remove(&ci);
                    break;
                },
                Some(existing) => {
                    duplicates.insert(ci, DuplicateClaim {
                        truth_label: truth[ti].label.clone(),
                        claimed_by: existing.cluster_ids.clone(),
                        compare_label: call.label.clone()
                    });
                }
            }
        }
    }

    let (true_positives, false_positives): (Vec<usize>, Vec<usize>) = order.iter()
        .copied()
        .partition(|&ci| state.compare_match(ci).is_some());
    let false_negatives: Vec<usize> = (0..truth.len())
        .filter(|&ti| state.truth_match(ti).is_none())
        .collect();
    debug!("Matching: {} TP, {} FP, {} FN, {} duplicates", true_positives.len(), false_positives.len(), false_negatives.len(), duplicates.len());

    Ok(MatchResult {
        priority_order: order,
        true_positives,
        false_positives,
        false_negatives,
        duplicates: duplicates.into_values().collect(),
        state
    })
}

/// Per-SVTYPE counts of identified truth entries, in first-appearance order
pub fn sv_type_breakdown(truth: &[TruthRecord], result: &MatchResult) -> IndexMap<String, (usize, usize)> {
    let mut breakdown: IndexMap<String, (usize, usize)> = IndexMap::new();
    for (ti, record) in truth.iter().enumerate() {
        let entry = breakdown.entry(record.sv_type.clone()).or_default();
        if result.state.truth_match(ti).is_some() {
            entry.0 += 1;
        }
        entry.1 += 1;
    }
    breakdown
}
