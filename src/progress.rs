use crate::util::{mean, percentage};
use crate::vocabulary::VocabularyEntry;
use serde::{Deserialize, Serialize};

/// Success rate (percent) under which a practiced word needs more work
pub const NEEDS_PRACTICE_BELOW: u32 = 60;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
pub enum LearningStatus {
    #[strum(serialize = "Not started")]
    NotStarted,
    #[strum(serialize = "Needs practice")]
    NeedsPractice,
    #[strum(serialize = "In progress")]
    InProgress,
    #[strum(serialize = "Learnt")]
    Learnt,
}

/// When a word counts as learnt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearningThresholds {
    pub min_practice_count: u32,
    /// Percentage, 0..=100
    pub min_success_rate: u32,
}

impl Default for LearningThresholds {
    fn default() -> Self {
        Self {
            min_practice_count: 7,
            min_success_rate: 75,
        }
    }
}

impl LearningThresholds {
    pub fn is_learnt(&self, entry: &VocabularyEntry) -> bool {
        entry.times_practiced > 0
            && entry.times_practiced >= self.min_practice_count
            && rate_at_least(entry, self.min_success_rate)
    }
}

/// correct/practiced >= percent/100, in integers so 3/4 vs 75% is exact
fn rate_at_least(entry: &VocabularyEntry, percent: u32) -> bool {
    entry.correct_answers as u64 * 100 >= percent as u64 * entry.times_practiced as u64
}

/// Classify an entry. The checks run in order and the first match wins.
pub fn learning_status(entry: &VocabularyEntry, thresholds: &LearningThresholds) -> LearningStatus {
    if entry.times_practiced == 0 {
        LearningStatus::NotStarted
    } else if !rate_at_least(entry, NEEDS_PRACTICE_BELOW) {
        LearningStatus::NeedsPractice
    } else if !thresholds.is_learnt(entry) {
        LearningStatus::InProgress
    } else {
        LearningStatus::Learnt
    }
}

/// One line of the progress view
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRow {
    pub entry: VocabularyEntry,
    /// 0..=100
    pub success_rate: f64,
    pub status: LearningStatus,
}

/// All entries annotated with status, ordered by status then best rate first
pub fn progress_report(
    entries: &[VocabularyEntry],
    thresholds: &LearningThresholds,
) -> Vec<ProgressRow> {
    let mut rows: Vec<ProgressRow> = entries
        .iter()
        .map(|entry| ProgressRow {
            success_rate: percentage(entry.correct_answers, entry.times_practiced),
            status: learning_status(entry, thresholds),
            entry: entry.clone(),
        })
        .collect();
    rows.sort_by(|a, b| {
        a.status
            .cmp(&b.status)
            .then(b.success_rate.partial_cmp(&a.success_rate).unwrap_or(std::cmp::Ordering::Equal))
    });
    rows
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressSummary {
    pub total: usize,
    pub learnt: usize,
    /// Practiced at least once but not learnt yet
    pub in_progress: usize,
    /// Mean success rate over practiced entries, percent
    pub average_success_rate: f64,
}

pub fn summary_counts(
    entries: &[VocabularyEntry],
    thresholds: &LearningThresholds,
) -> ProgressSummary {
    let learnt = entries.iter().filter(|e| thresholds.is_learnt(e)).count();
    let practiced_rates: Vec<f64> = entries
        .iter()
        .filter(|e| e.is_practiced())
        .map(|e| percentage(e.correct_answers, e.times_practiced))
        .collect();
    ProgressSummary {
        total: entries.len(),
        learnt,
        in_progress: practiced_rates.len() - learnt,
        average_success_rate: mean(&practiced_rates).unwrap_or(0.0),
    }
}
