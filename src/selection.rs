//! Practice-set selection.
//!
//! Every selector works on a snapshot of the table and returns owned copies of
//! the chosen rows: at most `count` of them, each word at most once. Sorting
//! is stable, so ties keep table order within a call. Randomness comes from
//! the caller so tests can pass a seeded generator.

use crate::progress::LearningThresholds;
use crate::vocabulary::VocabularyEntry;
use itertools::Itertools;
use rand::seq::{IteratorRandom, SliceRandom};
use rand::RngCore;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// Slots in the daily set reserved for refreshing mastered words
pub const DAILY_REFRESH_SLOTS: usize = 2;
/// Distractors shown next to the right answer in a multiple-choice question
pub const DISTRACTOR_COUNT: usize = 3;

/// Strategy for picking a practice set
pub trait WordSelector {
    fn select(
        &self,
        entries: &[VocabularyEntry],
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<VocabularyEntry>;
}

/// Rows never practiced, in table order
pub fn unpracticed(entries: &[VocabularyEntry]) -> Vec<VocabularyEntry> {
    entries.iter().filter(|e| !e.is_practiced()).cloned().collect()
}

/// New words first, a couple of mastered words for refresh, topped up with
/// the least practiced of the rest.
pub struct DailySelector {
    pub thresholds: LearningThresholds,
}

impl WordSelector for DailySelector {
    fn select(
        &self,
        entries: &[VocabularyEntry],
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<VocabularyEntry> {
        let count = count.min(entries.len());
        let new_slots = count.saturating_sub(DAILY_REFRESH_SLOTS);
        let mut picked: Vec<&VocabularyEntry> = entries
            .iter()
            .filter(|e| !e.is_practiced())
            .choose_multiple(rng, new_slots);

        let refresh_slots = DAILY_REFRESH_SLOTS.min(count - picked.len());
        let mastered: Vec<&VocabularyEntry> = entries
            .iter()
            .filter(|e| self.thresholds.is_learnt(e))
            .choose_multiple(rng, refresh_slots);
        picked.extend(mastered);

        let taken: HashSet<&str> = picked.iter().map(|e| e.word.as_str()).collect();
        let remaining = count - picked.len();
        let fill = entries
            .iter()
            .filter(|e| !taken.contains(e.word.as_str()))
            .sorted_by_key(|e| e.times_practiced)
            .take(remaining);
        picked.extend(fill);

        let mut selected: Vec<VocabularyEntry> = picked.into_iter().cloned().collect();
        selected.shuffle(rng);
        debug!(requested = count, selected = selected.len(), "daily words");
        selected
    }
}

/// Words not yet shown as a flashcard, sampled at random
pub struct FlashcardSelector;

impl WordSelector for FlashcardSelector {
    fn select(
        &self,
        entries: &[VocabularyEntry],
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<VocabularyEntry> {
        let unviewed: Vec<&VocabularyEntry> = entries.iter().filter(|e| !e.viewed).collect();
        let selected: Vec<VocabularyEntry> = unviewed
            .choose_multiple(rng, count)
            .map(|e| (*e).clone())
            .collect();
        debug!(requested = count, selected = selected.len(), "flashcard words");
        selected
    }
}

/// Multiple-choice and sentence tests: viewed words only, half weakest,
/// half longest unseen.
pub struct TestSelector;

impl WordSelector for TestSelector {
    fn select(
        &self,
        entries: &[VocabularyEntry],
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<VocabularyEntry> {
        let viewed: Vec<&VocabularyEntry> = entries.iter().filter(|e| e.viewed).collect();
        if viewed.is_empty() {
            return Vec::new();
        }
        let selected = two_halves(viewed, count, by_practice_then_rate, rng);
        debug!(requested = count, selected = selected.len(), "test words");
        selected
    }
}

/// Free translation practice over the whole table: half least practiced,
/// half longest unseen.
pub struct TranslationSelector;

impl WordSelector for TranslationSelector {
    fn select(
        &self,
        entries: &[VocabularyEntry],
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<VocabularyEntry> {
        let pool: Vec<&VocabularyEntry> = entries.iter().collect();
        let by_practice = |a: &&VocabularyEntry, b: &&VocabularyEntry| {
            a.times_practiced.cmp(&b.times_practiced)
        };
        let selected = two_halves(pool, count, by_practice, rng);
        debug!(requested = count, selected = selected.len(), "translation sentences");
        selected
    }
}

fn by_practice_then_rate(a: &&VocabularyEntry, b: &&VocabularyEntry) -> Ordering {
    a.times_practiced.cmp(&b.times_practiced).then(
        a.success_rate()
            .partial_cmp(&b.success_rate())
            .unwrap_or(Ordering::Equal),
    )
}

/// Never-practiced rows sort as the oldest
fn by_last_practiced(a: &&VocabularyEntry, b: &&VocabularyEntry) -> Ordering {
    a.last_practiced.cmp(&b.last_practiced)
}

/// First half (rounded up) from the head of `first_order`; second half from
/// the head of the recency order among the rows not already taken.
fn two_halves<F>(
    pool: Vec<&VocabularyEntry>,
    count: usize,
    first_order: F,
    rng: &mut dyn RngCore,
) -> Vec<VocabularyEntry>
where
    F: FnMut(&&VocabularyEntry, &&VocabularyEntry) -> Ordering,
{
    let first_half = count.div_ceil(2);
    let second_half = count / 2;

    let first: Vec<&VocabularyEntry> = pool
        .iter()
        .copied()
        .sorted_by(first_order)
        .take(first_half)
        .collect();
    let taken: HashSet<&str> = first.iter().map(|e| e.word.as_str()).collect();
    let second = pool
        .iter()
        .copied()
        .filter(|e| !taken.contains(e.word.as_str()))
        .sorted_by(by_last_practiced)
        .take(second_half);

    let union: Vec<&VocabularyEntry> = first
        .into_iter()
        .chain(second)
        .unique_by(|e| e.word.clone())
        .collect();
    if union.len() > count {
        union.choose_multiple(rng, count).map(|e| (*e).clone()).collect()
    } else {
        union.into_iter().cloned().collect()
    }
}

/// Answer set for a multiple-choice question: the target plus up to three
/// other words from the table, shuffled.
pub fn multiple_choice_options(
    entries: &[VocabularyEntry],
    target: &VocabularyEntry,
    rng: &mut dyn RngCore,
) -> Vec<String> {
    let mut options: Vec<String> = entries
        .iter()
        .map(|e| e.word.as_str())
        .filter(|w| *w != target.word)
        .unique()
        .choose_multiple(rng, DISTRACTOR_COUNT)
        .into_iter()
        .map(str::to_string)
        .collect();
    options.push(target.word.clone());
    options.shuffle(rng);
    options
}

/// Which field a test answer is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    /// The learner names the word from its translation
    Word,
    /// The learner fills the gap in `sentence_to_fill`
    Sentence,
}

/// Surrounding whitespace and letter case are ignored
pub fn grade_answer(entry: &VocabularyEntry, kind: AnswerKind, answer: &str) -> bool {
    let expected = match kind {
        AnswerKind::Word => &entry.word,
        AnswerKind::Sentence => &entry.correct_answer,
    };
    answer.trim().to_lowercase() == expected.trim().to_lowercase()
}
