pub mod schema;
pub mod store;

pub use store::{LoadOutcome, VocabularyStore};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub const OPTION_COUNT: usize = 4;

/// One learnable word or phrase together with its practice statistics
#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyEntry {
    pub word: String,
    pub translation: String,
    pub example: String,
    pub example_translation: String,
    pub topic: Option<String>,
    pub level: Option<String>,
    pub sentence_to_fill: String,
    pub sentence_to_fill_translation: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub times_practiced: u32,
    pub correct_answers: u32,
    pub viewed: bool,
    pub last_practiced: Option<DateTime<Local>>,
}

impl VocabularyEntry {
    /// Fraction of attempts answered correctly, 0 when never practiced
    pub fn success_rate(&self) -> f64 {
        if self.times_practiced == 0 {
            0.0
        } else {
            self.correct_answers as f64 / self.times_practiced as f64
        }
    }

    pub fn is_practiced(&self) -> bool {
        self.times_practiced > 0
    }
}

/// A fresh entry as produced by the generation service: no counters yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCandidate {
    pub word: String,
    pub translation: String,
    pub example: String,
    pub example_translation: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    pub sentence_to_fill: String,
    pub sentence_to_fill_translation: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl WordCandidate {
    /// Surrounding whitespace is not part of a word's identity
    pub fn normalized(mut self) -> Self {
        let trimmed = self.word.trim();
        if trimmed.len() != self.word.len() {
            self.word = trimmed.to_string();
        }
        self
    }

    /// Checks the multiple-choice invariants: exactly four options, one of
    /// which is the correct answer. Returns the reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.word.trim().is_empty() {
            return Err("word is empty".to_string());
        }
        if self.options.len() != OPTION_COUNT {
            return Err(format!(
                "expected {OPTION_COUNT} options, got {}",
                self.options.len()
            ));
        }
        if !self.options.iter().any(|o| o == &self.correct_answer) {
            return Err(format!(
                "correct answer '{}' is not among the options",
                self.correct_answer
            ));
        }
        Ok(())
    }
}

impl From<WordCandidate> for VocabularyEntry {
    fn from(c: WordCandidate) -> Self {
        Self {
            word: c.word,
            translation: c.translation,
            example: c.example,
            example_translation: c.example_translation,
            topic: c.topic.filter(|t| !t.is_empty()),
            level: c.level.filter(|l| !l.is_empty()),
            sentence_to_fill: c.sentence_to_fill,
            sentence_to_fill_translation: c.sentence_to_fill_translation,
            options: c.options,
            correct_answer: c.correct_answer,
            times_practiced: 0,
            correct_answers: 0,
            viewed: false,
            last_practiced: None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn success_rate_is_zero_before_practice() {
        assert_eq!(entry("chat", 0, 0).success_rate(), 0.0);
        assert_eq!(entry("chat", 4, 3).success_rate(), 0.75);
    }

    #[test]
    fn candidate_with_three_options_is_rejected() {
        let mut c = candidate("chat");
        c.options.pop();
        assert_eq!(c.validate(), Err("expected 4 options, got 3".to_string()));
    }

    #[test]
    fn candidate_answer_must_be_an_option() {
        let mut c = candidate("chat");
        c.correct_answer = "chien".to_string();
        assert!(c.validate().unwrap_err().contains("chien"));
    }

    #[test]
    fn normalized_trims_the_word_only() {
        let mut c = candidate(" chat\t");
        c.translation = " cat ".to_string();
        let c = c.normalized();
        assert_eq!(c.word, "chat");
        assert_eq!(c.translation, " cat ");
        assert_eq!(c.correct_answer, " chat\t");
    }

    #[test]
    fn candidate_converts_to_fresh_entry() {
        let mut c = candidate("chat");
        c.topic = Some(String::new());
        let e: VocabularyEntry = c.into();
        assert_eq!(e.times_practiced, 0);
        assert_eq!(e.correct_answers, 0);
        assert!(!e.viewed);
        assert!(e.last_practiced.is_none());
        assert!(e.topic.is_none());
    }

    #[test]
    fn candidate_deserializes_without_optional_fields() {
        let json = r#"{
            "word": "chat", "translation": "cat", "example": "Le chat dort.",
            "example_translation": "The cat sleeps.", "sentence_to_fill": "Le ___ mange.",
            "sentence_to_fill_translation": "The cat eats.",
            "options": ["chat", "chien", "pain", "eau"], "correct_answer": "chat"
        }"#;
        let c: WordCandidate = serde_json::from_str(json).unwrap();
        assert!(c.topic.is_none());
        assert!(c.validate().is_ok());
    }
}
