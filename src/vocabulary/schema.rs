//! Tabular layout of the vocabulary file and the load-time migration from
//! older layouts.
//!
//! Rows are read by header name, so missing optional columns take defaults and
//! unknown columns are ignored. Any cell that cannot be interpreted fails the
//! whole load; the store then resets to an empty table.

use super::{VocabularyEntry, OPTION_COUNT};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const COLUMNS: [&str; 14] = [
    "word",
    "translation",
    "example",
    "example_translation",
    "times_practiced",
    "correct_answers",
    "topic",
    "level",
    "sentence_to_fill",
    "sentence_to_fill_translation",
    "options",
    "correct_answer",
    "viewed",
    "last_practiced",
];

pub const REQUIRED_COLUMNS: [&str; 2] = ["word", "translation"];

/// One row exactly as it sits in the file, before interpretation
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawRow {
    pub word: String,
    pub translation: String,
    pub example: String,
    pub example_translation: String,
    pub times_practiced: String,
    pub correct_answers: String,
    pub topic: String,
    pub level: String,
    pub sentence_to_fill: String,
    pub sentence_to_fill_translation: String,
    pub options: String,
    pub correct_answer: String,
    pub viewed: String,
    pub last_practiced: String,
}

/// Canonical row written back to disk
#[derive(Debug, Serialize)]
pub struct RowRecord<'a> {
    pub word: &'a str,
    pub translation: &'a str,
    pub example: &'a str,
    pub example_translation: &'a str,
    pub times_practiced: u32,
    pub correct_answers: u32,
    pub topic: &'a str,
    pub level: &'a str,
    pub sentence_to_fill: &'a str,
    pub sentence_to_fill_translation: &'a str,
    pub options: String,
    pub correct_answer: &'a str,
    pub viewed: bool,
    pub last_practiced: String,
}

impl<'a> From<&'a VocabularyEntry> for RowRecord<'a> {
    fn from(e: &'a VocabularyEntry) -> Self {
        Self {
            word: &e.word,
            translation: &e.translation,
            example: &e.example,
            example_translation: &e.example_translation,
            times_practiced: e.times_practiced,
            correct_answers: e.correct_answers,
            topic: e.topic.as_deref().unwrap_or(""),
            level: e.level.as_deref().unwrap_or(""),
            sentence_to_fill: &e.sentence_to_fill,
            sentence_to_fill_translation: &e.sentence_to_fill_translation,
            options: serde_json::to_string(&e.options).unwrap_or_else(|_| "[]".to_string()),
            correct_answer: &e.correct_answer,
            viewed: e.viewed,
            last_practiced: e
                .last_practiced
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

/// Result of interpreting one raw row
#[derive(Debug, PartialEq)]
pub struct MigratedRow {
    pub entry: VocabularyEntry,
    /// The row needed repair (counters out of order) or could not be repaired
    /// (no usable answer set)
    pub repaired: bool,
}

impl RawRow {
    pub fn migrate(self) -> Result<MigratedRow, String> {
        let word = self.word.trim().to_string();
        if word.is_empty() {
            return Err("row without a word".to_string());
        }
        let times_practiced = parse_counter(&self.times_practiced)
            .map_err(|e| format!("{word}: times_practiced {e}"))?;
        let mut correct_answers = parse_counter(&self.correct_answers)
            .map_err(|e| format!("{word}: correct_answers {e}"))?;
        let mut repaired = false;
        if correct_answers > times_practiced {
            correct_answers = times_practiced;
            repaired = true;
        }
        let options = parse_options(&self.options).map_err(|e| format!("{word}: options {e}"))?;
        if options.len() != OPTION_COUNT {
            warn!(word = %word, options = options.len(), "row has no usable answer set");
            repaired = true;
        }
        let viewed = parse_flag(&self.viewed).map_err(|e| format!("{word}: viewed {e}"))?;
        let last_practiced = parse_timestamp(&self.last_practiced)
            .map_err(|e| format!("{word}: last_practiced {e}"))?;

        // Older files predate the dedicated answer column
        let correct_answer = if self.correct_answer.is_empty() {
            word.clone()
        } else {
            self.correct_answer
        };

        Ok(MigratedRow {
            entry: VocabularyEntry {
                word,
                translation: self.translation,
                example: self.example,
                example_translation: self.example_translation,
                topic: non_empty(self.topic),
                level: non_empty(self.level),
                sentence_to_fill: self.sentence_to_fill,
                sentence_to_fill_translation: self.sentence_to_fill_translation,
                options,
                correct_answer,
                times_practiced,
                correct_answers,
                viewed,
                last_practiced,
            },
            repaired,
        })
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Counters are integers, but older writers emitted integral floats (`3.0`)
pub fn parse_counter(raw: &str) -> Result<u32, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    if let Ok(n) = raw.parse::<u32>() {
        return Ok(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&f) => Ok(f as u32),
        _ => Err(format!("is not a non-negative integer: '{raw}'")),
    }
}

pub fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" => Ok(false),
        "true" | "1" => Ok(true),
        other => Err(format!("is not a boolean: '{other}'")),
    }
}

pub fn parse_timestamp(raw: &str) -> Result<Option<DateTime<Local>>, String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("nat") {
        return Ok(None);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Local)));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(Some)
                .ok_or_else(|| format!("does not exist in local time: '{raw}'"));
        }
    }
    Err(format!("is not a timestamp: '{raw}'"))
}

/// Accepts a JSON array of strings or the legacy single-quoted list literal
pub fn parse_options(raw: &str) -> Result<Vec<String>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if let Ok(options) = serde_json::from_str::<Vec<String>>(raw) {
        return Ok(options);
    }
    parse_list_literal(raw)
}

fn parse_list_literal(raw: &str) -> Result<Vec<String>, String> {
    let inner = raw
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| format!("is not a bracketed list: '{raw}'"))?;

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let Some(quote) = chars.next() else { break };
        if quote != '\'' && quote != '"' {
            return Err(format!("unquoted list item in '{raw}'"));
        }
        let mut item = String::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        item.push(escaped);
                    }
                }
                c if c == quote => {
                    closed = true;
                    break;
                }
                c => item.push(c),
            }
        }
        if !closed {
            return Err(format!("unterminated string in '{raw}'"));
        }
        items.push(item);
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            Some(',') | None => {}
            Some(other) => return Err(format!("unexpected '{other}' in '{raw}'")),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn options_accept_json_and_legacy_literal() {
        assert_eq!(
            parse_options(r#"["le chat", "le chien", "l'eau", "le pain"]"#).unwrap(),
            vec!["le chat", "le chien", "l'eau", "le pain"]
        );
        assert_eq!(
            parse_options(r#"['le chat', 'le chien', "l'eau", 'it\'s']"#).unwrap(),
            vec!["le chat", "le chien", "l'eau", "it's"]
        );
        assert_eq!(parse_options("[]").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn options_reject_garbage() {
        assert!(parse_options("chat, chien").is_err());
        assert!(parse_options("['chat', chien]").is_err());
        assert!(parse_options("['chat").is_err());
    }

    #[test]
    fn counters_accept_integral_floats() {
        assert_eq!(parse_counter("3"), Ok(3));
        assert_eq!(parse_counter("3.0"), Ok(3));
        assert_eq!(parse_counter(""), Ok(0));
        assert!(parse_counter("2.5").is_err());
        assert!(parse_counter("-1").is_err());
    }

    #[test]
    fn flags_are_case_insensitive() {
        assert_eq!(parse_flag("True"), Ok(true));
        assert_eq!(parse_flag("FALSE"), Ok(false));
        assert_eq!(parse_flag(""), Ok(false));
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn timestamps_accept_rfc3339_and_naive_local() {
        let ts = parse_timestamp("2024-05-01T10:30:00+00:00").unwrap().unwrap();
        assert_eq!(ts.with_timezone(&chrono::Utc).hour(), 10);

        let naive = parse_timestamp("2024-05-01 12:34:56.123456").unwrap().unwrap();
        assert_eq!(naive.minute(), 34);

        assert_eq!(parse_timestamp(""), Ok(None));
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn migrate_clamps_counters_and_fills_answer() {
        let raw = RawRow {
            word: "chat".into(),
            translation: "cat".into(),
            times_practiced: "2".into(),
            correct_answers: "5".into(),
            options: "['chat', 'chien', 'pain', 'eau']".into(),
            viewed: "True".into(),
            ..Default::default()
        };
        let migrated = raw.migrate().unwrap();
        assert!(migrated.repaired);
        assert_eq!(migrated.entry.correct_answers, 2);
        assert_eq!(migrated.entry.correct_answer, "chat");
        assert!(migrated.entry.viewed);
        assert!(migrated.entry.topic.is_none());
    }

    #[test]
    fn migrate_flags_rows_without_answer_set() {
        let raw = RawRow {
            word: "chat".into(),
            translation: "cat".into(),
            times_practiced: "1".into(),
            correct_answers: "1".into(),
            ..Default::default()
        };
        let migrated = raw.migrate().unwrap();
        assert!(migrated.repaired);
        assert!(migrated.entry.options.is_empty());
        assert_eq!(migrated.entry.times_practiced, 1);
    }

    #[test]
    fn migrate_keeps_well_formed_rows_unrepaired() {
        let raw = RawRow {
            word: "chat".into(),
            translation: "cat".into(),
            options: r#"["chat", "chien", "pain", "eau"]"#.into(),
            correct_answer: "chat".into(),
            ..Default::default()
        };
        assert!(!raw.migrate().unwrap().repaired);
    }

    #[test]
    fn migrate_rejects_blank_word() {
        let raw = RawRow {
            translation: "cat".into(),
            ..Default::default()
        };
        assert!(raw.migrate().is_err());
    }
}
