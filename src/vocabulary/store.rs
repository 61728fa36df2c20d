use super::schema::{RawRow, RowRecord, COLUMNS, REQUIRED_COLUMNS};
use super::{VocabularyEntry, WordCandidate};
use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use chrono::Local;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_MIN_UNPRACTICED: usize = 5;

/// How the table came to be in memory after `load`
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// No file yet; the table starts empty
    Missing,
    Loaded,
    /// Loaded after repairing rows or an older column layout
    Migrated { repaired_rows: usize },
    /// File was unusable and the table was reset to empty
    Reset(String),
}

/// Sole owner of the vocabulary table. Every mutation goes through a named
/// operation and is written back before returning.
#[derive(Debug)]
pub struct VocabularyStore {
    path: Option<PathBuf>,
    entries: Vec<VocabularyEntry>,
}

impl VocabularyStore {
    /// Open the store at the default location under the data directory
    pub fn open_default() -> (Self, LoadOutcome) {
        let path = AppDirs::vocabulary_path()
            .unwrap_or_else(|| PathBuf::from("polyglot_vocabulary.csv"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> (Self, LoadOutcome) {
        let mut store = Self {
            path: Some(path.as_ref().to_path_buf()),
            entries: Vec::new(),
        };
        let outcome = store.load();
        (store, outcome)
    }

    /// A store with no backing file; saves are no-ops
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Vec::new(),
        }
    }

    pub fn from_entries(entries: Vec<VocabularyEntry>) -> Self {
        Self {
            path: None,
            entries,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, word: &str) -> Option<&VocabularyEntry> {
        self.entries.iter().find(|e| e.word == word)
    }

    pub fn words(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.word.clone()).collect()
    }

    /// Re-read the table from disk. Corruption never fails: the table is
    /// reset to empty and the reason is reported in the outcome.
    pub fn load(&mut self) -> LoadOutcome {
        let Some(path) = self.path.clone() else {
            return LoadOutcome::Loaded;
        };
        if !path.exists() {
            self.entries.clear();
            debug!(path = %path.display(), "no vocabulary file yet");
            return LoadOutcome::Missing;
        }
        match read_table(&path) {
            Ok((entries, repaired_rows, layout_changed)) => {
                info!(path = %path.display(), entries = entries.len(), "vocabulary loaded");
                self.entries = entries;
                if repaired_rows > 0 || layout_changed {
                    LoadOutcome::Migrated { repaired_rows }
                } else {
                    LoadOutcome::Loaded
                }
            }
            Err(reason) => {
                warn!(path = %path.display(), %reason, "vocabulary file unusable, starting empty");
                self.entries.clear();
                LoadOutcome::Reset(reason)
            }
        }
    }

    /// Write the whole table in the canonical layout
    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        if self.entries.is_empty() {
            writer.write_record(COLUMNS)?;
        }
        for entry in &self.entries {
            writer.serialize(RowRecord::from(entry))?;
        }
        writer.flush()?;
        debug!(path = %path.display(), entries = self.entries.len(), "vocabulary saved");
        Ok(())
    }

    /// Insert new entries. The batch is validated as a whole first; one bad
    /// entry rejects everything. Words are trimmed the same way `load` trims
    /// them, and words already present are skipped.
    pub fn append(&mut self, candidates: Vec<WordCandidate>) -> Result<usize, StoreError> {
        let candidates: Vec<WordCandidate> =
            candidates.into_iter().map(WordCandidate::normalized).collect();
        for candidate in &candidates {
            candidate.validate().map_err(|reason| StoreError::Validation {
                word: candidate.word.clone(),
                reason,
            })?;
        }

        let mut known: HashSet<String> = self.entries.iter().map(|e| e.word.clone()).collect();
        let mut added = 0;
        for candidate in candidates {
            if !known.insert(candidate.word.clone()) {
                debug!(word = %candidate.word, "skipping duplicate word");
                continue;
            }
            self.entries.push(candidate.into());
            added += 1;
        }
        if added > 0 {
            self.save()?;
        }
        info!(added, total = self.entries.len(), "words appended");
        Ok(added)
    }

    /// Count one practice attempt for `word`
    pub fn record_attempt(&mut self, word: &str, correct: bool) -> Result<(), StoreError> {
        let entry = self.entry_mut(word)?;
        entry.times_practiced += 1;
        if correct {
            entry.correct_answers += 1;
        }
        entry.last_practiced = Some(Local::now());
        info!(word, correct, "attempt recorded");
        self.save()
    }

    /// First showing as a flashcard
    pub fn mark_viewed(&mut self, word: &str) -> Result<(), StoreError> {
        let entry = self.entry_mut(word)?;
        entry.viewed = true;
        entry.last_practiced = Some(Local::now());
        debug!(word, "marked viewed");
        self.save()
    }

    /// "I don't know": the word was seen again but no attempt is counted
    pub fn mark_skipped(&mut self, word: &str) -> Result<(), StoreError> {
        let entry = self.entry_mut(word)?;
        entry.last_practiced = Some(Local::now());
        debug!(word, "marked skipped");
        self.save()
    }

    /// Remove `word`; absence is not an error
    pub fn delete(&mut self, word: &str) -> Result<bool, StoreError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.word != word);
        let removed = self.entries.len() != before;
        if removed {
            info!(word, "word deleted");
            self.save()?;
        }
        Ok(removed)
    }

    pub fn unpracticed_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_practiced()).count()
    }

    /// True when the pool of never-practiced words has run low
    pub fn needs_new_words(&self, min_unpracticed: usize) -> bool {
        self.unpracticed_count() < min_unpracticed
    }

    fn entry_mut(&mut self, word: &str) -> Result<&mut VocabularyEntry, StoreError> {
        self.entries
            .iter_mut()
            .find(|e| e.word == word)
            .ok_or_else(|| StoreError::NotFound(word.to_string()))
    }
}

/// Returns the entries, the number of repaired rows, and whether the column
/// layout differed from the canonical one.
fn read_table(path: &Path) -> Result<(Vec<VocabularyEntry>, usize, bool), String> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| e.to_string())?;
    let headers = reader.headers().map_err(|e| e.to_string())?.clone();
    let header_names: Vec<&str> = headers.iter().collect();

    if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| !header_names.contains(c)) {
        return Err(format!("missing column '{missing}'"));
    }
    let layout_changed = header_names != COLUMNS;

    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut repaired_rows = 0;
    for (line, row) in reader.deserialize::<RawRow>().enumerate() {
        let raw = row.map_err(|e| format!("row {}: {e}", line + 1))?;
        let migrated = raw.migrate()?;
        if !seen.insert(migrated.entry.word.clone()) {
            warn!(word = %migrated.entry.word, "dropping duplicate row");
            repaired_rows += 1;
            continue;
        }
        if migrated.repaired {
            repaired_rows += 1;
        }
        entries.push(migrated.entry);
    }
    Ok((entries, repaired_rows, layout_changed))
}
