use crate::app_dirs::AppDirs;
use crate::error::SettingsError;
use crate::progress::LearningThresholds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const WORDS_PER_DAY_RANGE: (usize, usize) = (1, 50);
pub const FLASHCARD_DELAY_RANGE: (u64, u64) = (1, 30);
pub const TEST_WORD_COUNT_RANGE: (usize, usize) = (5, 50);

/// User preferences, persisted as a flat JSON record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserSettings {
    pub native_language: Option<String>,
    pub target_language: Option<String>,
    pub level: Option<String>,
    pub topics: BTreeSet<String>,
    pub include_phrases: bool,
    pub words_per_day: usize,
    /// Seconds a flashcard is shown before it flips
    pub flashcard_delay: u64,
    pub test_word_count: usize,
    pub min_practice_count: u32,
    /// Percentage, 0..=100
    pub min_success_rate: u32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            native_language: None,
            target_language: None,
            level: None,
            topics: BTreeSet::new(),
            include_phrases: true,
            words_per_day: 5,
            flashcard_delay: 5,
            test_word_count: 10,
            min_practice_count: 7,
            min_success_rate: 75,
        }
    }
}

impl UserSettings {
    pub fn thresholds(&self) -> LearningThresholds {
        LearningThresholds {
            min_practice_count: self.min_practice_count,
            min_success_rate: self.min_success_rate,
        }
    }

    /// Onboarding has been completed when both languages are known
    pub fn is_onboarded(&self) -> bool {
        self.native_language.is_some() && self.target_language.is_some()
    }
}

/// Partial update from the settings screen; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    pub words_per_day: Option<usize>,
    pub flashcard_delay: Option<u64>,
    pub test_word_count: Option<usize>,
    pub min_practice_count: Option<u32>,
    pub min_success_rate: Option<u32>,
    pub topics: Option<BTreeSet<String>>,
    pub include_phrases: Option<bool>,
    pub level: Option<String>,
}

pub trait SettingsStore {
    fn load(&self) -> UserSettings;
    fn save(&self, settings: &UserSettings) -> Result<(), SettingsError>;
    fn exists(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path =
            AppDirs::settings_path().unwrap_or_else(|| PathBuf::from("polyglot_settings.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> UserSettings {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<UserSettings>(&bytes) {
                Ok(settings) => return settings,
                Err(e) => warn!(
                    path = %self.path.display(),
                    error = %e,
                    "unreadable settings, using defaults"
                ),
            }
        }
        UserSettings::default()
    }

    fn save(&self, settings: &UserSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings)?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Owns the settings record for the application lifetime and persists
/// every mutation through its store.
pub struct UserProfile<S: SettingsStore> {
    store: S,
    settings: UserSettings,
}

impl<S: SettingsStore> UserProfile<S> {
    pub fn load(store: S) -> Self {
        let settings = store.load();
        Self { store, settings }
    }

    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    pub fn user_exists(&self) -> bool {
        self.store.exists()
    }

    pub fn create_user(
        &mut self,
        native_language: &str,
        target_language: &str,
        level: &str,
        topics: impl IntoIterator<Item = String>,
        include_phrases: bool,
    ) -> Result<(), SettingsError> {
        self.settings.native_language = Some(native_language.to_string());
        self.settings.target_language = Some(target_language.to_string());
        self.settings.level = Some(level.to_string());
        self.settings.topics = topics.into_iter().collect();
        self.settings.include_phrases = include_phrases;
        self.store.save(&self.settings)?;
        info!(native_language, target_language, level, "user created");
        Ok(())
    }

    pub fn update(&mut self, update: SettingsUpdate) -> Result<(), SettingsError> {
        let s = &mut self.settings;
        if let Some(n) = update.words_per_day {
            s.words_per_day = n.clamp(WORDS_PER_DAY_RANGE.0, WORDS_PER_DAY_RANGE.1);
        }
        if let Some(n) = update.flashcard_delay {
            s.flashcard_delay = n.clamp(FLASHCARD_DELAY_RANGE.0, FLASHCARD_DELAY_RANGE.1);
        }
        if let Some(n) = update.test_word_count {
            s.test_word_count = n.clamp(TEST_WORD_COUNT_RANGE.0, TEST_WORD_COUNT_RANGE.1);
        }
        if let Some(n) = update.min_practice_count {
            s.min_practice_count = n.max(1);
        }
        if let Some(n) = update.min_success_rate {
            s.min_success_rate = n.min(100);
        }
        if let Some(topics) = update.topics {
            s.topics = topics;
        }
        if let Some(flag) = update.include_phrases {
            s.include_phrases = flag;
        }
        if let Some(level) = update.level {
            s.level = Some(level);
        }
        self.store.save(&self.settings)
    }
}
