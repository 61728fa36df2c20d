// Library surface shared by the binary and the integration tests.
pub mod app_dirs;
pub mod checker;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod progress;
pub mod report;
pub mod selection;
pub mod util;
pub mod vocabulary;

pub use error::{GenerationError, SettingsError, StoreError};
pub use progress::{LearningStatus, LearningThresholds};
pub use vocabulary::{VocabularyEntry, VocabularyStore, WordCandidate};
