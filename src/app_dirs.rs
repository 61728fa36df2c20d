use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.polyglot`, or the platform data dir when HOME is unset
    pub fn data_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".polyglot"))
        } else {
            ProjectDirs::from("", "", "polyglot")
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn vocabulary_path() -> Option<PathBuf> {
        Self::data_dir().map(|dir| dir.join("vocabulary.csv"))
    }

    pub fn settings_path() -> Option<PathBuf> {
        Self::data_dir().map(|dir| dir.join("user_settings.json"))
    }

    pub fn log_dir() -> Option<PathBuf> {
        Self::data_dir().map(|dir| dir.join("logs"))
    }
}
