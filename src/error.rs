use thiserror::Error;

/// Failures raised by the vocabulary store's named operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid entry '{word}': {reason}")]
    Validation { word: String, reason: String },

    #[error("word not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(Box<csv::Error>),
}

impl From<csv::Error> for StoreError {
    fn from(error: csv::Error) -> Self {
        StoreError::Csv(Box::new(error))
    }
}

/// Unusable answers from the text-generation collaborator.
/// None of these are retried by the library.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("API key not configured")]
    MissingCredential,

    #[error("HTTP error: {0}")]
    Http(Box<reqwest::Error>),

    #[error("generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("generation service returned no entries")]
    Empty,
}

impl From<reqwest::Error> for GenerationError {
    fn from(error: reqwest::Error) -> Self {
        GenerationError::Http(Box::new(error))
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(error: serde_json::Error) -> Self {
        GenerationError::Malformed(error.to_string())
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
