//! Boundary to the text-generation service that writes new vocabulary entries
//! and judges free-form translations.

pub mod openai;

pub use openai::{ClientConfig, OpenAiClient};

use crate::config::UserSettings;
use crate::error::GenerationError;
use crate::vocabulary::WordCandidate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const WORDS_PER_REQUEST: usize = 15;
pub const GENERATION_TEMPERATURE: f32 = 0.7;
pub const GENERATION_MAX_TOKENS: u32 = 5000;
const CUSTOM_TOPIC: &str = "custom";

const WORDS_SYSTEM_PROMPT: &str = "You are a language learning assistant. Generate vocabulary items in the requested format.
Each item should include:
- word: the word in the target language
- translation: the word in the native language
- example: a natural example sentence
- example_translation: translation of the example sentence
- topic: the topic category (optional)
- level: the CEFR level (optional)
- sentence_to_fill: a different example sentence with a blank where the word should go
- sentence_to_fill_translation: translation of the sentence_to_fill with the word included
- options: list of 4 words (including the correct answer) that could fit grammatically
- correct_answer: the correct word (same as 'word')

Focus on practical, commonly used vocabulary appropriate for the specified level.
The sentence_to_fill should be different from the example sentence.
The options should be grammatically valid but only one should make sense in context.
Do not repeat words that are in the exclude list.
Reply with a JSON object of the form {\"words\": [...]}.";

const JUDGE_SYSTEM_PROMPT: &str = "You are a language teacher checking a student's translation.
Accept translations that convey the meaning naturally even if the wording differs from a reference.
Reply with a JSON object of the form {\"is_correct\": true|false, \"comment\": \"short feedback\"}.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One structured completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// The external collaborator. Implementations return the raw JSON text of
/// the reply; parsing and validation happen in `WordGenerator`.
pub trait Collaborator {
    fn complete(&self, request: &ChatRequest) -> Result<String, GenerationError>;
}

/// What to ask for when generating vocabulary
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub native_language: String,
    pub target_language: String,
    pub level: String,
    pub topics: Vec<String>,
    pub include_phrases: bool,
    pub exclude: Vec<String>,
    /// Ask for exactly this word instead of a fresh batch
    pub custom_word: Option<String>,
}

impl GenerationRequest {
    /// Batch request from the user's preferences, excluding words already
    /// in the table plus any extra exclusions.
    pub fn from_settings(
        settings: &UserSettings,
        existing_words: impl IntoIterator<Item = String>,
        extra_exclusions: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            native_language: settings.native_language.clone().unwrap_or_default(),
            target_language: settings.target_language.clone().unwrap_or_default(),
            level: settings.level.clone().unwrap_or_default(),
            topics: settings.topics.iter().cloned().collect(),
            include_phrases: settings.include_phrases,
            exclude: existing_words.into_iter().chain(extra_exclusions).collect(),
            custom_word: None,
        }
    }

    /// Details for one word the user typed in
    pub fn for_word(settings: &UserSettings, word: &str) -> Self {
        Self {
            topics: vec![CUSTOM_TOPIC.to_string()],
            include_phrases: false,
            exclude: Vec::new(),
            custom_word: Some(word.to_string()),
            ..Self::from_settings(settings, Vec::new(), Vec::new())
        }
    }

    pub fn wanted(&self) -> usize {
        if self.custom_word.is_some() {
            1
        } else {
            WORDS_PER_REQUEST
        }
    }

    pub fn to_chat(&self) -> ChatRequest {
        let mut prompt = match &self.custom_word {
            Some(word) => format!(
                "Generate exactly 1 vocabulary item for the word \"{word}\":\n\
                 - From {} to {}\n\
                 - Level: {}\n\
                 - Topics: {}\n",
                self.native_language,
                self.target_language,
                self.level,
                self.topics.join(", "),
            ),
            None => format!(
                "Generate {} words/phrases for language learning:\n\
                 - From {} to {}\n\
                 - Level: {}\n\
                 - Topics: {}\n\
                 - Include phrases: {}\n",
                WORDS_PER_REQUEST,
                self.native_language,
                self.target_language,
                self.level,
                self.topics.join(", "),
                self.include_phrases,
            ),
        };
        if !self.exclude.is_empty() {
            prompt.push_str(&format!("\nExclude these words: {}", self.exclude.join(", ")));
        }
        ChatRequest {
            messages: vec![ChatMessage::system(WORDS_SYSTEM_PROMPT), ChatMessage::user(prompt)],
            temperature: Some(GENERATION_TEMPERATURE),
            max_tokens: Some(GENERATION_MAX_TOKENS),
        }
    }
}

/// Verdict on a free-form translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationJudgment {
    pub is_correct: bool,
    pub comment: String,
}

/// A sentence the learner translated, with the language pair
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationAttempt {
    /// Sentence shown to the learner, in the native language
    pub original: String,
    /// What the learner wrote, in the target language
    pub translation: String,
    pub native_language: String,
    pub target_language: String,
}

impl TranslationAttempt {
    pub fn to_chat(&self) -> ChatRequest {
        let prompt = format!(
            "Original sentence ({}): {}\nStudent translation ({}): {}\nIs the translation correct?",
            self.native_language, self.original, self.target_language, self.translation
        );
        ChatRequest {
            messages: vec![ChatMessage::system(JUDGE_SYSTEM_PROMPT), ChatMessage::user(prompt)],
            temperature: Some(0.0),
            max_tokens: Some(500),
        }
    }
}

#[derive(Deserialize)]
struct WordsReply {
    words: Vec<WordCandidate>,
}

pub struct WordGenerator<C: Collaborator> {
    collaborator: C,
}

impl<C: Collaborator> WordGenerator<C> {
    pub fn new(collaborator: C) -> Self {
        Self { collaborator }
    }

    /// Ask for new entries. The reply must parse into complete candidates;
    /// a custom-word request yields exactly the requested word.
    pub fn generate_words(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<WordCandidate>, GenerationError> {
        let raw = self.collaborator.complete(&request.to_chat())?;
        let reply: WordsReply = serde_json::from_str(&raw)?;
        let mut words = reply.words;
        if words.is_empty() {
            return Err(GenerationError::Empty);
        }
        if let Some(custom) = &request.custom_word {
            words.truncate(1);
            debug!(requested = %custom, returned = %words[0].word, "custom word generated");
        }
        info!(count = words.len(), "words generated");
        Ok(words)
    }

    pub fn check_translation(
        &self,
        attempt: &TranslationAttempt,
    ) -> Result<TranslationJudgment, GenerationError> {
        let raw = self.collaborator.complete(&attempt.to_chat())?;
        let judgment: TranslationJudgment = serde_json::from_str(&raw)?;
        debug!(is_correct = judgment.is_correct, "translation judged");
        Ok(judgment)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;

    /// Replays canned replies and remembers what it was asked
    #[derive(Default)]
    pub struct ScriptedCollaborator {
        pub replies: Mutex<Vec<Result<String, GenerationError>>>,
        pub seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedCollaborator {
        pub fn replying(reply: &str) -> Self {
            Self {
                replies: Mutex::new(vec![Ok(reply.to_string())]),
                seen: Mutex::default(),
            }
        }
    }

    impl Collaborator for ScriptedCollaborator {
        fn complete(&self, request: &ChatRequest) -> Result<String, GenerationError> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(GenerationError::Empty))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::ScriptedCollaborator;
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::BTreeSet;

    const TWO_WORDS: &str = r#"{"words": [
        {"word": "chat", "translation": "cat", "example": "Le chat dort.",
         "example_translation": "The cat sleeps.", "topic": "animals", "level": "A1",
         "sentence_to_fill": "Le ___ mange.", "sentence_to_fill_translation": "The cat eats.",
         "options": ["chat", "chien", "pain", "eau"], "correct_answer": "chat"},
        {"word": "chien", "translation": "dog", "example": "Le chien court.",
         "example_translation": "The dog runs.",
         "sentence_to_fill": "Le ___ aboie.", "sentence_to_fill_translation": "The dog barks.",
         "options": ["chien", "chat", "pain", "eau"], "correct_answer": "chien"}
    ]}"#;

    fn settings() -> UserSettings {
        UserSettings {
            native_language: Some("English".into()),
            target_language: Some("French".into()),
            level: Some("A1".into()),
            topics: BTreeSet::from(["animals".to_string(), "food".to_string()]),
            ..Default::default()
        }
    }

    #[test]
    fn request_excludes_existing_and_extra_words() {
        let request = GenerationRequest::from_settings(
            &settings(),
            vec!["chat".to_string()],
            vec!["pain".to_string()],
        );
        assert_eq!(request.exclude, vec!["chat", "pain"]);
        let chat = request.to_chat();
        let user = &chat.messages[1].content;
        assert!(user.contains("From English to French"));
        assert!(user.contains("Topics: animals, food"));
        assert!(user.contains("Include phrases: true"));
        assert!(user.contains("Exclude these words: chat, pain"));
        assert_eq!(chat.max_tokens, Some(GENERATION_MAX_TOKENS));
    }

    #[test]
    fn custom_word_request_is_single_and_custom_topic() {
        let request = GenerationRequest::for_word(&settings(), "fromage");
        assert_eq!(request.wanted(), 1);
        assert_eq!(request.topics, vec!["custom"]);
        assert!(!request.include_phrases);
        assert!(request.to_chat().messages[1].content.contains("\"fromage\""));
    }

    #[test]
    fn generate_words_parses_reply() {
        let generator = WordGenerator::new(ScriptedCollaborator::replying(TWO_WORDS));
        let request = GenerationRequest::from_settings(&settings(), Vec::new(), Vec::new());
        let words = generator.generate_words(&request).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].topic, None);
    }

    #[test]
    fn custom_word_keeps_first_candidate() {
        let generator = WordGenerator::new(ScriptedCollaborator::replying(TWO_WORDS));
        let words = generator
            .generate_words(&GenerationRequest::for_word(&settings(), "chat"))
            .unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].word, "chat");
    }

    #[test]
    fn incomplete_reply_is_malformed() {
        let generator = WordGenerator::new(ScriptedCollaborator::replying(
            r#"{"words": [{"word": "chat", "translation": "cat"}]}"#,
        ));
        let request = GenerationRequest::from_settings(&settings(), Vec::new(), Vec::new());
        assert_matches!(generator.generate_words(&request), Err(GenerationError::Malformed(_)));
    }

    #[test]
    fn empty_reply_is_an_error() {
        let generator = WordGenerator::new(ScriptedCollaborator::replying(r#"{"words": []}"#));
        let request = GenerationRequest::from_settings(&settings(), Vec::new(), Vec::new());
        assert_matches!(generator.generate_words(&request), Err(GenerationError::Empty));
    }

    #[test]
    fn collaborator_errors_pass_through() {
        let generator = WordGenerator::new(ScriptedCollaborator {
            replies: std::sync::Mutex::new(vec![Err(GenerationError::MissingCredential)]),
            ..Default::default()
        });
        let request = GenerationRequest::from_settings(&settings(), Vec::new(), Vec::new());
        assert_matches!(
            generator.generate_words(&request),
            Err(GenerationError::MissingCredential)
        );
    }

    #[test]
    fn translation_check_parses_judgment() {
        let collaborator =
            ScriptedCollaborator::replying(
                r#"{"is_correct": true, "comment": "Natural phrasing."}"#,
            );
        let generator = WordGenerator::new(collaborator);
        let attempt = TranslationAttempt {
            original: "The cat sleeps.".into(),
            translation: "Le chat dort.".into(),
            native_language: "English".into(),
            target_language: "French".into(),
        };
        let judgment = generator.check_translation(&attempt).unwrap();
        assert!(judgment.is_correct);
        assert_eq!(judgment.comment, "Natural phrasing.");
    }

    #[test]
    fn translation_check_rejects_wrong_shape() {
        let generator = WordGenerator::new(ScriptedCollaborator::replying(r#"{"verdict": "yes"}"#));
        let attempt = TranslationAttempt {
            original: "a".into(),
            translation: "b".into(),
            native_language: "English".into(),
            target_language: "French".into(),
        };
        assert_matches!(generator.check_translation(&attempt), Err(GenerationError::Malformed(_)));
    }
}
