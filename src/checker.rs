//! Translation checks run off the interaction thread. Workers only send
//! outcomes; the thread that owns the store applies them through `CheckInbox`.

use crate::error::{GenerationError, StoreError};
use crate::generator::{Collaborator, TranslationAttempt, TranslationJudgment, WordGenerator};
use crate::vocabulary::VocabularyStore;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Result of one background check, tagged with the word it belongs to
#[derive(Debug)]
pub struct CheckOutcome {
    pub word: String,
    pub result: Result<TranslationJudgment, GenerationError>,
}

/// What applying an outcome did to the store
#[derive(Debug)]
pub enum AppliedCheck {
    /// Attempt recorded
    Judged { word: String, judgment: TranslationJudgment },
    /// The service failed; nothing recorded
    Failed { word: String, error: GenerationError },
    /// The word left the table while the check was in flight
    Orphaned { word: String, judgment: TranslationJudgment },
}

/// Hands translation checks to worker threads
pub struct TranslationChecker<C: Collaborator + Send + Sync + 'static> {
    generator: Arc<WordGenerator<C>>,
    tx: Sender<CheckOutcome>,
}

impl<C: Collaborator + Send + Sync + 'static> TranslationChecker<C> {
    /// Build a checker and the single consumer for its results
    pub fn new(generator: WordGenerator<C>) -> (Self, CheckInbox) {
        let (tx, rx) = mpsc::channel();
        let checker = Self {
            generator: Arc::new(generator),
            tx,
        };
        (checker, CheckInbox { rx })
    }

    /// Start checking `attempt` for `word`. There is no cancellation; if the
    /// inbox is gone when the check finishes the outcome is dropped.
    pub fn spawn(&self, word: &str, attempt: TranslationAttempt) -> JoinHandle<()> {
        let generator = Arc::clone(&self.generator);
        let tx = self.tx.clone();
        let word = word.to_string();
        thread::spawn(move || {
            let result = generator.check_translation(&attempt);
            if tx.send(CheckOutcome { word, result }).is_err() {
                debug!("check finished after its inbox closed; result discarded");
            }
        })
    }
}

/// Receiving end of the checker; the only path from a check into the store
pub struct CheckInbox {
    rx: Receiver<CheckOutcome>,
}

impl CheckInbox {
    /// Apply every outcome that has already arrived
    pub fn try_apply(&self, store: &mut VocabularyStore) -> Result<Vec<AppliedCheck>, StoreError> {
        let mut applied = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            applied.push(apply(outcome, store)?);
        }
        Ok(applied)
    }

    /// Wait up to `timeout` for the next outcome and apply it
    pub fn apply_next(
        &self,
        store: &mut VocabularyStore,
        timeout: Duration,
    ) -> Result<Option<AppliedCheck>, StoreError> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => apply(outcome, store).map(Some),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Ok(None),
        }
    }
}

fn apply(outcome: CheckOutcome, store: &mut VocabularyStore) -> Result<AppliedCheck, StoreError> {
    let CheckOutcome { word, result } = outcome;
    match result {
        Ok(judgment) => match store.record_attempt(&word, judgment.is_correct) {
            Ok(()) => Ok(AppliedCheck::Judged { word, judgment }),
            Err(StoreError::NotFound(_)) => {
                warn!(%word, "translation judged for a word no longer in the table");
                Ok(AppliedCheck::Orphaned { word, judgment })
            }
            Err(e) => Err(e),
        },
        Err(error) => {
            warn!(%word, %error, "translation check failed");
            Ok(AppliedCheck::Failed { word, error })
        }
    }
}
