use clap::{ArgGroup, Args, Parser, Subcommand};
use polyglot::{
    checker::{AppliedCheck, TranslationChecker},
    config::{FileSettingsStore, SettingsUpdate, UserProfile},
    generator::{ClientConfig, GenerationRequest, OpenAiClient, TranslationAttempt, WordGenerator},
    logging,
    progress::{progress_report, summary_counts},
    report,
    selection::{
        grade_answer, multiple_choice_options, AnswerKind, DailySelector, FlashcardSelector,
        TestSelector, TranslationSelector, WordSelector,
    },
    vocabulary::{store::DEFAULT_MIN_UNPRACTICED, LoadOutcome, VocabularyStore, OPTION_COUNT},
    StoreError, VocabularyEntry,
};
use std::{error::Error, time::Duration};

const CHECK_TIMEOUT: Duration = Duration::from_secs(120);

/// vocabulary trainer: pick what to practice next and track how it is going
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// create the learner profile
    Init {
        #[clap(long)]
        native: String,
        #[clap(long)]
        target: String,
        #[clap(long)]
        level: String,
        /// topic of interest, repeatable
        #[clap(long = "topic")]
        topics: Vec<String>,
        /// only single words, no phrases
        #[clap(long)]
        no_phrases: bool,
    },
    /// show or change settings
    Settings(SettingsArgs),
    /// ask the generation service for a batch of new words
    Generate {
        /// word to keep out of the batch, repeatable
        #[clap(long)]
        exclude: Vec<String>,
    },
    /// generate details for one word and add it
    Add { word: String },
    /// today's words
    Daily(CountArg),
    /// words not yet shown as flashcards
    Flashcards(CountArg),
    /// multiple-choice questions, or gap sentences with --sentence
    Test(TestArgs),
    /// sentences for free translation practice
    Translate(CountArg),
    /// mark a word as shown on a flashcard
    Viewed { word: String },
    /// record a practice attempt, either graded from --answer or given outright
    Record(RecordArgs),
    /// "I don't know": refresh recency without counting an attempt
    Skip { word: String },
    /// remove a word
    Delete { word: String },
    /// have a free translation of the word's example sentence judged
    Check { word: String, translation: String },
    /// per-word progress table
    Progress,
    /// totals
    Status,
}

#[derive(Args, Debug)]
struct CountArg {
    /// number of words, defaults to the configured amount
    #[clap(short = 'n', long)]
    count: Option<usize>,
}

#[derive(Args, Debug)]
struct TestArgs {
    #[clap(flatten)]
    count: CountArg,
    /// fill-the-gap sentences instead of word questions
    #[clap(long)]
    sentence: bool,
}

#[derive(Args, Debug)]
#[clap(group(ArgGroup::new("outcome").required(true).args(["correct", "wrong", "answer"])))]
struct RecordArgs {
    word: String,
    #[clap(long)]
    correct: bool,
    #[clap(long)]
    wrong: bool,
    /// the learner's answer, graded before it is recorded
    #[clap(long)]
    answer: Option<String>,
    /// grade --answer against the gap sentence rather than the word
    #[clap(long, requires = "answer")]
    sentence: bool,
}

#[derive(Args, Debug)]
struct SettingsArgs {
    #[clap(long)]
    words_per_day: Option<usize>,
    /// seconds before a flashcard flips
    #[clap(long)]
    flashcard_delay: Option<u64>,
    #[clap(long)]
    test_word_count: Option<usize>,
    #[clap(long)]
    min_practice: Option<u32>,
    /// percent
    #[clap(long)]
    min_success: Option<u32>,
}

impl From<SettingsArgs> for SettingsUpdate {
    fn from(args: SettingsArgs) -> Self {
        SettingsUpdate {
            words_per_day: args.words_per_day,
            flashcard_delay: args.flashcard_delay,
            test_word_count: args.test_word_count,
            min_practice_count: args.min_practice,
            min_success_rate: args.min_success,
            ..Default::default()
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _log_guard = logging::init_tracing();

    let mut profile = UserProfile::load(FileSettingsStore::new());
    let (mut store, outcome) = VocabularyStore::open_default();
    if let LoadOutcome::Reset(reason) = &outcome {
        eprintln!("vocabulary file was unreadable ({reason}); starting with an empty list");
    }

    let settings = profile.settings().clone();
    let thresholds = settings.thresholds();
    let mut rng = rand::thread_rng();

    match cli.command {
        Command::Init {
            native,
            target,
            level,
            topics,
            no_phrases,
        } => {
            profile.create_user(&native, &target, &level, topics, !no_phrases)?;
            println!("Profile created: {native} -> {target}, level {level}");
        }
        Command::Settings(args) => {
            profile.update(args.into())?;
            println!("{}", serde_json::to_string_pretty(profile.settings())?);
        }
        Command::Generate { exclude } => {
            let generator = WordGenerator::new(OpenAiClient::new(ClientConfig::from_env()));
            let request = GenerationRequest::from_settings(&settings, store.words(), exclude);
            let words = generator.generate_words(&request)?;
            let added = store.append(words)?;
            println!("Added {added} new words");
        }
        Command::Add { word } => {
            let generator = WordGenerator::new(OpenAiClient::new(ClientConfig::from_env()));
            let request = GenerationRequest::for_word(&settings, &word);
            let words = generator.generate_words(&request)?;
            match store.append(words)? {
                0 => println!("'{word}' is already in the list"),
                _ => println!("Added '{word}'"),
            }
        }
        Command::Daily(arg) => {
            let selector = DailySelector { thresholds };
            let count = arg.count.unwrap_or(settings.words_per_day);
            let words = selector.select(store.entries(), count, &mut rng);
            println!("{}", report::entry_lines(&words));
            if store.needs_new_words(DEFAULT_MIN_UNPRACTICED) {
                eprintln!("Running low on new words; try `polyglot generate`");
            }
        }
        Command::Flashcards(arg) => {
            let count = arg.count.unwrap_or(settings.words_per_day);
            let words = FlashcardSelector.select(store.entries(), count, &mut rng);
            print_or_hint(&words, "No new flashcards; generate more words first.");
        }
        Command::Test(args) => {
            let count = args.count.count.unwrap_or(settings.test_word_count);
            let words = TestSelector.select(store.entries(), count, &mut rng);
            if words.is_empty() {
                println!("No words available for testing yet! Review some flashcards first.");
            }
            let questions = words.iter().filter_map(|entry| {
                if args.sentence {
                    // rows migrated without an answer set cannot be asked as gap sentences
                    (entry.options.len() == OPTION_COUNT)
                        .then(|| (entry.sentence_to_fill.clone(), entry.options.clone()))
                } else {
                    let options = multiple_choice_options(store.entries(), entry, &mut rng);
                    Some((entry.translation.clone(), options))
                }
            });
            for (number, (prompt, options)) in questions.enumerate() {
                println!("{}", report::choice_question(number + 1, &prompt, &options));
            }
        }
        Command::Translate(arg) => {
            let count = arg.count.unwrap_or(5);
            let words = TranslationSelector.select(store.entries(), count, &mut rng);
            print_or_hint(&words, "No words available for translation practice yet!");
        }
        Command::Viewed { word } => report_missing(store.mark_viewed(&word))?,
        Command::Record(args) => {
            let correct = match &args.answer {
                Some(answer) => {
                    let Some(entry) = store.get(&args.word) else {
                        println!("'{}' is not in the list", args.word);
                        return Ok(());
                    };
                    let kind = if args.sentence {
                        AnswerKind::Sentence
                    } else {
                        AnswerKind::Word
                    };
                    let correct = grade_answer(entry, kind, answer);
                    let expected = match kind {
                        AnswerKind::Word => &entry.word,
                        AnswerKind::Sentence => &entry.correct_answer,
                    };
                    if correct {
                        println!("Correct!");
                    } else {
                        println!("Incorrect. The answer is '{expected}'");
                    }
                    correct
                }
                None => args.correct,
            };
            report_missing(store.record_attempt(&args.word, correct))?
        }
        Command::Skip { word } => report_missing(store.mark_skipped(&word))?,
        Command::Delete { word } => {
            if store.delete(&word)? {
                println!("Deleted '{word}'");
            } else {
                println!("'{word}' was not in the list");
            }
        }
        Command::Check { word, translation } => {
            let Some(entry) = store.get(&word) else {
                println!("'{word}' is not in the list");
                return Ok(());
            };
            let attempt = TranslationAttempt {
                original: entry.example_translation.clone(),
                translation,
                native_language: settings.native_language.clone().unwrap_or_default(),
                target_language: settings.target_language.clone().unwrap_or_default(),
            };
            let reference = entry.example.clone();
            let client = OpenAiClient::new(ClientConfig::from_env());
            let (checker, inbox) = TranslationChecker::new(WordGenerator::new(client));
            checker.spawn(&word, attempt);
            match inbox.apply_next(&mut store, CHECK_TIMEOUT)? {
                Some(AppliedCheck::Judged { judgment, .. }) if judgment.is_correct => {
                    println!("Correct!\n{}", judgment.comment)
                }
                Some(AppliedCheck::Judged { judgment, .. }) => println!(
                    "Needs improvement\n{}\nReference translation: {reference}",
                    judgment.comment
                ),
                Some(AppliedCheck::Failed { error, .. }) => {
                    println!("Error checking translation: {error}")
                }
                Some(AppliedCheck::Orphaned { word, .. }) => {
                    println!("'{word}' was removed meanwhile")
                }
                None => println!("No answer from the generation service"),
            }
        }
        Command::Progress => {
            println!(
                "A word is learnt after {} practices with a success rate of {}% or higher.\n",
                thresholds.min_practice_count, thresholds.min_success_rate
            );
            let rows = progress_report(store.entries(), &thresholds);
            println!("{}", report::progress_table(&rows));
        }
        Command::Status => {
            let summary = summary_counts(store.entries(), &thresholds);
            println!("{}", report::summary_line(&summary));
        }
    }

    Ok(())
}

fn print_or_hint(words: &[VocabularyEntry], hint: &str) {
    if words.is_empty() {
        println!("{hint}");
    } else {
        println!("{}", report::entry_lines(words));
    }
}

/// Unknown words are reported, not fatal
fn report_missing(result: Result<(), StoreError>) -> Result<(), StoreError> {
    match result {
        Err(StoreError::NotFound(word)) => {
            println!("'{word}' is not in the list");
            Ok(())
        }
        other => other,
    }
}
