use assert_matches::assert_matches;
use polyglot::vocabulary::{LoadOutcome, VocabularyStore, WordCandidate};
use polyglot::StoreError;
use tempfile::tempdir;

fn candidate(word: &str, answer_first: bool) -> WordCandidate {
    let mut options = vec![
        "quelque chose, \"cité\"".to_string(),
        "l'autre".to_string(),
        "ça".to_string(),
    ];
    if answer_first {
        options.insert(0, word.to_string());
    } else {
        options.push(word.to_string());
    }
    WordCandidate {
        word: word.to_string(),
        translation: format!("{word} (en)"),
        example: format!("Voici {word}, n'est-ce pas ?"),
        example_translation: format!("Here is {word}, isn't it?"),
        topic: None,
        level: Some("B2".to_string()),
        sentence_to_fill: "Voici ___.".to_string(),
        sentence_to_fill_translation: format!("Here is {word}."),
        options,
        correct_answer: word.to_string(),
    }
}

#[test]
fn counters_and_options_survive_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vocabulary.csv");

    let (mut store, outcome) = VocabularyStore::open(&path);
    assert_eq!(outcome, LoadOutcome::Missing);
    store
        .append(vec![
            candidate("bonjour", true),
            candidate("à bientôt", false),
            candidate("d'accord", true),
        ])
        .unwrap();

    for correct in [true, false, true, true] {
        store.record_attempt("bonjour", correct).unwrap();
    }
    store.record_attempt("d'accord", false).unwrap();
    store.mark_viewed("à bientôt").unwrap();

    let (reloaded, outcome) = VocabularyStore::open(&path);
    assert_eq!(outcome, LoadOutcome::Loaded);
    assert_eq!(reloaded.len(), 3);
    for original in store.entries() {
        let loaded = reloaded.get(&original.word).unwrap();
        assert_eq!(loaded.times_practiced, original.times_practiced);
        assert_eq!(loaded.correct_answers, original.correct_answers);
        assert_eq!(loaded.options, original.options);
        assert_eq!(loaded.correct_answer, original.correct_answer);
        assert_eq!(loaded.viewed, original.viewed);
        assert_eq!(loaded.last_practiced, original.last_practiced);
        assert!(loaded.correct_answers <= loaded.times_practiced);
    }

    let bonjour = reloaded.get("bonjour").unwrap();
    assert_eq!((bonjour.times_practiced, bonjour.correct_answers), (4, 3));
}

#[test]
fn rejected_batch_leaves_file_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vocabulary.csv");
    let (mut store, _) = VocabularyStore::open(&path);
    store.append(vec![candidate("bonjour", true)]).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let mut three_options = candidate("merci", true);
    three_options.options.truncate(3);
    assert_matches!(
        store.append(vec![three_options]),
        Err(StoreError::Validation { word, .. }) if word == "merci"
    );

    assert_eq!(store.len(), 1);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn every_mutation_is_persisted_immediately() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vocabulary.csv");
    let (mut store, _) = VocabularyStore::open(&path);
    store.append(vec![candidate("chat", true), candidate("chien", true)]).unwrap();

    store.record_attempt("chat", true).unwrap();
    let (snapshot, _) = VocabularyStore::open(&path);
    assert_eq!(snapshot.get("chat").unwrap().times_practiced, 1);

    assert!(store.delete("chien").unwrap());
    let (snapshot, _) = VocabularyStore::open(&path);
    assert!(snapshot.get("chien").is_none());

    store.mark_skipped("chat").unwrap();
    let (snapshot, _) = VocabularyStore::open(&path);
    let chat = snapshot.get("chat").unwrap();
    assert_eq!(chat.times_practiced, 1);
    assert_eq!(chat.last_practiced, store.get("chat").unwrap().last_practiced);
}

#[test]
fn garbage_file_recovers_to_empty_and_is_rewritten() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vocabulary.csv");
    std::fs::write(&path, "\u{0}\u{1}not,a\nvocabulary\"file").unwrap();

    let (mut store, outcome) = VocabularyStore::open(&path);
    assert_matches!(outcome, LoadOutcome::Reset(_));
    assert!(store.is_empty());

    store.append(vec![candidate("chat", true)]).unwrap();
    let (reloaded, outcome) = VocabularyStore::open(&path);
    assert_eq!(outcome, LoadOutcome::Loaded);
    assert_eq!(reloaded.words(), vec!["chat"]);
}
