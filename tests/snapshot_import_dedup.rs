mod test_support;

use arise_content::{Category, CategoryImport, ContentRecord, StoreError};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_support::{fresh_store, quiz, temp_dir, titles};

fn one_quiz_snapshot() -> serde_json::Value {
    json!({
        "quizzes": [{
            "title": "T1",
            "grade": "6",
            "subject": "Math",
            "questions": [{ "question": "2+2?", "options": ["3", "4"], "answer": "4" }]
        }]
    })
}

#[test]
fn reimporting_the_same_snapshot_adds_nothing() {
    let store = fresh_store();

    let first = store.import_snapshot(&one_quiz_snapshot()).expect("first import");
    assert_eq!(first.quizzes.inserted, 1);
    assert_eq!(titles(&store, Category::Quiz), vec!["T1"]);

    let second = store.import_snapshot(&one_quiz_snapshot()).expect("second import");
    assert_eq!(
        second.quizzes,
        CategoryImport {
            inserted: 0,
            duplicates: 1,
            malformed: 0
        }
    );
    assert_eq!(store.count(Category::Quiz).expect("count"), 1);
}

#[test]
fn duplicates_within_one_batch_collapse_to_first() {
    let store = fresh_store();
    let snapshot = json!({
        "lessons": [
            { "title": "Cells", "grade": "7", "subject": "Biology", "content": "first" },
            { "title": "Cells", "grade": "7", "subject": "Biology", "content": "second" },
            { "title": "Cells", "grade": "8", "subject": "Biology", "content": "other grade" }
        ]
    });

    let summary = store.import_snapshot(&snapshot).expect("import");
    assert_eq!(summary.lessons.inserted, 2);
    assert_eq!(summary.lessons.duplicates, 1);

    let lessons = store.get_all(Category::Lesson).expect("all");
    assert_eq!(lessons.len(), 2);
    assert_eq!(lessons[0].fields.get("content"), Some(&json!("first")));
    assert_eq!(lessons[1].grade, "8");
}

#[test]
fn existing_rows_block_matching_imports_even_if_added_directly() {
    let store = fresh_store();
    store
        .add(Category::Quiz, &quiz("T1", "Math", "6"))
        .expect("direct add");

    let summary = store.import_snapshot(&one_quiz_snapshot()).expect("import");
    assert_eq!(summary.quizzes.inserted, 0);
    assert_eq!(store.count(Category::Quiz).expect("count"), 1);
}

#[test]
fn malformed_records_are_dropped_and_counted() {
    let store = fresh_store();
    let snapshot = json!({
        "games": [
            { "title": "Word Hunt", "grade": "5" },
            { "grade": "5", "subject": "English" },
            { "title": "Word Hunt", "subject": "English" },
            { "title": "", "grade": "5", "subject": "English" },
            "not even an object",
            { "title": "Word Hunt", "grade": "5", "subject": "English", "level": 3 }
        ]
    });

    let summary = store.import_snapshot(&snapshot).expect("import");
    assert_eq!(
        summary.games,
        CategoryImport {
            inserted: 1,
            duplicates: 0,
            malformed: 5
        }
    );
    assert_eq!(summary.skipped(), 5);

    let games = store.get_all(Category::Game).expect("all");
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].fields.get("level"), Some(&json!(3)));
}

#[test]
fn importing_lessons_leaves_other_categories_untouched() {
    let store = fresh_store();
    store.add(Category::Quiz, &quiz("Q", "Math", "6")).expect("quiz");
    store
        .add(Category::Game, &ContentRecord::new("G", "Math", "6"))
        .expect("game");
    let quizzes_before = store.get_all(Category::Quiz).expect("quizzes");
    let games_before = store.get_all(Category::Game).expect("games");

    let summary = store
        .import_snapshot(&json!({
            "lessons": [{ "title": "L", "grade": "6", "subject": "Math" }]
        }))
        .expect("import");

    assert_eq!(summary.lessons.inserted, 1);
    assert_eq!(summary.quizzes, CategoryImport::default());
    assert_eq!(store.get_all(Category::Quiz).expect("quizzes"), quizzes_before);
    assert_eq!(store.get_all(Category::Game).expect("games"), games_before);
}

#[test]
fn incoming_ids_and_timestamps_are_replaced() {
    let store = fresh_store();
    store
        .import_snapshot(&json!({
            "quizzes": [{ "id": 77, "title": "T", "grade": "1", "subject": "S", "updatedAt": "yesterday" }]
        }))
        .expect("import");

    let rec = store.get_all(Category::Quiz).expect("all").remove(0);
    assert_eq!(rec.id, Some(1));
    assert!(rec.updated_at.is_some());
    assert!(rec.fields.is_empty());
}

#[test]
fn invalid_json_fails_before_any_write() {
    let store = fresh_store();
    let text = r#"{ "quizzes": [ { "title": "T1", "grade": "6", "subject": "Math" } "#;

    let e = store.import_snapshot_text(text).expect_err("truncated json");
    assert!(matches!(e, StoreError::Import(_)));
    assert_eq!(e.code(), "import_failed");
    assert_eq!(store.count(Category::Quiz).expect("count"), 0);
}

#[test]
fn non_object_snapshot_is_an_import_error() {
    let store = fresh_store();
    let e = store.import_snapshot_text("[1, 2, 3]").expect_err("array snapshot");
    assert!(matches!(e, StoreError::Import(_)));
}

#[test]
fn non_array_category_is_skipped() {
    let store = fresh_store();
    let summary = store
        .import_snapshot(&json!({
            "quizzes": { "title": "T", "grade": "1", "subject": "S" },
            "games": [{ "title": "G", "grade": "1", "subject": "S" }]
        }))
        .expect("import");
    assert_eq!(summary.quizzes, CategoryImport::default());
    assert_eq!(summary.games.inserted, 1);
    assert_eq!(store.count(Category::Quiz).expect("count"), 0);
}

#[test]
fn pipe_joined_keys_can_collide() {
    // "a|b" + "c" and "a" + "b|c" produce the same key; the second is treated as a duplicate.
    let store = fresh_store();
    let summary = store
        .import_snapshot(&json!({
            "quizzes": [
                { "title": "a|b", "grade": "c", "subject": "d" },
                { "title": "a", "grade": "b|c", "subject": "d" }
            ]
        }))
        .expect("import");
    assert_eq!(summary.quizzes.inserted, 1);
    assert_eq!(summary.quizzes.duplicates, 1);
}

#[test]
fn import_from_file_reads_utf8_json() {
    let dir = temp_dir("arise-import-file");
    let path = dir.path().join("shared.json");
    std::fs::write(&path, one_quiz_snapshot().to_string()).expect("write snapshot");

    let store = fresh_store();
    let summary = store.import_snapshot_file(&path).expect("import file");
    assert_eq!(summary.inserted(), 1);

    let missing = store
        .import_snapshot_file(&dir.path().join("nope.json"))
        .expect_err("missing file");
    assert!(matches!(missing, StoreError::Import(_)));

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, [0xff, 0xfe, 0x00]).expect("write bytes");
    assert!(matches!(
        store.import_snapshot_file(&bad),
        Err(StoreError::Import(_))
    ));
}

#[test]
fn failed_lesson_write_keeps_committed_quizzes() {
    let dir = temp_dir("arise-import-partial");
    let store = arise_content::ContentStore::open(dir.path()).expect("open");

    // A second connection makes every lesson insert fail, as a full disk would.
    let side = rusqlite::Connection::open(dir.path().join(arise_content::db::DB_FILE))
        .expect("side connection");
    side.execute_batch(
        "CREATE TRIGGER reject_lessons BEFORE INSERT ON lessons
         BEGIN SELECT RAISE(ABORT, 'quota'); END;",
    )
    .expect("install trigger");
    drop(side);

    let e = store
        .import_snapshot(&json!({
            "quizzes": [{ "title": "Q1", "grade": "6", "subject": "Math" }],
            "lessons": [{ "title": "L1", "grade": "6", "subject": "Math" }],
            "games": [{ "title": "G1", "grade": "6", "subject": "Math" }]
        }))
        .expect_err("lesson write fails");
    assert!(matches!(e, StoreError::Import(ref m) if m.contains("lessons")));
    assert_eq!(store.count(Category::Quiz).expect("count"), 1);
    assert_eq!(store.count(Category::Lesson).expect("count"), 0);
    assert_eq!(store.count(Category::Game).expect("count"), 0);
}

#[test]
fn numeric_labels_count_as_malformed() {
    // Labels are text; a JSON number is not converted.
    let store = fresh_store();
    let summary = store
        .import_snapshot(&json!({
            "quizzes": [
                { "title": "T1", "grade": 6, "subject": "Math" },
                { "title": "T1", "grade": "6", "subject": "Math" }
            ]
        }))
        .expect("import");
    assert_eq!(
        summary.quizzes,
        CategoryImport {
            inserted: 1,
            duplicates: 0,
            malformed: 1
        }
    );
    assert_eq!(
        store.get_all(Category::Quiz).expect("all")[0].grade,
        "6"
    );
}
