// cmdmate_core/tests/dispatcher_tests.rs
// End-to-end behaviour of the interpretation pipeline against temp directories

use std::fs;

use cmdmate_core::config::HostConfig;
use cmdmate_core::{
    is_failure, BuiltinTable, Classifier, CwdTracker, Dispatcher, HistoryStore, Segment, Session,
};

fn setup() -> (tempfile::TempDir, Dispatcher, Session) {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::ephemeral(dir.path());
    (dir, Dispatcher::default(), session)
}

#[tokio::test]
async fn test_single_segment_gives_one_result_and_one_entry() {
    let (_dir, dispatcher, mut session) = setup();
    let out = dispatcher.interpret(&mut session, "echo hello world").await;

    assert_eq!(out, "hello world");
    assert_eq!(Dispatcher::get_history(&session), vec!["echo hello world"]);
}

#[tokio::test]
async fn test_failed_segment_stops_chain() {
    let (dir, dispatcher, mut session) = setup();
    let out = dispatcher
        .interpret(&mut session, "mkdir first && cd nowhere && mkdir second")
        .await;

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "Created directory: first");
    assert!(is_failure(lines[1]));
    assert_eq!(lines.len(), 2);
    assert!(dir.path().join("first").is_dir());
    assert!(!dir.path().join("second").exists());
}

#[tokio::test]
async fn test_failed_cd_keeps_working_directory() {
    let (dir, dispatcher, mut session) = setup();
    fs::write(dir.path().join("plain.txt"), "x").unwrap();
    let before = session.cwd.get_cwd().to_path_buf();

    assert!(is_failure(&dispatcher.interpret(&mut session, "cd plain.txt").await));
    assert!(is_failure(&dispatcher.interpret(&mut session, "cd ghost").await));
    assert_eq!(session.cwd.get_cwd(), before);
}

#[test]
fn test_classification_is_a_function_of_text() {
    let table = BuiltinTable::default();
    let classifier = Classifier::new(table.names());
    let other = Classifier::new(table.names());

    for text in ["ls -la", "show memory", "git log --oneline", "memory", "move a.txt to b"] {
        let segment = Segment::new(text);
        assert_eq!(classifier.classify(&segment), other.classify(&segment));
    }
}

#[tokio::test]
async fn test_create_folder_then_list() {
    let (_dir, dispatcher, mut session) = setup();
    dispatcher.interpret(&mut session, "create folder x").await;

    let listing = dispatcher.interpret(&mut session, "ls").await;
    assert!(listing.contains("x"));
}

#[tokio::test]
async fn test_create_file_then_read() {
    let (_dir, dispatcher, mut session) = setup();
    dispatcher
        .interpret(&mut session, "create file a.txt with hello")
        .await;

    let content = dispatcher.interpret(&mut session, "read a.txt").await;
    assert!(content.contains("hello"));
}

#[tokio::test]
async fn test_history_skips_consecutive_duplicates() {
    let (_dir, dispatcher, mut session) = setup();
    dispatcher.interpret(&mut session, "pwd").await;
    dispatcher.interpret(&mut session, "pwd").await;
    assert_eq!(Dispatcher::get_history(&session), vec!["pwd"]);

    dispatcher.interpret(&mut session, "echo hi").await;
    dispatcher.interpret(&mut session, "pwd").await;
    assert_eq!(Dispatcher::get_history(&session), vec!["pwd", "echo hi", "pwd"]);
}

#[tokio::test]
async fn test_natural_language_create_equals_mkdir() {
    let (nl_dir, dispatcher, mut nl_session) = setup();
    let (cmd_dir, _, mut cmd_session) = setup();

    dispatcher.interpret(&mut nl_session, "create folder reports").await;
    dispatcher.interpret(&mut cmd_session, "mkdir reports").await;

    assert!(nl_dir.path().join("reports").is_dir());
    assert!(cmd_dir.path().join("reports").is_dir());
}

#[tokio::test]
async fn test_natural_language_move_equals_mv() {
    let (nl_dir, dispatcher, mut nl_session) = setup();
    let (cmd_dir, _, mut cmd_session) = setup();
    for dir in [&nl_dir, &cmd_dir] {
        fs::write(dir.path().join("a.txt"), "data").unwrap();
        fs::create_dir(dir.path().join("archive")).unwrap();
    }

    dispatcher.interpret(&mut nl_session, "move a.txt to archive").await;
    dispatcher.interpret(&mut cmd_session, "mv a.txt archive").await;

    for dir in [&nl_dir, &cmd_dir] {
        assert!(!dir.path().join("a.txt").exists());
        assert!(dir.path().join("archive").join("a.txt").is_file());
    }
}

#[tokio::test]
async fn test_unrecognized_request_is_harmless() {
    let (dir, dispatcher, mut session) = setup();
    let out = dispatcher
        .interpret(&mut session, "ai frobnicate the sprocket && echo after")
        .await;

    assert!(out.contains("I don't understand"));
    // suggestion text is not a failure, so the chain continues
    assert!(out.ends_with("after"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_guidance_for_missing_arguments() {
    let (_dir, dispatcher, mut session) = setup();
    let out = dispatcher.interpret(&mut session, "create a new folder").await;
    assert!(out.starts_with("Hint:"), "got {}", out);
    assert!(!is_failure(&out));
}

#[cfg(unix)]
#[tokio::test]
async fn test_host_command_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::ephemeral(dir.path());
    let dispatcher = Dispatcher::new(
        BuiltinTable::default(),
        HostConfig {
            timeout_secs: 1,
            shell: None,
        },
    );

    let started = std::time::Instant::now();
    let out = dispatcher.interpret(&mut session, "sleep 10").await;
    assert_eq!(out, "Error: Command timed out after 1s");
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}

#[tokio::test]
async fn test_history_persists_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let history_path = dir.path().join("state").join("history.json");
    let dispatcher = Dispatcher::default();

    let mut first = Session::new(
        CwdTracker::new(Some(dir.path().to_path_buf())),
        HistoryStore::new_with_path(history_path.clone()),
    );
    dispatcher.interpret(&mut first, "mkdir logs && cd logs").await;
    dispatcher.interpret(&mut first, "exit").await;
    assert!(first.is_closed());

    let second = Session::new(
        CwdTracker::new(Some(dir.path().to_path_buf())),
        HistoryStore::new_with_path(history_path),
    );
    assert_eq!(
        Dispatcher::get_history(&second),
        vec!["mkdir logs", "cd logs", "exit"]
    );
}
