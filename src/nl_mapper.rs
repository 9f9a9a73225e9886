//! Plain-language requests mapped onto built-in commands
//!
//! The request is lower-cased and split into tokens. Each intent has its own
//! extraction function. They run in a fixed order
//! (create, transfer, list, delete, read, info, help) and the first one whose
//! keyword group is present decides the outcome. Nothing is remembered
//! between calls.

use std::fmt;

use crate::builtins::BuiltinTable;
use crate::error::render_error;
use crate::fs_ops;
use crate::session::Session;

/// Default body for `create file <name>` without `with ...`
pub const DEFAULT_FILE_CONTENT: &str = "New file created by AI";

/// Request forms listed by `help`
pub const EXAMPLES: &[(&str, &str)] = &[
    ("create folder <name>", "Create a new folder"),
    ("create file <name> [with <text>]", "Create a file, optionally with content"),
    ("move <file> to <folder>", "Move file to folder"),
    ("copy <file> to <folder>", "Copy file to folder"),
    ("show files", "List files"),
    ("show memory", "Display memory usage"),
    ("show processes", "List running processes"),
    ("show cpu", "Display CPU usage"),
    ("show disk", "Display disk usage"),
    ("delete <file>", "Delete a file"),
    ("read <file>", "Read file contents"),
    ("what can you do", "Show available commands"),
];

const CREATE_VERBS: &[&str] = &["create", "make", "new"];
const FOLDER_NOUNS: &[&str] = &["folder", "directory", "dir"];
const TRANSFER_VERBS: &[&str] = &["move", "copy", "transfer"];
const DESTINATION_WORDS: &[&str] = &["to", "into", "in"];
const LIST_VERBS: &[&str] = &["list", "show", "display", "see"];
const FILE_NOUNS: &[&str] = &["files", "file", "directory", "folder", "contents"];
const MEMORY_NOUNS: &[&str] = &["memory", "ram"];
const CPU_NOUNS: &[&str] = &["cpu", "processor"];
const PROCESS_NOUNS: &[&str] = &["processes", "process", "running", "programs"];
const DISK_NOUNS: &[&str] = &["disk", "space", "storage"];
const DELETE_VERBS: &[&str] = &["delete", "remove", "rm"];
const DELETE_STOP_WORDS: &[&str] = &["delete", "remove", "rm", "the", "a", "an"];
const READ_VERBS: &[&str] = &["read", "open", "view", "display"];
const HELP_WORDS: &[&str] = &["help", "commands", "what", "can"];

const TRANSFER_EXTENSIONS: &[&str] = &[".txt", ".py", ".md"];
const TARGET_EXTENSIONS: &[&str] = &[".txt", ".py", ".md", ".json"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateKind {
    Folder,
    File,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferMode {
    Move,
    Copy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListTarget {
    Files,
    Memory,
    Cpu,
    Processes,
    Disk,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InfoKind {
    Memory,
    Cpu,
    Processes,
    Disk,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Create {
        kind: CreateKind,
        name: String,
        content: Option<String>,
    },
    Transfer {
        mode: TransferMode,
        source: String,
        destination: String,
    },
    List(ListTarget),
    Delete(String),
    Read(String),
    Info(InfoKind),
    Help,
    Unrecognized(String),
}

/// A request was understood but an argument is missing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Guidance {
    pub message: &'static str,
    pub example: &'static str,
}

impl Guidance {
    const fn new(message: &'static str, example: &'static str) -> Self {
        Self { message, example }
    }
}

impl fmt::Display for Guidance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hint: {}. Example: '{}'", self.message, self.example)
    }
}

type Extracted = Option<Result<Intent, Guidance>>;

struct Scanner<'a> {
    tokens: &'a [String],
}

impl<'a> Scanner<'a> {
    fn new(tokens: &'a [String]) -> Self {
        Self { tokens }
    }

    fn has_any(&self, words: &[&str]) -> bool {
        self.tokens.iter().any(|t| words.contains(&t.as_str()))
    }

    /// Token right after the first occurrence of any of `words`
    fn after_any(&self, words: &[&str]) -> Option<(usize, &'a str)> {
        self.tokens
            .windows(2)
            .position(|pair| words.contains(&pair[0].as_str()))
            .map(|idx| (idx + 1, self.tokens[idx + 1].as_str()))
    }

    fn with_extension(&self, extensions: &[&str]) -> Option<&'a str> {
        self.tokens
            .iter()
            .map(String::as_str)
            .find(|t| has_extension(t, extensions))
    }

    fn first_not_in(&self, words: &[&str]) -> Option<&'a str> {
        self.tokens
            .iter()
            .map(String::as_str)
            .find(|t| !words.contains(t))
    }

    fn rest_after(&self, idx: usize) -> Option<String> {
        let rest = self.tokens.get(idx..).filter(|r| !r.is_empty())?;
        Some(rest.join(" "))
    }

    fn get(&self, idx: usize) -> Option<&'a str> {
        self.tokens.get(idx).map(String::as_str)
    }

    /// True when any token contains one of `stems`
    fn mentions(&self, stems: &[&str]) -> bool {
        self.tokens.iter().any(|t| stems.iter().any(|s| t.contains(s)))
    }
}

fn has_extension(token: &str, extensions: &[&str]) -> bool {
    extensions.iter().any(|ext| token.ends_with(ext))
}

fn create_intent(s: &Scanner<'_>) -> Extracted {
    if !s.has_any(CREATE_VERBS) {
        return None;
    }

    if s.has_any(FOLDER_NOUNS) {
        return Some(match s.after_any(FOLDER_NOUNS) {
            Some((_, name)) => Ok(Intent::Create {
                kind: CreateKind::Folder,
                name: name.to_string(),
                content: None,
            }),
            None => Err(Guidance::new(
                "Please specify a folder name",
                "create folder my_folder",
            )),
        });
    }

    if s.has_any(&["file"]) {
        return Some(match s.after_any(&["file"]) {
            Some((idx, name)) => {
                let content = match s.get(idx + 1) {
                    Some("with") | Some("containing") => s.rest_after(idx + 2),
                    _ => None,
                };
                Ok(Intent::Create {
                    kind: CreateKind::File,
                    name: name.to_string(),
                    content,
                })
            }
            None => Err(Guidance::new(
                "Please specify a file name",
                "create file test.txt with hello world",
            )),
        });
    }

    None
}

fn transfer_intent(s: &Scanner<'_>) -> Extracted {
    if !s.has_any(TRANSFER_VERBS) {
        return None;
    }

    let source = s.tokens.iter().enumerate().find_map(|(idx, token)| {
        if token == "file" {
            if let Some(next) = s.get(idx + 1) {
                return Some(next);
            }
        }
        has_extension(token, TRANSFER_EXTENSIONS).then_some(token.as_str())
    });
    let destination = s.after_any(DESTINATION_WORDS).map(|(_, dest)| dest);

    let mode = if s.has_any(&["move"]) {
        TransferMode::Move
    } else {
        TransferMode::Copy
    };

    Some(match (source, destination) {
        (Some(source), Some(destination)) => Ok(Intent::Transfer {
            mode,
            source: source.to_string(),
            destination: destination.to_string(),
        }),
        _ => Err(Guidance::new(
            "Please specify file and destination",
            "move file.txt to folder",
        )),
    })
}

fn list_intent(s: &Scanner<'_>) -> Extracted {
    if !s.has_any(LIST_VERBS) {
        return None;
    }

    let target = if s.has_any(FILE_NOUNS) {
        ListTarget::Files
    } else if s.has_any(MEMORY_NOUNS) {
        ListTarget::Memory
    } else if s.has_any(CPU_NOUNS) {
        ListTarget::Cpu
    } else if s.has_any(PROCESS_NOUNS) {
        ListTarget::Processes
    } else if s.has_any(DISK_NOUNS) {
        ListTarget::Disk
    } else {
        ListTarget::Files
    };
    Some(Ok(Intent::List(target)))
}

fn delete_intent(s: &Scanner<'_>) -> Extracted {
    if !s.has_any(DELETE_VERBS) {
        return None;
    }

    let target = s
        .with_extension(TARGET_EXTENSIONS)
        .or_else(|| s.first_not_in(DELETE_STOP_WORDS));

    Some(match target {
        Some(target) => Ok(Intent::Delete(target.to_string())),
        None => Err(Guidance::new(
            "Please specify what to delete",
            "delete file.txt",
        )),
    })
}

fn read_intent(s: &Scanner<'_>) -> Extracted {
    if !s.has_any(READ_VERBS) {
        return None;
    }

    Some(match s.with_extension(TARGET_EXTENSIONS) {
        Some(target) => Ok(Intent::Read(target.to_string())),
        None => Err(Guidance::new("Please specify a file to read", "read file.txt")),
    })
}

fn info_intent(s: &Scanner<'_>) -> Extracted {
    let kind = if s.has_any(MEMORY_NOUNS) {
        InfoKind::Memory
    } else if s.has_any(CPU_NOUNS) {
        InfoKind::Cpu
    } else if s.has_any(PROCESS_NOUNS) {
        InfoKind::Processes
    } else if s.has_any(DISK_NOUNS) {
        InfoKind::Disk
    } else {
        return None;
    };
    Some(Ok(Intent::Info(kind)))
}

fn help_intent(s: &Scanner<'_>) -> Extracted {
    s.has_any(HELP_WORDS).then_some(Ok(Intent::Help))
}

/// Turn a plain-language request into an [`Intent`]
pub fn parse_intent(text: &str) -> Result<Intent, Guidance> {
    let lowered = text.to_lowercase();
    let tokens: Vec<String> = lowered.split_whitespace().map(str::to_string).collect();
    let scanner = Scanner::new(&tokens);

    let extractors: [fn(&Scanner<'_>) -> Extracted; 7] = [
        create_intent,
        transfer_intent,
        list_intent,
        delete_intent,
        read_intent,
        info_intent,
        help_intent,
    ];

    extractors
        .iter()
        .find_map(|extract| extract(&scanner))
        .unwrap_or_else(|| Ok(Intent::Unrecognized(tokens.join(" "))))
}

/// Suggestions for a request nothing matched, based on partial keywords
pub fn suggestions(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    let tokens: Vec<String> = lowered.split_whitespace().map(str::to_string).collect();
    let s = Scanner::new(&tokens);

    let mut out = Vec::new();
    if s.mentions(&["creat", "make"]) {
        out.push("'create folder <name>' or 'create file <name>'");
    }
    if s.mentions(&["move", "copy", "cop"]) {
        out.push("'move <file> to <folder>' or 'copy <file> to <folder>'");
    }
    if s.mentions(&["show", "list"]) {
        out.push("'show files', 'show memory', 'show processes'");
    }
    if s.mentions(&["delet", "remov"]) {
        out.push("'delete <file>'");
    }
    out
}

fn unrecognized_message(query: &str) -> String {
    let hints = suggestions(query);
    let try_text = if hints.is_empty() {
        String::new()
    } else {
        format!(" Try: {}.", hints.join(", "))
    };
    format!(
        "Hint: I don't understand '{}'.{} Available requests: create, move, copy, show, delete, read, and system info.",
        query, try_text
    )
}

/// Carry out an intent through the built-in table
pub fn execute(intent: Intent, table: &BuiltinTable, session: &mut Session) -> String {
    match intent {
        Intent::Create {
            kind: CreateKind::Folder,
            name,
            ..
        } => table.invoke("mkdir", &[name], session),
        Intent::Create {
            kind: CreateKind::File,
            name,
            content,
        } => {
            let content = content.unwrap_or_else(|| DEFAULT_FILE_CONTENT.to_string());
            let path = session.cwd.resolve(&name);
            match fs_ops::write_text_file(&path, &content) {
                Ok(()) => format!("Created file '{}' with content: {}", name, content),
                Err(e) => render_error(e),
            }
        }
        Intent::Transfer {
            mode,
            source,
            destination,
        } => {
            let command = match mode {
                TransferMode::Move => "mv",
                TransferMode::Copy => "cp",
            };
            table.invoke(command, &[source, destination], session)
        }
        Intent::List(target) => {
            let command = match target {
                ListTarget::Files => "ls",
                ListTarget::Memory => "mem",
                ListTarget::Cpu => "cpu",
                ListTarget::Processes => "ps",
                ListTarget::Disk => "df",
            };
            table.invoke::<&str>(command, &[], session)
        }
        Intent::Delete(target) => table.invoke("rm", &[target], session),
        Intent::Read(target) => table.invoke("cat", &[target], session),
        Intent::Info(kind) => {
            let command = match kind {
                InfoKind::Memory => "mem",
                InfoKind::Cpu => "cpu",
                InfoKind::Processes => "ps",
                InfoKind::Disk => "df",
            };
            table.invoke::<&str>(command, &[], session)
        }
        Intent::Help => table.help_text(),
        Intent::Unrecognized(query) => unrecognized_message(&query),
    }
}

/// Parse and carry out a request; missing arguments come back as guidance
pub fn respond(text: &str, table: &BuiltinTable, session: &mut Session) -> String {
    match parse_intent(text) {
        Ok(intent) => {
            tracing::debug!(?intent, "mapped request");
            execute(intent, table, session)
        }
        Err(guidance) => {
            tracing::debug!(%guidance, "request needs more detail");
            guidance.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_failure;
    use std::fs;

    fn intent(text: &str) -> Intent {
        parse_intent(text).unwrap()
    }

    #[test]
    fn test_create_folder() {
        assert_eq!(
            intent("create folder reports"),
            Intent::Create {
                kind: CreateKind::Folder,
                name: "reports".to_string(),
                content: None
            }
        );
        assert_eq!(
            intent("please make a new directory Drafts"),
            Intent::Create {
                kind: CreateKind::Folder,
                name: "drafts".to_string(),
                content: None
            }
        );
        assert!(parse_intent("create folder").is_err());
    }

    #[test]
    fn test_create_file_with_content() {
        assert_eq!(
            intent("create file a.txt with hello world"),
            Intent::Create {
                kind: CreateKind::File,
                name: "a.txt".to_string(),
                content: Some("hello world".to_string())
            }
        );
        assert_eq!(
            intent("make file notes.md"),
            Intent::Create {
                kind: CreateKind::File,
                name: "notes.md".to_string(),
                content: None
            }
        );
        // "with" and nothing after it keeps the default body
        assert_eq!(
            intent("create file a.txt with"),
            Intent::Create {
                kind: CreateKind::File,
                name: "a.txt".to_string(),
                content: None
            }
        );
    }

    #[test]
    fn test_create_without_noun_is_unrecognized() {
        assert!(matches!(intent("create something"), Intent::Unrecognized(_)));
    }

    #[test]
    fn test_transfer_modes_and_sources() {
        assert_eq!(
            intent("move a.txt to archive"),
            Intent::Transfer {
                mode: TransferMode::Move,
                source: "a.txt".to_string(),
                destination: "archive".to_string()
            }
        );
        assert_eq!(
            intent("copy file report into backup"),
            Intent::Transfer {
                mode: TransferMode::Copy,
                source: "report".to_string(),
                destination: "backup".to_string()
            }
        );
        assert_eq!(
            intent("transfer notes.md in docs"),
            Intent::Transfer {
                mode: TransferMode::Copy,
                source: "notes.md".to_string(),
                destination: "docs".to_string()
            }
        );
        let guidance = parse_intent("move it somewhere").unwrap_err();
        assert!(guidance.to_string().starts_with("Hint: Please specify file and destination"));
    }

    #[test]
    fn test_list_priority() {
        assert_eq!(intent("show files"), Intent::List(ListTarget::Files));
        assert_eq!(intent("show memory"), Intent::List(ListTarget::Memory));
        assert_eq!(intent("display cpu"), Intent::List(ListTarget::Cpu));
        assert_eq!(intent("list running programs"), Intent::List(ListTarget::Processes));
        assert_eq!(intent("see disk space"), Intent::List(ListTarget::Disk));
        assert_eq!(intent("show me everything"), Intent::List(ListTarget::Files));
        assert_eq!(intent("show files and memory"), Intent::List(ListTarget::Files));
    }

    #[test]
    fn test_delete_and_read_targets() {
        assert_eq!(intent("delete old notes.txt"), Intent::Delete("notes.txt".to_string()));
        assert_eq!(intent("remove the drafts"), Intent::Delete("drafts".to_string()));
        assert!(parse_intent("remove the").is_err());

        assert_eq!(intent("open config.json"), Intent::Read("config.json".to_string()));
        assert!(parse_intent("read something").is_err());
    }

    #[test]
    fn test_info_and_help() {
        assert_eq!(intent("how much ram"), Intent::Info(InfoKind::Memory));
        assert_eq!(intent("is the processor busy"), Intent::Info(InfoKind::Cpu));
        assert_eq!(intent("what is running"), Intent::Info(InfoKind::Processes));
        assert_eq!(intent("what can you do"), Intent::Help);
    }

    #[test]
    fn test_unrecognized_suggestions() {
        assert_eq!(
            intent("frobnicate the sprocket"),
            Intent::Unrecognized("frobnicate the sprocket".to_string())
        );
        assert!(suggestions("frobnicate the sprocket").is_empty());
        assert_eq!(suggestions("creating stuff").len(), 1);
        assert_eq!(suggestions("listing deleted").len(), 2);
    }

    #[test]
    fn test_execute_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let table = BuiltinTable::default();
        let mut session = Session::ephemeral(dir.path());

        let out = respond("create file a.txt with hello there", &table, &mut session);
        assert_eq!(out, "Created file 'a.txt' with content: hello there");
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "hello there");

        assert_eq!(respond("read a.txt", &table, &mut session), "hello there");

        respond("create folder archive", &table, &mut session);
        respond("move a.txt to archive", &table, &mut session);
        assert!(dir.path().join("archive").join("a.txt").is_file());

        let out = respond("delete ghost.txt", &table, &mut session);
        assert!(is_failure(&out));
    }

    #[test]
    fn test_unrecognized_leaves_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let table = BuiltinTable::default();
        let mut session = Session::ephemeral(dir.path());

        let out = respond("frobnicate the sprocket", &table, &mut session);
        assert!(out.contains("I don't understand 'frobnicate the sprocket'"));
        assert!(!is_failure(&out));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
