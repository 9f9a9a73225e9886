//! Completion engine for the interactive loop
//!
//! Completes the segment under the cursor (after the last ` && `):
//! the first word against built-in names and request starters, later words
//! against a command's flags or against paths in the session directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::builtins::BuiltinTable;
use crate::tokenizer::CHAIN_DELIMITER;

/// First words of plain-language requests
pub const REQUEST_STARTERS: &[&str] = &[
    "create", "make", "move", "copy", "transfer", "show", "list", "display", "delete", "remove",
    "read", "open", "view", "what",
];

const FLAGS: &[(&str, &[&str])] = &[
    ("ls", &["-a", "-l", "-h", "--all", "--long", "--human-readable"]),
    ("rm", &["-r", "-f", "--recursive", "--force"]),
    ("cp", &["-r", "--recursive"]),
    ("ps", &["-a", "--all"]),
    ("grep", &["-i", "-E", "--ignore-case", "--extended-regexp"]),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionKind {
    Command,
    Request,
    Flag,
    File,
    Folder,
}

/// A suggestion returned by the completion engine
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Suggestion {
    /// Replacement for the word under the cursor
    pub name: String,
    pub description: Option<String>,
    pub kind: SuggestionKind,
    /// Higher is shown first
    pub priority: i32,
    /// Whether to insert a space after completion
    pub insert_space: bool,
}

pub struct CompletionEngine {
    commands: Vec<(String, String)>,
    flags: HashMap<&'static str, &'static [&'static str]>,
}

impl CompletionEngine {
    pub fn new(table: &BuiltinTable) -> Self {
        let commands = table
            .names()
            .into_iter()
            .filter_map(|name| table.get(name))
            .map(|b| (b.name.to_string(), b.summary.to_string()))
            .collect();

        let flags = FLAGS.iter().copied().collect();
        Self { commands, flags }
    }

    /// Start offset of the word under the cursor, and its suggestions
    pub fn complete(&self, line: &str, cursor_pos: usize, cwd: &Path) -> (usize, Vec<Suggestion>) {
        let mut cursor = cursor_pos.min(line.len());
        while !line.is_char_boundary(cursor) {
            cursor -= 1;
        }
        let before = &line[..cursor];

        let segment_start = before
            .rfind(CHAIN_DELIMITER)
            .map(|idx| idx + CHAIN_DELIMITER.len())
            .unwrap_or(0);
        let segment = &before[segment_start..];

        let word_start = segment
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let word = &segment[word_start..];
        let start = segment_start + word_start;

        let earlier: Vec<&str> = segment[..word_start].split_whitespace().collect();

        let mut suggestions = match earlier.first() {
            None => self.complete_commands(word),
            Some(command) if word.starts_with('-') => self.complete_flags(command, word),
            Some(_) => complete_paths(word, cwd),
        };

        suggestions.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(&b.name)));
        (start, suggestions)
    }

    fn complete_commands(&self, prefix: &str) -> Vec<Suggestion> {
        let prefix = prefix.to_lowercase();
        let mut out: Vec<Suggestion> = self
            .commands
            .iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .map(|(name, summary)| Suggestion {
                name: name.clone(),
                description: Some(summary.clone()),
                kind: SuggestionKind::Command,
                priority: 100,
                insert_space: true,
            })
            .collect();

        out.extend(
            REQUEST_STARTERS
                .iter()
                .filter(|starter| starter.starts_with(&prefix))
                .filter(|starter| !self.commands.iter().any(|(name, _)| name == *starter))
                .map(|starter| Suggestion {
                    name: starter.to_string(),
                    description: None,
                    kind: SuggestionKind::Request,
                    priority: 60,
                    insert_space: true,
                }),
        );
        out
    }

    fn complete_flags(&self, command: &str, prefix: &str) -> Vec<Suggestion> {
        let command = command.to_lowercase();
        self.flags
            .get(command.as_str())
            .map(|flags| {
                flags
                    .iter()
                    .filter(|flag| flag.starts_with(prefix))
                    .map(|flag| Suggestion {
                        name: flag.to_string(),
                        description: None,
                        kind: SuggestionKind::Flag,
                        priority: 80,
                        insert_space: true,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Entries of the directory named by `prefix`, relative to `cwd`
fn complete_paths(prefix: &str, cwd: &Path) -> Vec<Suggestion> {
    let (dir_part, name_prefix) = match prefix.rfind('/') {
        Some(idx) => (&prefix[..=idx], &prefix[idx + 1..]),
        None => ("", prefix),
    };
    let dir = if dir_part.is_empty() {
        cwd.to_path_buf()
    } else {
        cwd.join(dir_part)
    };

    let Ok(entries) = fs::read_dir(&dir) else {
        return Vec::new();
    };

    entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with(name_prefix) || (name.starts_with('.') && !name_prefix.starts_with('.')) {
                return None;
            }
            let is_dir = entry.path().is_dir();
            let full = format!("{}{}", dir_part, name);
            Some(Suggestion {
                name: if is_dir { format!("{}/", full) } else { full },
                description: None,
                kind: if is_dir { SuggestionKind::Folder } else { SuggestionKind::File },
                priority: 50,
                insert_space: !is_dir,
            })
        })
        .collect()
}
