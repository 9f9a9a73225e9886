//! Dispatcher - the interpretation pipeline
//!
//! raw line → chain split → per segment: record, classify, route → joined output
//!
//! Routing targets are the built-in table, the natural-language mapper, and
//! the host shell. A segment whose output carries the error marker ends the
//! chain; output collected so far is still returned.

use crate::builtins::BuiltinTable;
use crate::classifier::{Classifier, Tag};
use crate::config::{Config, HostConfig};
use crate::error::{is_failure, render_error, CommandError};
use crate::fs_ops::{run_host_command, HostCommandOpts};
use crate::nl_mapper;
use crate::session::Session;
use crate::tokenizer::{split_chain, Segment};

/// Output of a host command that printed nothing
pub const SILENT_SUCCESS: &str = "Command executed successfully";

pub struct Dispatcher {
    table: BuiltinTable,
    classifier: Classifier,
    host: HostConfig,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(BuiltinTable::default(), HostConfig::default())
    }
}

impl Dispatcher {
    pub fn new(table: BuiltinTable, host: HostConfig) -> Self {
        let classifier = Classifier::new(table.names());
        Self {
            table,
            classifier,
            host,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(BuiltinTable::from_config(config), config.host.clone())
    }

    pub fn table(&self) -> &BuiltinTable {
        &self.table
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Interpret one raw input line against `session`
    pub async fn interpret(&self, session: &mut Session, line: &str) -> String {
        let mut outputs = Vec::new();

        for segment in split_chain(line) {
            session.history.record(&segment.text);

            let output = self.run_segment(session, &segment).await;
            let failed = is_failure(&output);
            if !output.is_empty() {
                outputs.push(output);
            }

            if failed {
                tracing::debug!(segment = %segment.text, "segment failed, stopping chain");
                break;
            }
            if session.is_closed() {
                break;
            }
        }

        outputs.join("\n")
    }

    /// Route a single segment by its classification
    pub async fn run_segment(&self, session: &mut Session, segment: &Segment) -> String {
        let classification = self.classifier.classify(segment);
        tracing::debug!(tag = ?classification.tag, text = %classification.text, "classified segment");

        match classification.tag {
            Tag::StructuredCommand => {
                let head = segment.head().unwrap_or_default();
                self.table.invoke(&head, segment.args(), session)
            }
            Tag::NaturalLanguage => nl_mapper::respond(&classification.text, &self.table, session),
            Tag::HostFallback => self.run_host(session, &classification.text).await,
        }
    }

    async fn run_host(&self, session: &Session, command: &str) -> String {
        let opts = HostCommandOpts {
            cwd: session.cwd.get_cwd().to_path_buf(),
            timeout_ms: self.host.timeout_secs.saturating_mul(1000),
            shell: self.host.shell.clone(),
        };

        let result = run_host_command(command, &opts).await;
        if result.timed_out {
            return render_error(CommandError::Timeout(self.host.timeout_secs));
        }
        if let Some(error) = result.error {
            return render_error(format!("cannot run '{}': {}", command, error));
        }

        let mut output = result.stdout.trim_end().to_string();
        let stderr = result.stderr.trim_end();
        if !stderr.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(&render_error(stderr));
        }

        if output.is_empty() {
            SILENT_SUCCESS.to_string()
        } else {
            output
        }
    }

    /// Accepted commands of `session`, oldest first
    pub fn get_history(session: &Session) -> Vec<String> {
        session.history.all().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, Dispatcher, Session) {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::ephemeral(dir.path());
        (dir, Dispatcher::default(), session)
    }

    #[tokio::test]
    async fn test_empty_line_is_noop() {
        let (_dir, dispatcher, mut session) = setup();
        assert_eq!(dispatcher.interpret(&mut session, "   ").await, "");
        assert!(Dispatcher::get_history(&session).is_empty());
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let (dir, dispatcher, mut session) = setup();
        let out = dispatcher
            .interpret(&mut session, "mkdir box && cd box && pwd")
            .await;

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Created directory: box");
        assert!(lines[1].starts_with("Changed to: "));
        assert_eq!(lines[2], dir.path().canonicalize().unwrap().join("box").display().to_string());
        assert_eq!(
            Dispatcher::get_history(&session),
            vec!["mkdir box", "cd box", "pwd"]
        );
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_error() {
        let (dir, dispatcher, mut session) = setup();
        let out = dispatcher
            .interpret(&mut session, "cat missing.txt && mkdir never")
            .await;

        assert!(is_failure(&out));
        assert!(!dir.path().join("never").exists());
        assert_eq!(Dispatcher::get_history(&session), vec!["cat missing.txt"]);
    }

    #[tokio::test]
    async fn test_natural_language_matches_builtin() {
        let (dir, dispatcher, mut session) = setup();
        dispatcher.interpret(&mut session, "create folder reports").await;
        assert!(dir.path().join("reports").is_dir());
    }

    #[tokio::test]
    async fn test_exit_ends_chain() {
        let (dir, dispatcher, mut session) = setup();
        let out = dispatcher.interpret(&mut session, "exit && mkdir late").await;
        assert_eq!(out, "Goodbye!");
        assert!(session.is_closed());
        assert!(!dir.path().join("late").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_host_fallback_output() {
        let (_dir, dispatcher, mut session) = setup();

        assert_eq!(dispatcher.interpret(&mut session, "true").await, SILENT_SUCCESS);
        assert_eq!(
            dispatcher.interpret(&mut session, "printf 'a b'").await,
            "a b"
        );

        let out = dispatcher.interpret(&mut session, "sh -c 'echo oops >&2'").await;
        assert_eq!(out, "Error: oops");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_host_fallback_runs_in_session_directory() {
        let (dir, dispatcher, mut session) = setup();
        std::fs::create_dir(dir.path().join("inner")).unwrap();
        dispatcher.interpret(&mut session, "cd inner").await;

        let out = dispatcher.interpret(&mut session, "/bin/pwd -P").await;
        assert!(out.ends_with("inner"));
    }
}
