//! cmdmate_core - command interpretation pipeline for the cmdmate shell
//!
//! A line of input is split into chained segments; each segment is
//! classified as a built-in command, a plain-language request, or a host
//! command, and routed accordingly.
//!
//! Modules:
//! - tokenizer: chain splitting and whitespace tokenization
//! - classifier: ordered rule list tagging each segment
//! - builtins: built-in command table and argument parsing
//! - file_commands: filesystem built-ins
//! - nl_mapper: plain-language requests mapped onto built-ins
//! - dispatcher: the pipeline tying the above together
//! - history: persisted, de-duplicated command log
//! - cwd_tracker: per-session working directory
//! - session: session state and the per-client session registry
//! - fs_ops: filesystem and host-command collaborator
//! - system_info: process, memory, cpu and disk snapshots
//! - completions: tab completion for the interactive loop
//! - config: YAML configuration
//! - logging: tracing subscriber setup
//! - error: error types and the failure marker

pub mod builtins;
pub mod classifier;
pub mod completions;
pub mod config;
pub mod cwd_tracker;
pub mod dispatcher;
pub mod error;
pub mod file_commands;
pub mod fs_ops;
pub mod history;
pub mod logging;
pub mod nl_mapper;
pub mod session;
pub mod system_info;
pub mod tokenizer;

// Re-export key types for convenience
pub use builtins::{Args, Builtin, BuiltinTable, TableSettings};

pub use classifier::{ClassificationResult, Classifier, Rule, Tag};

pub use completions::{CompletionEngine, Suggestion, SuggestionKind};

pub use config::Config;

pub use cwd_tracker::{CdResult, CwdTracker};

pub use dispatcher::Dispatcher;

pub use error::{is_failure, CommandError, ConfigError, HistoryError, ERROR_MARKER};

pub use history::HistoryStore;

pub use nl_mapper::{parse_intent, Guidance, Intent};

pub use session::{make_id, Session, SessionRegistry, SharedSession};

pub use tokenizer::{split_chain, tokenize, Segment, CHAIN_DELIMITER};
