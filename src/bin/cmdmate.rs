/*!
 * cmdmate - interactive command shell
 *
 * Runs built-in commands, plain-language requests and host commands through
 * the cmdmate_core pipeline, either interactively or one line at a time.
 */

use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use cmdmate_core::builtins::CLEAR_SCREEN;
use cmdmate_core::{
    is_failure, logging, CompletionEngine, Config, Dispatcher, HistoryStore, Session, ERROR_MARKER,
};

#[derive(Parser)]
#[command(name = "cmdmate")]
#[command(about = "cmdmate - a command shell that also understands plain requests", long_about = None)]
struct Cli {
    /// Config file (default: ~/.cmdmate/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// History file, overriding the config
    #[arg(long, global = true)]
    history_file: Option<PathBuf>,

    /// Host command timeout in seconds, overriding the config
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive shell (default)
    Repl,

    /// Interpret one line and exit; exit code 1 on error
    Run {
        /// The line to interpret, e.g. `mkdir out && cd out`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },

    /// Print saved command history
    History {
        /// Number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Emit a JSON array instead of numbered lines
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = Config::load_or_default(cli.config.as_deref())
        .context("could not load configuration")?;
    if let Some(path) = cli.history_file {
        config.history.file = Some(path);
    }
    if let Some(secs) = cli.timeout {
        config.host.timeout_secs = secs;
    }

    match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => repl(&config).await,
        Commands::Run { line } => {
            let failed = run_once(&config, &line.join(" ")).await;
            if failed {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::History { limit, json } => show_history(&config, limit, json),
        Commands::Version => {
            println!("cmdmate v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn run_once(config: &Config, line: &str) -> bool {
    let dispatcher = Dispatcher::from_config(config);
    let mut session = Session::from_config(config, None);

    let output = dispatcher.interpret(&mut session, line).await;
    if !output.is_empty() {
        println!("{}", output);
    }
    if !session.is_closed() {
        session.close();
    }
    is_failure(&output)
}

fn show_history(config: &Config, limit: Option<usize>, json: bool) -> Result<()> {
    let mut store = HistoryStore::from_config(&config.history);
    store.load().context("could not read history")?;
    let entries = store.recent(limit.unwrap_or(config.history.show_limit));

    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
    } else {
        for (i, cmd) in entries.iter().enumerate() {
            println!("{:>3}  {}", i + 1, cmd);
        }
    }
    Ok(())
}

async fn repl(config: &Config) -> Result<()> {
    let dispatcher = Dispatcher::from_config(config);
    let mut session = Session::from_config(config, None);

    let helper = ShellHelper::new(CompletionEngine::new(dispatcher.table()), session.cwd.get_cwd());
    let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(helper));
    for entry in session.history.recall() {
        let _ = rl.add_history_entry(entry.as_str());
    }

    println!("{}", "=== cmdmate ===".bright_magenta().bold());
    println!(
        "{}",
        "Type 'help' for commands, plain requests like 'create folder notes', or 'exit' to quit."
            .bright_black()
    );
    println!();

    loop {
        let prompt = format!("cmdmate:{}$ ", session.cwd.display_name());
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let output = dispatcher.interpret(&mut session, trimmed).await;
                print_output(&output);

                if let Some(helper) = rl.helper_mut() {
                    helper.set_cwd(session.cwd.get_cwd());
                }
                if session.is_closed() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "Use 'exit' to quit".bright_black());
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                session.close();
                return Err(e.into());
            }
        }
    }

    if !session.is_closed() {
        session.close();
    }
    Ok(())
}

fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    if output == CLEAR_SCREEN {
        print!("{}", output);
        return;
    }
    for line in output.lines() {
        if line.contains(ERROR_MARKER) {
            println!("{}", line.red());
        } else {
            println!("{}", line);
        }
    }
}

/// Completion and hints for the line editor
struct ShellHelper {
    engine: CompletionEngine,
    cwd: PathBuf,
}

impl ShellHelper {
    fn new(engine: CompletionEngine, cwd: &Path) -> Self {
        Self {
            engine,
            cwd: cwd.to_path_buf(),
        }
    }

    fn set_cwd(&mut self, cwd: &Path) {
        self.cwd = cwd.to_path_buf();
    }
}

impl Helper for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, suggestions) = self.engine.complete(line, pos, &self.cwd);
        let candidates = suggestions
            .into_iter()
            .map(|s| Pair {
                display: s.name.clone(),
                replacement: s.name,
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() || line.is_empty() || line.contains(' ') {
            return None;
        }
        let (_, suggestions) = self.engine.complete(line, pos, &self.cwd);
        match suggestions.as_slice() {
            [only] if only.name.len() > line.len() => Some(only.name[line.len()..].to_string()),
            _ => None,
        }
    }
}

impl Highlighter for ShellHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        if hint.is_empty() {
            Borrowed(hint)
        } else {
            Owned(hint.bright_black().to_string())
        }
    }
}

impl Validator for ShellHelper {}
