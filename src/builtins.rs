//! Built-in command table
//!
//! Maps command names to handlers. Every handler takes the tokens after the
//! command name plus the session, and reports failure through
//! `CommandError`; [`BuiltinTable::invoke`] renders that as an
//! `Error: ...` line so a chained sequence can stop on it.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::error::{render_error, CommandError, CommandResult};
use crate::file_commands;
use crate::nl_mapper;
use crate::session::Session;
use crate::system_info;

/// Parsed arguments of one built-in call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Args {
    /// Tokens exactly as typed
    pub raw: Vec<String>,
    /// Tokens starting with `-`
    pub flags: Vec<String>,
    /// Everything else, in order
    pub positionals: Vec<String>,
}

impl Args {
    pub fn parse(tokens: &[String]) -> Self {
        let (flags, positionals) = tokens
            .iter()
            .cloned()
            .partition(|token| token.starts_with('-') && token.len() > 1);
        Self {
            raw: tokens.to_vec(),
            flags,
            positionals,
        }
    }

    pub fn from_strs(tokens: &[&str]) -> Self {
        let tokens: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        Self::parse(&tokens)
    }

    /// True for `--long`, `-s`, or `-s` bundled with other short flags (`-la`)
    pub fn flag(&self, short: char, long: &str) -> bool {
        self.flags.iter().any(|flag| match flag.strip_prefix("--") {
            Some(name) => name == long,
            None => flag[1..].contains(short),
        })
    }

    pub fn positional(&self, idx: usize) -> Option<&str> {
        self.positionals.get(idx).map(String::as_str)
    }
}

/// Everything a handler can touch
pub struct Context<'a> {
    pub table: &'a BuiltinTable,
    pub session: &'a mut Session,
}

pub type Handler = fn(&mut Context<'_>, &Args) -> CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Files,
    System,
    Search,
    Utilities,
}

impl Category {
    fn title(&self) -> &'static str {
        match self {
            Category::Files => "File Operations",
            Category::System => "System Monitoring",
            Category::Search => "Search",
            Category::Utilities => "Utilities",
        }
    }
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
    pub category: Category,
    pub handler: Handler,
}

/// Presentation knobs handlers need
#[derive(Clone, Debug)]
pub struct TableSettings {
    pub columns: usize,
    pub history_limit: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            columns: 80,
            history_limit: 20,
        }
    }
}

pub struct BuiltinTable {
    commands: BTreeMap<&'static str, Builtin>,
    order: Vec<&'static str>,
    pub settings: TableSettings,
}

impl Default for BuiltinTable {
    fn default() -> Self {
        Self::new(TableSettings::default())
    }
}

impl BuiltinTable {
    pub fn new(settings: TableSettings) -> Self {
        let mut table = Self {
            commands: BTreeMap::new(),
            order: Vec::new(),
            settings,
        };
        table.register_defaults();
        table
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(TableSettings {
            columns: config.display.columns,
            history_limit: config.history.show_limit,
        })
    }

    pub fn register(&mut self, builtin: Builtin) {
        if self.commands.insert(builtin.name, builtin).is_none() {
            self.order.push(builtin.name);
        }
    }

    fn register_defaults(&mut self) {
        use Category::*;

        let defaults: [(&'static str, &'static str, &'static str, Category, Handler); 23] = [
            ("ls", "ls [options] [dir]", "List directory contents (-a: show hidden, -l: long format, -h: human sizes)", Files, file_commands::ls),
            ("cd", "cd [dir]", "Change directory", Files, cmd_cd),
            ("pwd", "pwd", "Print working directory", Files, cmd_pwd),
            ("mkdir", "mkdir <dir>...", "Create directory", Files, file_commands::mkdir),
            ("rm", "rm [options] <file>...", "Remove file/directory (-r: recursive, -f: force)", Files, file_commands::rm),
            ("rmdir", "rmdir <dir>...", "Remove empty directory", Files, file_commands::rmdir),
            ("cp", "cp [options] <src> <dest>", "Copy file/directory (-r: recursive)", Files, file_commands::cp),
            ("mv", "mv <src> <dest>", "Move/rename file/directory", Files, file_commands::mv),
            ("cat", "cat <file>...", "Display file contents", Files, file_commands::cat),
            ("echo", "echo <text> [> file | >> file]", "Echo text, optionally into a file", Files, cmd_echo),
            ("ps", "ps [-a]", "List running processes", System, cmd_ps),
            ("top", "top", "Show top processes by CPU usage", System, cmd_top),
            ("mem", "mem", "Show memory usage", System, cmd_mem),
            ("cpu", "cpu", "Show CPU usage", System, cmd_cpu),
            ("df", "df", "Show disk usage", System, cmd_df),
            ("du", "du [dir]", "Show directory usage", System, file_commands::du),
            ("find", "find <pattern> [dir]", "Find files by name or glob", Search, file_commands::find),
            ("grep", "grep [-i] [-E] <pattern> <file>", "Search text in a file", Search, file_commands::grep),
            ("history", "history [n]", "Show command history", Utilities, cmd_history),
            ("clear", "clear", "Clear screen", Utilities, cmd_clear),
            ("help", "help", "Show this help", Utilities, cmd_help),
            ("ai", "ai <request>", "Run a plain-language request", Utilities, cmd_ai),
            ("exit", "exit", "Save history and exit", Utilities, cmd_exit),
        ];

        for (name, usage, summary, category, handler) in defaults {
            self.register(Builtin {
                name,
                usage,
                summary,
                category,
                handler,
            });
        }
    }

    /// Command names in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.order.clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name.to_lowercase().as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.commands.get(name.to_lowercase().as_str())
    }

    /// Run a built-in and keep the error as a value
    pub fn run(&self, name: &str, args: &Args, session: &mut Session) -> CommandResult {
        let builtin = self
            .get(name)
            .ok_or_else(|| CommandError::usage(format!("unknown command '{}'", name)))?;

        tracing::debug!(command = builtin.name, args = ?args.raw, "running built-in");
        let mut ctx = Context {
            table: self,
            session,
        };
        (builtin.handler)(&mut ctx, args)
    }

    /// Run a built-in and render the outcome as text
    pub fn invoke<S: AsRef<str>>(&self, name: &str, tokens: &[S], session: &mut Session) -> String {
        let tokens: Vec<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();
        match self.run(name, &Args::parse(&tokens), session) {
            Ok(output) => output,
            Err(e) => render_error(e),
        }
    }

    pub fn help_text(&self) -> String {
        let width = self
            .commands
            .values()
            .map(|b| b.usage.len())
            .max()
            .unwrap_or(0)
            + 2;

        let mut lines = vec!["Available Commands:".to_string()];
        for category in [Category::Files, Category::System, Category::Search, Category::Utilities] {
            lines.push(format!("  {}:", category.title()));
            for name in &self.order {
                let builtin = &self.commands[name];
                if builtin.category == category {
                    lines.push(format!(
                        "    {:<width$} - {}",
                        builtin.usage,
                        builtin.summary,
                        width = width
                    ));
                }
            }
            lines.push(String::new());
        }

        lines.push("  Plain-language requests (no prefix needed):".to_string());
        for (example, summary) in nl_mapper::EXAMPLES {
            lines.push(format!("    {:<width$} - {}", example, summary, width = width));
        }
        lines.push(String::new());
        lines.push("  Chain commands with ' && '; the chain stops at the first error.".to_string());

        lines.join("\n")
    }
}

fn cmd_cd(ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    let target = match args.positional(0) {
        Some(dir) => ctx.session.cwd.resolve(dir),
        None => dirs::home_dir()
            .ok_or_else(|| CommandError::resource("home directory is unknown"))?,
    };

    let result = ctx.session.cwd.cd(&target);
    if result.ok {
        Ok(format!("Changed to: {}", ctx.session.cwd.get_cwd_string()))
    } else {
        Err(CommandError::resource(
            result.error.unwrap_or_else(|| "cd failed".to_string()),
        ))
    }
}

fn cmd_pwd(ctx: &mut Context<'_>, _args: &Args) -> CommandResult {
    Ok(ctx.session.cwd.get_cwd_string())
}

fn cmd_echo(ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    if args.raw.is_empty() {
        return Ok(String::new());
    }

    let joined = args.raw.join(" ");
    if let Some((text, file)) = joined.split_once(">>") {
        let file = file.trim();
        if file.is_empty() {
            return Err(CommandError::usage("echo: missing file after '>>'"));
        }
        let path = ctx.session.cwd.resolve(file);
        file_commands::append_line(&path, text.trim())?;
        return Ok(format!("Appended to {}", file));
    }

    if let Some(idx) = args.raw.iter().position(|t| t == ">") {
        let file = args
            .raw
            .get(idx + 1)
            .ok_or_else(|| CommandError::usage("echo: missing file after '>'"))?;
        let text = args.raw[..idx].join(" ");
        let path = ctx.session.cwd.resolve(file);
        file_commands::write_line(&path, &text)?;
        return Ok(format!("Written to {}", file));
    }

    Ok(joined)
}

fn cmd_ps(_ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    let processes = system_info::processes();
    if processes.is_empty() {
        return Ok("No processes found".to_string());
    }

    let limit = if args.flag('a', "all") { processes.len() } else { 20 };
    let mut lines = vec![system_info::process_header()];
    lines.extend(processes.iter().take(limit).map(system_info::format_process));
    Ok(lines.join("\n"))
}

fn cmd_top(_ctx: &mut Context<'_>, _args: &Args) -> CommandResult {
    let mut busy: Vec<_> = system_info::processes()
        .into_iter()
        .filter(|p| p.cpu_percent > 0.0)
        .collect();
    busy.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));

    let mut lines = vec![system_info::process_header()];
    lines.extend(busy.iter().take(10).map(system_info::format_process));
    Ok(lines.join("\n"))
}

fn cmd_mem(_ctx: &mut Context<'_>, _args: &Args) -> CommandResult {
    Ok(system_info::format_memory(&system_info::memory()))
}

fn cmd_cpu(_ctx: &mut Context<'_>, _args: &Args) -> CommandResult {
    Ok(system_info::format_cpu(&system_info::cpu()))
}

fn cmd_df(_ctx: &mut Context<'_>, _args: &Args) -> CommandResult {
    Ok(system_info::format_disks(&system_info::disks()))
}

fn cmd_history(ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    let limit = match args.positional(0) {
        Some(n) => n
            .parse::<usize>()
            .map_err(|_| CommandError::usage(format!("history: '{}' is not a number", n)))?,
        None => ctx.table.settings.history_limit,
    };

    let entries = ctx.session.history.recent(limit);
    if entries.is_empty() {
        return Ok("No command history".to_string());
    }

    Ok(entries
        .iter()
        .enumerate()
        .map(|(i, cmd)| format!("{:>3}  {}", i + 1, cmd))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// ANSI: clear screen, cursor home
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

fn cmd_clear(_ctx: &mut Context<'_>, _args: &Args) -> CommandResult {
    Ok(CLEAR_SCREEN.to_string())
}

fn cmd_help(ctx: &mut Context<'_>, _args: &Args) -> CommandResult {
    Ok(ctx.table.help_text())
}

fn cmd_ai(ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    if args.raw.is_empty() {
        return Err(CommandError::usage("ai requires a request"));
    }
    Ok(nl_mapper::respond(&args.raw.join(" "), ctx.table, ctx.session))
}

fn cmd_exit(ctx: &mut Context<'_>, _args: &Args) -> CommandResult {
    ctx.session.close();
    Ok("Goodbye!".to_string())
}
