//! fsOps - filesystem and host-command collaborator
//! - directory listing, copy/move, text read/write/append
//! - recursive walks for size, name search and grep
//! - run_host_command: platform shell with cwd and timeout

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use walkdir::WalkDir;

use crate::error::CommandError;

type Result<T> = std::result::Result<T, CommandError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
    /// `None` when the entry could not be stat'ed
    pub size: Option<u64>,
}

/// List a directory, sorted by name
pub fn list_dir(dir: &Path, show_hidden: bool) -> Result<Vec<DirEntryInfo>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| CommandError::io(format!("cannot access '{}'", dir.display()), e))?;

    let mut items: Vec<DirEntryInfo> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            if !show_hidden && name.starts_with('.') {
                return None;
            }
            let metadata = fs::metadata(entry.path()).ok();
            Some(DirEntryInfo {
                name,
                is_dir: metadata.as_ref().map(|m| m.is_dir()).unwrap_or(false),
                size: metadata.map(|m| m.len()),
            })
        })
        .collect();

    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

/// Final location when `dest` may be an existing directory
fn target_inside(src: &Path, dest: &Path) -> PathBuf {
    match (dest.is_dir(), src.file_name()) {
        (true, Some(name)) => dest.join(name),
        _ => dest.to_path_buf(),
    }
}

/// Canonical form of a path that may not exist yet
fn resolved(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    b.exists() && resolved(a) == resolved(b)
}

/// Whether `dest` is `src` itself or lies somewhere below it
fn is_inside(src: &Path, dest: &Path) -> bool {
    resolved(dest).starts_with(resolved(src))
}

fn crosses_devices(e: &std::io::Error) -> bool {
    // EXDEV on unix, ERROR_NOT_SAME_DEVICE on Windows
    const CROSS_DEVICE: i32 = if cfg!(windows) { 17 } else { 18 };
    e.raw_os_error() == Some(CROSS_DEVICE)
}

/// Copy one file; copying into an existing directory keeps the file name
pub fn copy_file(src: &Path, dest: &Path) -> Result<PathBuf> {
    let target = target_inside(src, dest);
    if is_same_file(src, &target) {
        return Err(CommandError::resource(format!(
            "'{}' and '{}' are the same file",
            src.display(),
            target.display()
        )));
    }

    fs::copy(src, &target).map_err(|e| {
        CommandError::io(
            format!("cannot copy '{}' to '{}'", src.display(), target.display()),
            e,
        )
    })?;
    Ok(target)
}

/// Copy a directory tree; the destination must not exist yet
pub fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    if dest.exists() {
        return Err(CommandError::resource(format!(
            "destination '{}' already exists",
            dest.display()
        )));
    }
    if is_inside(src, dest) {
        return Err(CommandError::resource(format!(
            "cannot copy '{}' into itself",
            src.display()
        )));
    }

    for entry in WalkDir::new(src) {
        let entry = entry.map_err(|e| {
            CommandError::resource(format!("cannot walk '{}': {}", src.display(), e))
        })?;
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| {
                CommandError::io(format!("cannot create '{}'", target.display()), e)
            })?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| {
                CommandError::io(format!("cannot copy '{}'", entry.path().display()), e)
            })?;
        }
    }

    Ok(())
}

/// Move or rename; falls back to copy-then-delete only across filesystems
pub fn move_path(src: &Path, dest: &Path) -> Result<PathBuf> {
    if !src.exists() {
        return Err(CommandError::resource(format!(
            "'{}' not found",
            src.display()
        )));
    }

    let target = target_inside(src, dest);
    if src.is_dir() && is_inside(src, &target) {
        return Err(CommandError::resource(format!(
            "cannot move '{}' into itself",
            src.display()
        )));
    }

    match fs::rename(src, &target) {
        Ok(()) => return Ok(target),
        Err(e) if crosses_devices(&e) => {
            tracing::debug!(src = %src.display(), "rename crosses devices, copying instead");
        }
        Err(e) => {
            return Err(CommandError::io(
                format!("cannot move '{}' to '{}'", src.display(), target.display()),
                e,
            ))
        }
    }

    if src.is_dir() {
        copy_tree(src, &target)?;
        fs::remove_dir_all(src)
            .map_err(|e| CommandError::io(format!("cannot remove '{}'", src.display()), e))?;
    } else {
        copy_file(src, &target)?;
        fs::remove_file(src)
            .map_err(|e| CommandError::io(format!("cannot remove '{}'", src.display()), e))?;
    }
    Ok(target)
}

pub fn read_text_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| CommandError::io(format!("cannot read '{}'", path.display()), e))
}

/// Write a text file verbatim, replacing any previous content
pub fn write_text_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .map_err(|e| CommandError::io(format!("cannot write '{}'", path.display()), e))
}

pub fn append_text_file(path: &Path, content: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CommandError::io(format!("cannot open '{}'", path.display()), e))?;

    file.write_all(content.as_bytes())
        .map_err(|e| CommandError::io(format!("cannot append to '{}'", path.display()), e))
}

/// Total size of all files below `path`; unreadable entries are skipped
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

/// Files below `dir` matching a glob; `**` recurses
pub fn find_glob(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let base = glob::Pattern::escape(&dir.to_string_lossy());
    let full = Path::new(&base).join(pattern);
    let full = full.to_string_lossy();
    let paths = glob::glob(&full)
        .map_err(|e| CommandError::usage(format!("invalid pattern '{}': {}", pattern, e)))?;

    Ok(paths
        .filter_map(|p| p.ok())
        .filter(|p| p.is_file())
        .collect())
}

/// Files below `dir` whose name contains `needle`
pub fn find_by_name(dir: &Path, needle: &str) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().contains(needle))
        .map(|entry| entry.into_path())
        .collect()
}

/// Lines of `path` accepted by `matcher`, numbered from 1
pub fn grep_file(path: &Path, matcher: impl Fn(&str) -> bool) -> Result<Vec<(usize, String)>> {
    let content = read_text_file(path)?;
    Ok(content
        .lines()
        .enumerate()
        .filter(|(_, line)| matcher(line))
        .map(|(idx, line)| (idx + 1, line.trim_end().to_string()))
        .collect())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostCommandOpts {
    pub cwd: PathBuf,
    pub timeout_ms: u64,
    /// Shell program; defaults to `sh` (`cmd` on Windows)
    pub shell: Option<String>,
}

impl Default for HostCommandOpts {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_default(),
            timeout_ms: 30_000,
            shell: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostCommandResult {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub error: Option<String>,
}

impl HostCommandResult {
    fn failed(error: String) -> Self {
        Self {
            code: None,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: false,
            error: Some(error),
        }
    }
}

fn shell_command(shell: Option<&str>, command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new(shell.unwrap_or("cmd"));
        cmd.arg("/C").arg(command);
        cmd
    } else {
        let mut cmd = Command::new(shell.unwrap_or("sh"));
        cmd.arg("-c").arg(command);
        cmd
    }
}

/// Run a command line through the host shell with a timeout
pub async fn run_host_command(command: &str, opts: &HostCommandOpts) -> HostCommandResult {
    let timeout_duration = Duration::from_millis(opts.timeout_ms);

    let mut cmd = shell_command(opts.shell.as_deref(), command);
    cmd.current_dir(&opts.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return HostCommandResult::failed(e.to_string()),
    };

    // Dropping the wait future on timeout kills the child.
    match timeout(timeout_duration, child.wait_with_output()).await {
        Ok(Ok(output)) => HostCommandResult {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            timed_out: false,
            error: None,
        },
        Ok(Err(e)) => HostCommandResult::failed(e.to_string()),
        Err(_) => {
            tracing::warn!(command, timeout_ms = opts.timeout_ms, "host command timed out");
            HostCommandResult {
                code: None,
                stdout: String::new(),
                stderr: String::new(),
                timed_out: true,
                error: Some("Timeout exceeded".to_string()),
            }
        }
    }
}
