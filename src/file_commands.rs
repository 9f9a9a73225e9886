//! Filesystem built-ins: ls mkdir rm rmdir cp mv cat du find grep
//!
//! Commands that take several targets report each one on its own line, so a
//! failure on one target shows up as an `Error:` line next to the successes.

use std::fs;
use std::path::Path;

use regex::RegexBuilder;

use crate::builtins::{Args, Context};
use crate::error::{render_error, CommandError, CommandResult};
use crate::fs_ops;
use crate::system_info::format_size;

/// Overwrite `path` with `text` plus a newline
pub fn write_line(path: &Path, text: &str) -> Result<(), CommandError> {
    fs_ops::write_text_file(path, &format!("{}\n", text))
}

pub fn append_line(path: &Path, text: &str) -> Result<(), CommandError> {
    fs_ops::append_text_file(path, &format!("{}\n", text))
}

fn require<'a>(args: &'a Args, idx: usize, message: &str) -> Result<&'a str, CommandError> {
    args.positional(idx)
        .ok_or_else(|| CommandError::usage(message.to_string()))
}

/// Show `path` relative to the session directory when it lies below it
fn display_relative(ctx: &Context<'_>, path: &Path) -> String {
    path.strip_prefix(ctx.session.cwd.get_cwd())
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}

pub fn ls(ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    let show_hidden = args.flag('a', "all");
    let long = args.flag('l', "long");
    let human = args.flag('h', "human-readable");

    let target = match args.positional(0) {
        Some(dir) => {
            let path = ctx.session.cwd.resolve(dir);
            if !path.exists() {
                return Err(CommandError::resource(format!("'{}' not found", dir)));
            }
            if !path.is_dir() {
                return Err(CommandError::resource(format!("'{}' is not a directory", dir)));
            }
            path
        }
        None => ctx.session.cwd.get_cwd().to_path_buf(),
    };

    let entries = fs_ops::list_dir(&target, show_hidden)?;
    if entries.is_empty() {
        return Ok("Directory is empty".to_string());
    }

    if long {
        let lines: Vec<String> = entries
            .iter()
            .map(|entry| {
                let kind = if entry.is_dir { 'd' } else { '-' };
                let size = match entry.size {
                    Some(bytes) if human => format_size(bytes),
                    Some(bytes) => bytes.to_string(),
                    None => "?".to_string(),
                };
                format!("{} {:>10} {}", kind, size, entry.name)
            })
            .collect();
        return Ok(lines.join("\n"));
    }

    let names: Vec<String> = entries
        .iter()
        .map(|entry| {
            if entry.is_dir {
                format!("{}/", entry.name)
            } else {
                entry.name.clone()
            }
        })
        .collect();
    Ok(layout_columns(&names, ctx.table.settings.columns))
}

/// Pack names row by row into as many columns as fit in `width`
pub fn layout_columns(names: &[String], width: usize) -> String {
    let cell = names.iter().map(|n| n.chars().count()).max().unwrap_or(0) + 2;
    let per_row = (width / cell).max(1);

    names
        .chunks(per_row)
        .map(|row| {
            row.iter()
                .map(|name| format!("{:<cell$}", name, cell = cell))
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn mkdir(ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    if args.positionals.is_empty() {
        return Err(CommandError::usage("mkdir requires directory name"));
    }

    let lines: Vec<String> = args
        .positionals
        .iter()
        .map(|name| {
            let path = ctx.session.cwd.resolve(name);
            match fs::create_dir_all(&path) {
                Ok(()) => format!("Created directory: {}", name),
                Err(e) => render_error(format!("cannot create '{}': {}", name, e)),
            }
        })
        .collect();
    Ok(lines.join("\n"))
}

pub fn rm(ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    if args.positionals.is_empty() {
        return Err(CommandError::usage("rm requires file or directory name"));
    }
    let recursive = args.flag('r', "recursive");
    let force = args.flag('f', "force");

    let mut lines = Vec::new();
    for name in &args.positionals {
        let path = ctx.session.cwd.resolve(name);
        let outcome = if path.is_dir() {
            if !recursive {
                Some(render_error(format!(
                    "'{}' is a directory (use -r for recursive)",
                    name
                )))
            } else {
                Some(match fs::remove_dir_all(&path) {
                    Ok(()) => format!("Removed directory: {}", name),
                    Err(e) => render_error(format!("cannot remove '{}': {}", name, e)),
                })
            }
        } else if path.exists() || path.symlink_metadata().is_ok() {
            Some(match fs::remove_file(&path) {
                Ok(()) => format!("Removed file: {}", name),
                Err(e) => render_error(format!("cannot remove '{}': {}", name, e)),
            })
        } else if force {
            None
        } else {
            Some(render_error(format!("'{}' not found", name)))
        };
        lines.extend(outcome);
    }
    Ok(lines.join("\n"))
}

pub fn rmdir(ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    if args.positionals.is_empty() {
        return Err(CommandError::usage("rmdir requires directory name"));
    }

    let lines: Vec<String> = args
        .positionals
        .iter()
        .map(|name| {
            let path = ctx.session.cwd.resolve(name);
            if !path.is_dir() {
                return render_error(format!("'{}' is not a directory", name));
            }
            let empty = fs::read_dir(&path)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if !empty {
                return render_error(format!(
                    "Directory '{}' is not empty (use 'rm -r' to remove non-empty directories)",
                    name
                ));
            }
            match fs::remove_dir(&path) {
                Ok(()) => format!("Removed directory: {}", name),
                Err(e) => render_error(format!("cannot remove '{}': {}", name, e)),
            }
        })
        .collect();
    Ok(lines.join("\n"))
}

pub fn cp(ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    let usage = "cp requires source and destination";
    let src_name = require(args, 0, usage)?;
    let dest_name = require(args, 1, usage)?;

    let src = ctx.session.cwd.resolve(src_name);
    let dest = ctx.session.cwd.resolve(dest_name);

    if src.is_dir() {
        if !args.flag('r', "recursive") {
            return Err(CommandError::usage(format!(
                "cannot copy directory '{}' without -r flag",
                src_name
            )));
        }
        let target = match (dest.is_dir(), src.file_name()) {
            (true, Some(name)) => dest.join(name),
            _ => dest,
        };
        fs_ops::copy_tree(&src, &target)?;
        return Ok(format!("Copied directory '{}' to '{}'", src_name, dest_name));
    }

    if !src.exists() {
        return Err(CommandError::resource(format!("'{}' not found", src_name)));
    }
    fs_ops::copy_file(&src, &dest)?;
    Ok(format!("Copied file '{}' to '{}'", src_name, dest_name))
}

pub fn mv(ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    let usage = "mv requires source and destination";
    let src_name = require(args, 0, usage)?;
    let dest_name = require(args, 1, usage)?;

    let src = ctx.session.cwd.resolve(src_name);
    if !src.exists() {
        return Err(CommandError::resource(format!("'{}' not found", src_name)));
    }
    fs_ops::move_path(&src, &ctx.session.cwd.resolve(dest_name))?;
    Ok(format!("Moved '{}' to '{}'", src_name, dest_name))
}

pub fn cat(ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    if args.positionals.is_empty() {
        return Err(CommandError::usage("cat requires file name"));
    }

    let parts: Vec<String> = args
        .positionals
        .iter()
        .map(|name| {
            let path = ctx.session.cwd.resolve(name);
            if path.is_dir() {
                return render_error(format!("'{}' is a directory", name));
            }
            if !path.exists() {
                return render_error(format!("'{}' not found", name));
            }
            match fs_ops::read_text_file(&path) {
                Ok(content) => content.trim_end_matches('\n').to_string(),
                Err(e) => render_error(e),
            }
        })
        .collect();
    Ok(parts.join("\n"))
}

pub fn du(ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    let name = args.positional(0).unwrap_or(".");
    let path = ctx.session.cwd.resolve(name);
    if !path.exists() {
        return Err(CommandError::resource(format!("'{}' not found", name)));
    }

    let size = if path.is_dir() {
        fs_ops::dir_size(&path)
    } else {
        fs::metadata(&path)
            .map(|m| m.len())
            .map_err(|e| CommandError::io(format!("cannot stat '{}'", name), e))?
    };
    Ok(format!("Total size of '{}': {}", name, format_size(size)))
}

pub fn find(ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    let pattern = require(args, 0, "find requires search pattern")?;
    let dir_name = args.positional(1).unwrap_or(".");
    let dir = ctx.session.cwd.resolve(dir_name);
    if !dir.is_dir() {
        return Err(CommandError::resource(format!("'{}' is not a directory", dir_name)));
    }

    let matches = if pattern.contains('*') || pattern.contains('?') {
        // recurse like the substring search does
        let pattern = if pattern.contains('/') {
            pattern.to_string()
        } else {
            format!("**/{}", pattern)
        };
        fs_ops::find_glob(&dir, &pattern)?
    } else {
        fs_ops::find_by_name(&dir, pattern)
    };

    if matches.is_empty() {
        return Ok(format!("No files found matching '{}'", pattern));
    }
    Ok(matches
        .iter()
        .map(|path| display_relative(ctx, path))
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn grep(ctx: &mut Context<'_>, args: &Args) -> CommandResult {
    let usage = "grep requires pattern and file";
    let pattern = require(args, 0, usage)?;
    let file = require(args, 1, usage)?;

    let ignore_case = args.flag('i', "ignore-case");
    let path = ctx.session.cwd.resolve(file);
    if !path.is_file() {
        return Err(CommandError::resource(format!("'{}' not found", file)));
    }

    let hits = if args.flag('E', "extended-regexp") {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| CommandError::usage(format!("invalid pattern '{}': {}", pattern, e)))?;
        fs_ops::grep_file(&path, |line| re.is_match(line))?
    } else if ignore_case {
        let needle = pattern.to_lowercase();
        fs_ops::grep_file(&path, |line| line.to_lowercase().contains(&needle))?
    } else {
        fs_ops::grep_file(&path, |line| line.contains(pattern))?
    };

    if hits.is_empty() {
        return Ok(format!("No matches found for '{}' in '{}'", pattern, file));
    }
    Ok(hits
        .iter()
        .map(|(n, line)| format!("{}:{}:{}", file, n, line))
        .collect::<Vec<_>>()
        .join("\n"))
}
