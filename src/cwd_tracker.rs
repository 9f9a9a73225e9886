//! cwdTracker - working location of a session
//! - Always an absolute, existing directory
//! - A failed `cd` leaves the location untouched

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdResult {
    pub ok: bool,
    pub cwd: Option<String>,
    pub error: Option<String>,
}

pub struct CwdTracker {
    cwd: PathBuf,
}

impl CwdTracker {
    /// Create a new CwdTracker
    /// - initial: starting directory (defaults to the process cwd, then `/`)
    pub fn new(initial: Option<PathBuf>) -> Self {
        let cwd = initial
            .filter(|p| p.is_dir())
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"));

        let cwd = cwd.canonicalize().unwrap_or(cwd);

        Self { cwd }
    }

    pub fn get_cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn get_cwd_string(&self) -> String {
        self.cwd.display().to_string()
    }

    /// Resolve a user-supplied path against the current location
    pub fn resolve(&self, target: impl AsRef<Path>) -> PathBuf {
        let target = expand_home(target.as_ref());
        if target.is_absolute() {
            target
        } else {
            self.cwd.join(target)
        }
    }

    /// Change directory; the location only moves on success
    pub fn cd(&mut self, target_path: impl AsRef<Path>) -> CdResult {
        let resolved = self.resolve(target_path);

        let resolved = match resolved.canonicalize() {
            Ok(p) => p,
            Err(_) => {
                return CdResult {
                    ok: false,
                    cwd: None,
                    error: Some(format!("Directory '{}' not found", resolved.display())),
                };
            }
        };

        match fs::metadata(&resolved) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                return CdResult {
                    ok: false,
                    cwd: None,
                    error: Some(format!("'{}' is not a directory", resolved.display())),
                };
            }
            Err(e) => {
                return CdResult {
                    ok: false,
                    cwd: None,
                    error: Some(format!("Cannot access '{}': {}", resolved.display(), e)),
                };
            }
        }

        self.cwd = resolved;

        CdResult {
            ok: true,
            cwd: Some(self.get_cwd_string()),
            error: None,
        }
    }

    /// Base name of the current directory, for prompts
    pub fn display_name(&self) -> String {
        self.cwd
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.get_cwd_string())
    }
}

fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
