//! Filename wildcard expansion
//!
//! The tokenizer only depends on the [`GlobExpander`] trait so that the
//! filesystem can be swapped out in tests.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Characters that make a token a wildcard pattern
pub const WILDCARD_CHARS: [char; 2] = ['*', '?'];

/// Whether `token` should be handed to the glob collaborator
pub fn is_pattern(token: &str) -> bool {
    token.contains(WILDCARD_CHARS)
}

/// Expands a wildcard pattern into the paths it matches
pub trait GlobExpander {
    /// Return every match in collaborator order. An empty vector means
    /// the pattern matched nothing.
    fn expand(&self, pattern: &str) -> Result<Vec<String>>;
}

/// Glob expansion against the real filesystem, with `~` expansion
#[derive(Debug, Clone, Default)]
pub struct FilesystemGlob {
    home: Option<PathBuf>,
}

impl FilesystemGlob {
    pub fn new() -> Self {
        Self {
            home: dirs::home_dir(),
        }
    }

    /// Use an explicit home directory for `~` expansion
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: Some(home.into()),
        }
    }

    fn expand_tilde(&self, pattern: &str) -> String {
        match (&self.home, pattern.strip_prefix('~')) {
            (Some(home), Some(rest)) if rest.is_empty() || rest.starts_with('/') => {
                format!("{}{}", home.display(), rest)
            }
            _ => pattern.to_string(),
        }
    }
}

impl GlobExpander for FilesystemGlob {
    fn expand(&self, pattern: &str) -> Result<Vec<String>> {
        let expanded = self.expand_tilde(pattern);

        let paths = glob::glob(&expanded).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.msg.to_string(),
        })?;

        let mut matches = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) => matches.push(display_path(&path)),
                Err(e) => debug!("skipping unreadable glob entry: {}", e),
            }
        }
        Ok(matches)
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
