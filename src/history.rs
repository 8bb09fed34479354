//! Command history
//!
//! A bounded ring of the most recent command units with prefix recall.
//! Optionally backed by a file that is read at start-up and appended to.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Header printed by the `history` builtin
pub const HISTORY_HEADER: &str = "Command History:";

/// Bounded command history
#[derive(Debug, Clone)]
pub struct History {
    /// Oldest entry first
    entries: VecDeque<String>,
    capacity: usize,
    /// File new entries are appended to
    file: Option<PathBuf>,
}

impl History {
    /// In-memory history keeping the last `capacity` commands
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            file: None,
        }
    }

    /// History backed by `path`. Existing lines are loaded, keeping the
    /// newest `capacity` of them.
    pub fn with_file(capacity: usize, path: PathBuf) -> Result<Self> {
        let mut history = Self::new(capacity);
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    history.push(line);
                }
            }
            debug!("loaded {} history entries from {}", history.len(), path.display());
        }
        history.file = Some(path);
        Ok(history)
    }

    fn push(&mut self, command: String) {
        self.entries.push_back(command);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Record a command. Blank commands are ignored.
    pub fn add(&mut self, command: &str) -> Result<()> {
        let command = command.trim();
        if command.is_empty() {
            return Ok(());
        }
        self.push(command.to_string());

        if let Some(path) = &self.file {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{}", command)?;
        }
        Ok(())
    }

    /// Entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent entry starting with `prefix`
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.starts_with(prefix))
            .map(String::as_str)
    }

    /// Resolve a `!prefix` recall to the command text it stands for
    pub fn recall(&self, prefix: &str) -> Result<String> {
        self.find_by_prefix(prefix)
            .map(str::to_string)
            .ok_or_else(|| Error::HistoryEventNotFound {
                prefix: prefix.to_string(),
            })
    }

    /// Listing printed by the `history` builtin
    pub fn render(&self) -> String {
        let mut out = String::from(HISTORY_HEADER);
        out.push('\n');
        for (i, entry) in self.entries.iter().enumerate() {
            out.push_str(&format!("{}: {}\n", i + 1, entry));
        }
        out
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_SIZE)
    }
}
