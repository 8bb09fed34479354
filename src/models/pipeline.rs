//! Pipeline Model
//!
//! The planned form of one command unit: an ordered list of stages,
//! each with its argument vector, plus the file redirections attached
//! to the first and last stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One `;`/`&` delimited command as produced by the segmenter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandUnit {
    /// Raw text of the unit, without the background marker
    pub text: String,
    /// Whether the unit was followed by `&`
    pub background: bool,
}

impl CommandUnit {
    pub fn new(text: impl Into<String>, background: bool) -> Self {
        Self {
            text: text.into(),
            background,
        }
    }

    pub fn foreground(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }
}

/// How an output redirection opens its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedirectMode {
    /// `>`
    Truncate,
    /// `>>`
    Append,
}

/// Which standard stream a redirection replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedirectDirection {
    Input,
    Output,
}

/// A single file redirection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectSpec {
    pub path: PathBuf,
    pub mode: RedirectMode,
    pub direction: RedirectDirection,
}

impl RedirectSpec {
    /// `< path`
    pub fn input(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: RedirectMode::Truncate,
            direction: RedirectDirection::Input,
        }
    }

    /// `> path` or `>> path`
    pub fn output(path: impl Into<PathBuf>, mode: RedirectMode) -> Self {
        Self {
            path: path.into(),
            mode,
            direction: RedirectDirection::Output,
        }
    }

    /// The operator that produced this redirection
    pub fn operator(&self) -> &'static str {
        match (self.direction, self.mode) {
            (RedirectDirection::Input, _) => "<",
            (RedirectDirection::Output, RedirectMode::Truncate) => ">",
            (RedirectDirection::Output, RedirectMode::Append) => ">>",
        }
    }
}

/// One program invocation inside a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStage {
    /// Position within the pipeline, starting at 0
    pub index: usize,
    /// Program followed by its arguments; never empty
    pub argv: Vec<String>,
    pub input: Option<RedirectSpec>,
    pub output: Option<RedirectSpec>,
}

impl PipelineStage {
    pub fn new(index: usize, argv: Vec<String>) -> Self {
        Self {
            index,
            argv,
            input: None,
            output: None,
        }
    }

    /// Program name, used for display and diagnostics
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }

    pub fn has_redirects(&self) -> bool {
        self.input.is_some() || self.output.is_some()
    }
}

/// An ordered, non-empty sequence of stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<PipelineStage>,
}

impl Pipeline {
    /// Build a pipeline; returns `None` for an empty stage list
    pub fn new(stages: Vec<PipelineStage>) -> Option<Self> {
        if stages.is_empty() {
            None
        } else {
            Some(Self { stages })
        }
    }

    /// A one-stage pipeline running `argv`
    pub fn simple(argv: Vec<String>) -> Self {
        Self {
            stages: vec![PipelineStage::new(0, argv)],
        }
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Number of pipes needed between stages
    pub fn pipe_count(&self) -> usize {
        self.stages.len().saturating_sub(1)
    }

    pub fn is_simple(&self) -> bool {
        self.stages.len() == 1
    }

    pub fn first(&self) -> &PipelineStage {
        &self.stages[0]
    }

    pub fn last(&self) -> &PipelineStage {
        &self.stages[self.stages.len() - 1]
    }

    pub fn input_redirect(&self) -> Option<&RedirectSpec> {
        self.first().input.as_ref()
    }

    pub fn output_redirect(&self) -> Option<&RedirectSpec> {
        self.last().output.as_ref()
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", stage.argv.join(" "))?;
            if let Some(input) = &stage.input {
                write!(f, " < {}", input.path.display())?;
            }
            if let Some(output) = &stage.output {
                write!(f, " {} {}", output.operator(), output.path.display())?;
            }
        }
        Ok(())
    }
}
