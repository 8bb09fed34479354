//! Pipeline & Redirection Planner
//!
//! Turns the text of one command unit into a [`Pipeline`]. Stages are
//! split on `|`; each stage may carry `<file`, `>file` or `>>file`.
//! Input redirection is only accepted on the first stage and output
//! redirection only on the last one.

use super::tokenizer::{split_words, Tokenizer};
use crate::error::{Error, Result};
use crate::models::{Pipeline, PipelineStage, RedirectMode, RedirectSpec};

/// Pipe operator
pub const PIPE: char = '|';
/// Input redirection operator
pub const REDIRECT_IN: char = '<';
/// Output redirection operator (doubled for append)
pub const REDIRECT_OUT: char = '>';

/// Redirection operators found in one stage's text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Operators {
    input: Option<usize>,
    output: Option<usize>,
    append: bool,
}

impl Operators {
    fn scan(text: &str) -> Self {
        let input = text.find(REDIRECT_IN);
        let output = text.find(REDIRECT_OUT);
        let append = output
            .map(|pos| text[pos + 1..].starts_with(REDIRECT_OUT))
            .unwrap_or(false);
        Self {
            input,
            output,
            append,
        }
    }

    fn output_mode(&self) -> RedirectMode {
        if self.append {
            RedirectMode::Append
        } else {
            RedirectMode::Truncate
        }
    }

    fn output_width(&self) -> usize {
        if self.append {
            2
        } else {
            1
        }
    }

    fn output_operator(&self) -> &'static str {
        if self.append {
            ">>"
        } else {
            ">"
        }
    }
}

/// Builds pipelines from command-unit text
pub struct Planner<'a> {
    tokenizer: Tokenizer<'a>,
}

impl<'a> Planner<'a> {
    pub fn new(tokenizer: Tokenizer<'a>) -> Self {
        Self { tokenizer }
    }

    /// Plan one command unit
    pub fn plan(&self, text: &str) -> Result<Pipeline> {
        let stage_texts: Vec<&str> = text.split(PIPE).collect();
        let count = stage_texts.len();

        if count == 1 && text.trim().is_empty() {
            return Err(Error::EmptyCommand);
        }

        let mut stages = Vec::with_capacity(count);
        for (index, stage_text) in stage_texts.into_iter().enumerate() {
            if stage_text.trim().is_empty() {
                return Err(Error::EmptyPipelineStage { position: index });
            }

            let stage = self.plan_stage(index, stage_text)?;
            if stage.argv.is_empty() {
                return Err(if count == 1 {
                    Error::EmptyCommand
                } else {
                    Error::EmptyPipelineStage { position: index }
                });
            }
            check_placement(&stage, count)?;
            stages.push(stage);
        }

        let pipeline = Pipeline::new(stages).ok_or(Error::EmptyCommand)?;
        debug!(stages = pipeline.len(), "planned pipeline: {}", pipeline);
        Ok(pipeline)
    }

    fn plan_stage(&self, index: usize, text: &str) -> Result<PipelineStage> {
        let ops = Operators::scan(text);

        match (ops.input, ops.output) {
            (Some(in_pos), Some(out_pos)) => self.plan_both(index, text, in_pos, out_pos, ops),
            (Some(in_pos), None) => {
                let (argv, path) = self.split_at_operator(text, in_pos, 1, "<")?;
                let mut stage = PipelineStage::new(index, argv);
                stage.input = Some(RedirectSpec::input(path));
                Ok(stage)
            }
            (None, Some(out_pos)) => {
                let (argv, path) = self.split_at_operator(
                    text,
                    out_pos,
                    ops.output_width(),
                    ops.output_operator(),
                )?;
                let mut stage = PipelineStage::new(index, argv);
                stage.output = Some(RedirectSpec::output(path, ops.output_mode()));
                Ok(stage)
            }
            (None, None) => Ok(PipelineStage::new(index, self.tokenizer.tokenize(text)?)),
        }
    }

    /// One operator: the left side is the command, the first word on the
    /// right side is the file.
    fn split_at_operator(
        &self,
        text: &str,
        pos: usize,
        width: usize,
        operator: &str,
    ) -> Result<(Vec<String>, String)> {
        let argv = self.tokenizer.tokenize(&text[..pos])?;
        let path = split_words(&text[pos + width..])
            .next()
            .ok_or_else(|| Error::MissingRedirectTarget {
                operator: operator.to_string(),
            })?;
        Ok((argv, path.to_string()))
    }

    /// Both operators: split on whitespace and on the operators together.
    /// The two trailing words are the files, assigned by which operator
    /// came first in the text.
    fn plan_both(
        &self,
        index: usize,
        text: &str,
        in_pos: usize,
        out_pos: usize,
        ops: Operators,
    ) -> Result<PipelineStage> {
        if !target_follows(text, out_pos + ops.output_width()) {
            return Err(Error::MissingRedirectTarget {
                operator: ops.output_operator().to_string(),
            });
        }
        if !target_follows(text, in_pos + 1) {
            return Err(Error::MissingRedirectTarget {
                operator: "<".to_string(),
            });
        }

        let words: Vec<&str> = text
            .split(|c: char| c.is_whitespace() || c == REDIRECT_IN || c == REDIRECT_OUT)
            .filter(|w| !w.is_empty())
            .collect();

        // With both targets present, two words plan an empty argv, which
        // `plan` rejects as an empty command.
        let n = words.len();
        if n < 2 {
            return Err(Error::EmptyCommand);
        }
        let (input, output) = if in_pos < out_pos {
            (words[n - 2], words[n - 1])
        } else {
            (words[n - 1], words[n - 2])
        };

        let argv = self.tokenizer.tokenize(&words[..n - 2].join(" "))?;
        let mut stage = PipelineStage::new(index, argv);
        stage.input = Some(RedirectSpec::input(input));
        stage.output = Some(RedirectSpec::output(output, ops.output_mode()));
        Ok(stage)
    }
}

/// Whether a file name follows the operator ending at byte `after`
fn target_follows(text: &str, after: usize) -> bool {
    text[after..]
        .trim_start()
        .chars()
        .next()
        .is_some_and(|c| c != REDIRECT_IN && c != REDIRECT_OUT)
}

fn check_placement(stage: &PipelineStage, count: usize) -> Result<()> {
    if stage.input.is_some() && stage.index > 0 {
        return Err(Error::MisplacedRedirect {
            stage: stage.index,
            operator: "<".to_string(),
        });
    }
    if let Some(output) = &stage.output {
        if stage.index + 1 < count {
            return Err(Error::MisplacedRedirect {
                stage: stage.index,
                operator: output.operator().to_string(),
            });
        }
    }
    Ok(())
}
