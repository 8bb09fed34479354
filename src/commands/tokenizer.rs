//! Tokenizer
//!
//! Turns stage text into an argument vector, expanding wildcard tokens.

use super::glob::{is_pattern, GlobExpander};
use crate::error::{Error, Result};

/// Default argument-vector capacity
pub const DEFAULT_MAX_TOKENS: usize = 1024;

/// Token delimiters
const DELIMITERS: [char; 3] = [' ', '\t', '\n'];

/// Whitespace tokenizer with glob expansion and a bounded token count
pub struct Tokenizer<'a> {
    glob: &'a dyn GlobExpander,
    max_tokens: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(glob: &'a dyn GlobExpander) -> Self {
        Self {
            glob,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Split `text` into words, splicing in glob matches.
    ///
    /// A pattern with no matches, or one the collaborator rejects, is kept
    /// as a literal word.
    pub fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let mut argv = Vec::new();

        for word in split_words(text) {
            if is_pattern(word) {
                match self.glob.expand(word) {
                    Ok(matches) if !matches.is_empty() => {
                        for m in matches {
                            self.push(&mut argv, m)?;
                        }
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => debug!("glob expansion of {:?} failed: {}", word, e),
                }
            }
            self.push(&mut argv, word.to_string())?;
        }

        Ok(argv)
    }

    fn push(&self, argv: &mut Vec<String>, word: String) -> Result<()> {
        if argv.len() >= self.max_tokens {
            return Err(Error::TooManyTokens {
                limit: self.max_tokens,
            });
        }
        argv.push(word);
        Ok(())
    }
}

/// Split on space, tab and newline, dropping empty words
pub fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(DELIMITERS).filter(|w| !w.is_empty())
}
