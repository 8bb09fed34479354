//! Command parsing
//!
//! Raw line → [`segmenter`] → command units → [`planner`] (using the
//! [`tokenizer`] and [`glob`] expansion per stage) → [`Pipeline`].

pub mod glob;
pub mod planner;
pub mod segmenter;
pub mod tokenizer;

pub use glob::{FilesystemGlob, GlobExpander};
pub use planner::Planner;
pub use segmenter::segment;
pub use tokenizer::{Tokenizer, DEFAULT_MAX_TOKENS};

use crate::error::Result;
use crate::models::Pipeline;

/// Plan one command unit's text with the given glob collaborator
pub fn plan_unit(text: &str, glob: &dyn GlobExpander, max_tokens: usize) -> Result<Pipeline> {
    let tokenizer = Tokenizer::new(glob).with_max_tokens(max_tokens);
    Planner::new(tokenizer).plan(text)
}
