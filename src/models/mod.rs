//! Core data models for mosaicsh
//!
//! Command units and pipelines produced by the parser, and the
//! process records kept by the job table.

pub mod pipeline;
pub mod process_record;

// Re-exports for convenience
pub use pipeline::{
    CommandUnit, Pipeline, PipelineStage, RedirectDirection, RedirectMode, RedirectSpec,
};
pub use process_record::{
    ProcessEvent, ProcessEventKind, ProcessExit, ProcessRecord, ProcessState,
};
