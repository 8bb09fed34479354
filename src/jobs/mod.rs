//! Job control
//!
//! - [`table`] - registry of spawned processes and their lifecycle
//! - [`reaper`] - non-blocking collection of child status changes
//! - [`signals`] - shell and child signal dispositions

pub mod reaper;
pub mod signals;
pub mod table;

pub use reaper::Reaper;
pub use signals::SignalFlags;
pub use table::JobTable;
