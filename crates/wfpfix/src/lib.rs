//! File-based harness around `wfpfix-core`: CSV target and reference readers,
//! neighbouring-file discovery and report writing.

pub mod candidates;
pub mod pipeline;
pub mod records;
pub mod report;

pub use candidates::{SequenceName, SequenceNeighborSource};
pub use pipeline::{load_reference, run_direct, run_multi, LinearConversion, RunOptions};
