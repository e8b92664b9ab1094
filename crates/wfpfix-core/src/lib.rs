//! Timestamp reconciliation for profiling-instrument streams.
//!
//! A target stream with an imprecise clock is corrected against a co-deployed
//! reference stream that shares a physical variable (pressure) and carries
//! trusted timestamps.

pub mod config;
pub mod direct;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod interpolate;
pub mod model;
pub mod reference;
pub mod resolver;
pub mod segment;
pub mod time;

pub use config::CorrectionConfig;
pub use direct::DirectProfileMatcher;
pub use engine::{CandidateReference, Corrector};
pub use error::{ConfigError, CorrectionError, Severity};
pub use extractor::{extract_reference, Extraction, ReferenceRecord, ReferenceSelector};
pub use interpolate::{InterpolationModel, InterpolationProfileCorrector, Placement};
pub use model::{CorrectionOutcome, Direction, Profile, ReferenceTuple, Sample, Timestamped};
pub use resolver::{alternating_offsets, CandidateFileSource, ProfileResolver, ResolutionState};
pub use segment::{segment, segment_by};
pub use time::{format_timestamp, TimeBase};
