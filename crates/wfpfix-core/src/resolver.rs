//! Locating reference profiles for target profiles across neighbouring files.
//!
//! A target file may hold several profiles whose reference data is spread over
//! more than one reference file. The resolver keeps the set of target profiles
//! still lacking a reference and absorbs reference tuples from candidate files,
//! nearest first, until every target is covered or the candidates run out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::model::{Profile, ReferenceTuple, Sample};
use crate::segment::segment;

/// Produces neighbouring reference files for a primary file, nearest first.
///
/// Implementations live with the caller; the engine only sees the tuples the
/// caller extracts from each path.
pub trait CandidateFileSource {
    fn candidates(&self, primary: &Path, limit: usize) -> Vec<PathBuf>;
}

/// Sequence offsets `+1, -1, +2, -2, ...`, `limit` of them.
pub fn alternating_offsets(limit: usize) -> impl Iterator<Item = i64> {
    (1..).flat_map(|step: i64| [step, -step]).take(limit)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    Pending(Vec<usize>),
    AllResolved,
    ExhaustedCandidates(Vec<usize>),
}

pub type SharedReference = Arc<Profile<ReferenceTuple>>;

#[derive(Debug, Clone)]
pub struct ProfileResolver {
    threshold: f64,
    midpoints: Vec<f64>,
    ranges: Vec<(f64, f64)>,
    references: Vec<Option<SharedReference>>,
    missing: Vec<usize>,
    exhausted: bool,
    tuples_seen: usize,
}

impl ProfileResolver {
    /// `threshold` is the gap used to segment offered reference tuples.
    pub fn new<P>(targets: &[Profile<Sample<P>>], threshold: f64) -> Self {
        Self {
            threshold,
            midpoints: targets.iter().map(|profile| profile.midpoint_time()).collect(),
            ranges: targets.iter().map(|profile| profile.time_range()).collect(),
            references: vec![None; targets.len()],
            missing: (0..targets.len()).collect(),
            exhausted: false,
            tuples_seen: 0,
        }
    }

    /// Segments `tuples` into profiles and binds each still-missing target to
    /// the first one containing its midpoint. Returns how many were resolved.
    pub fn offer(&mut self, tuples: Vec<ReferenceTuple>) -> usize {
        self.tuples_seen += tuples.len();
        let profiles: Vec<SharedReference> = segment(tuples, self.threshold)
            .into_iter()
            .map(Arc::new)
            .collect();
        self.offer_profiles(&profiles)
    }

    pub fn offer_profiles(&mut self, profiles: &[SharedReference]) -> usize {
        let before = self.missing.len();
        let midpoints = &self.midpoints;
        let references = &mut self.references;

        self.missing.retain(|&index| {
            let midpoint = midpoints[index];
            match profiles.iter().find(|p| p.contains_time(midpoint)) {
                Some(profile) => {
                    debug!(
                        target_profile = index,
                        reference_start = profile.start_time(),
                        reference_end = profile.end_time(),
                        "resolved reference profile"
                    );
                    references[index] = Some(Arc::clone(profile));
                    false
                }
                None => true,
            }
        });

        before - self.missing.len()
    }

    pub fn is_pending(&self) -> bool {
        !self.missing.is_empty() && !self.exhausted
    }

    pub fn missing(&self) -> &[usize] {
        &self.missing
    }

    /// First and last timestamp of every unresolved target profile.
    pub fn missing_time_ranges(&self) -> Vec<(f64, f64)> {
        self.missing.iter().map(|&index| self.ranges[index]).collect()
    }

    /// Total reference tuples offered so far, across all sources.
    pub fn tuples_seen(&self) -> usize {
        self.tuples_seen
    }

    /// Marks the candidate supply as spent.
    pub fn exhaust(&mut self) {
        if !self.missing.is_empty() {
            info!(
                unresolved = self.missing.len(),
                "candidate reference files exhausted"
            );
        }
        self.exhausted = true;
    }

    pub fn state(&self) -> ResolutionState {
        if self.missing.is_empty() {
            ResolutionState::AllResolved
        } else if self.exhausted {
            ResolutionState::ExhaustedCandidates(self.missing.clone())
        } else {
            ResolutionState::Pending(self.missing.clone())
        }
    }

    pub fn reference(&self, index: usize) -> Option<&SharedReference> {
        self.references.get(index).and_then(Option::as_ref)
    }

    pub fn into_references(self) -> Vec<Option<SharedReference>> {
        self.references
    }
}
