use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::config::CorrectionConfig;
use crate::direct::DirectProfileMatcher;
use crate::error::{CorrectionError, Severity};
use crate::extractor::Extraction;
use crate::interpolate::InterpolationProfileCorrector;
use crate::model::{CorrectionOutcome, Profile, ReferenceTuple, Sample};
use crate::resolver::{ProfileResolver, ResolutionState};
use crate::segment::segment;
use crate::time::format_timestamp;

/// Reference tuples extracted by the caller from one candidate source.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateReference {
    /// Label used in logs, usually the file path.
    pub source: String,
    pub tuples: Vec<ReferenceTuple>,
    /// Set when the source was only partly read.
    pub interrupted: Option<String>,
}

impl CandidateReference {
    pub fn new(source: impl Into<String>, tuples: Vec<ReferenceTuple>) -> Self {
        Self {
            source: source.into(),
            tuples,
            interrupted: None,
        }
    }

    pub fn from_extraction(source: impl Into<String>, extraction: Extraction) -> Self {
        Self {
            source: source.into(),
            tuples: extraction.tuples,
            interrupted: extraction.interrupted,
        }
    }

    fn interruption(&self) -> Option<CorrectionError> {
        self.interrupted
            .as_ref()
            .map(|message| CorrectionError::ReferenceInterrupted {
                collected: self.tuples.len(),
                message: message.clone(),
            })
    }
}

/// Entry point bundling configuration with the target-to-reference unit
/// conversion supplied by the instrument parser.
pub struct Corrector<C> {
    config: CorrectionConfig,
    convert: C,
}

impl<C> Corrector<C>
where
    C: Fn(f64) -> f64 + Sync,
{
    pub fn new(config: CorrectionConfig, convert: C) -> Self {
        Self { config, convert }
    }

    pub fn config(&self) -> &CorrectionConfig {
        &self.config
    }

    /// Splits a file's target samples into profiles.
    pub fn segment_targets<P>(&self, samples: Vec<Sample<P>>) -> Vec<Profile<Sample<P>>> {
        segment(samples, self.config.segmentation_threshold_s)
    }

    /// Single-profile path: the reference source is one profile covering the
    /// same deployment as `target`.
    pub fn correct<P>(
        &self,
        target: &mut Profile<Sample<P>>,
        reference: &[ReferenceTuple],
    ) -> CorrectionOutcome {
        if reference.is_empty() {
            return CorrectionOutcome::uncorrected(CorrectionError::NoReferenceData);
        }
        let outcome =
            DirectProfileMatcher::new(&self.config, &self.convert).correct(target, reference);
        log_outcome(&outcome, 0, target.len());
        outcome
    }

    /// Multi-profile path. `candidates` yields the primary reference source
    /// first, then neighbours nearest first; it is pulled lazily and only while
    /// some target profile still lacks a reference, for at most
    /// `max_candidate_files` neighbours.
    ///
    /// Returns one outcome per target profile, in order.
    pub fn correct_many<P, I>(
        &self,
        targets: &mut [Profile<Sample<P>>],
        candidates: I,
    ) -> Vec<CorrectionOutcome>
    where
        P: Send,
        I: IntoIterator<Item = CandidateReference>,
    {
        let mut resolver = ProfileResolver::new(targets, self.config.segmentation_threshold_s);
        let limit = self.config.max_candidate_files.saturating_add(1);
        let mut searched = 0usize;
        // Profiles resolved from a partly read source.
        let mut caveats: Vec<Option<CorrectionError>> = vec![None; targets.len()];

        let mut candidates = candidates.into_iter().take(limit);
        while resolver.is_pending() {
            let Some(candidate) = candidates.next() else {
                resolver.exhaust();
                break;
            };
            searched += 1;
            let tuples = candidate.tuples.len();
            let interruption = candidate.interruption();
            let before = resolver.missing().to_vec();
            let resolved = resolver.offer(candidate.tuples);
            if let Some(interruption) = interruption {
                for &index in before.iter().filter(|&&i| !resolver.missing().contains(&i)) {
                    caveats[index] = Some(interruption.clone());
                }
            }
            info!(
                source = %candidate.source,
                tuples,
                resolved,
                still_missing = resolver.missing().len(),
                "searched reference source"
            );
            for (start, end) in resolver.missing_time_ranges() {
                debug!(
                    start = %format_timestamp(start, self.config.time_base),
                    end = %format_timestamp(end, self.config.time_base),
                    "profile still missing a reference"
                );
            }
        }

        let unresolved: Vec<usize> = match resolver.state() {
            ResolutionState::AllResolved => Vec::new(),
            ResolutionState::ExhaustedCandidates(missing) | ResolutionState::Pending(missing) => {
                missing
            }
        };
        let no_reference_data = resolver.tuples_seen() == 0;
        info!(
            profiles = targets.len(),
            searched,
            unresolved = unresolved.len(),
            "reference resolution finished"
        );

        let references = resolver.into_references();
        let corrector = InterpolationProfileCorrector::new(&self.config, &self.convert);
        let time_base = self.config.time_base;

        targets
            .par_iter_mut()
            .zip(references.par_iter().zip(caveats))
            .enumerate()
            .map(|(index, (target, (reference, caveat)))| {
                let outcome = match reference {
                    Some(reference) => {
                        let outcome = corrector.correct(target, reference);
                        match caveat {
                            Some(cause) if outcome.corrected => {
                                CorrectionOutcome::corrected_with_warning(cause)
                            }
                            _ => outcome,
                        }
                    }
                    None if no_reference_data => {
                        CorrectionOutcome::uncorrected(CorrectionError::NoReferenceData)
                    }
                    None => {
                        let (start, end) = target.time_range();
                        CorrectionOutcome::uncorrected(CorrectionError::ProfileUnresolved {
                            start: format_timestamp(start, time_base),
                            end: format_timestamp(end, time_base),
                        })
                    }
                };
                log_outcome(&outcome, index, target.len());
                outcome
            })
            .collect()
    }
}

fn log_outcome(outcome: &CorrectionOutcome, profile: usize, samples: usize) {
    let Some(warning) = &outcome.warning else {
        return;
    };
    match outcome.severity() {
        Some(Severity::Error) => error!(profile, samples, "{warning}"),
        _ => warn!(profile, samples, "{warning}"),
    }
}
