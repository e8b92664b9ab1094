//! Single-profile correction by walking target and reference in lockstep.
//!
//! Used when a target file holds exactly one profile and its companion
//! reference file holds the same profile. A target sample whose converted value
//! lies within tolerance of an upcoming unmatched reference value is pinned to
//! the nearest such value's timestamp; samples between two pins, including
//! unmatched noise, are spread evenly across the interval.

use tracing::debug;

use crate::config::CorrectionConfig;
use crate::error::CorrectionError;
use crate::model::{CorrectionOutcome, Direction, Profile, ReferenceTuple, Sample};
use crate::reference::trim;

pub struct DirectProfileMatcher<'a, C> {
    config: &'a CorrectionConfig,
    convert: &'a C,
}

/// A target sample bound to a reference timestamp.
#[derive(Debug, Clone, Copy)]
struct Pin {
    index: usize,
    time: f64,
}

impl<'a, C> DirectProfileMatcher<'a, C>
where
    C: Fn(f64) -> f64,
{
    pub fn new(config: &'a CorrectionConfig, convert: &'a C) -> Self {
        Self { config, convert }
    }

    /// Rewrites every target timestamp, or none of them.
    pub fn correct<P>(
        &self,
        target: &mut Profile<Sample<P>>,
        reference: &[ReferenceTuple],
    ) -> CorrectionOutcome {
        self.corrected_times(target, reference)
            .map(|times| {
                for (sample, time) in target.iter_mut().zip(times) {
                    sample.set_timestamp(time);
                }
            })
            .into()
    }

    fn corrected_times<P>(
        &self,
        target: &Profile<Sample<P>>,
        reference: &[ReferenceTuple],
    ) -> Result<Vec<f64>, CorrectionError> {
        let reference = trim(reference, self.config.trim_fraction);
        let (Some(first), Some(last)) = (reference.first(), reference.last()) else {
            return Err(CorrectionError::NoReferenceData);
        };
        let direction = Direction::from_endpoints(first.value, last.value);
        let tolerance = self.config.match_tolerance;

        let mut times: Vec<Option<f64>> = vec![None; target.len()];
        let mut cursor = 0usize;
        let mut previous: Option<Pin> = None;
        let mut first_pin: Option<Pin> = None;
        let mut first_interval: Option<f64> = None;
        let mut last_interval = 0.0;
        let mut matches = 0usize;
        let mut unmatched = 0usize;

        for (index, sample) in target.iter().enumerate() {
            if cursor >= reference.len() {
                break;
            }
            let value = (self.convert)(sample.value());

            // The cursor moves only on a match.
            let Some(offset) = nearest_match(&reference[cursor..], direction, value, tolerance)
            else {
                unmatched += 1;
                continue;
            };
            let bound = cursor + offset;

            let pin = Pin {
                index,
                time: reference[bound].timestamp,
            };
            cursor = bound + 1;
            matches += 1;

            if let Some(prev) = previous {
                let interval = (pin.time - prev.time) / (pin.index - prev.index) as f64;
                for k in prev.index + 1..pin.index {
                    times[k] = Some(prev.time + interval * (k - prev.index) as f64);
                }
                // Pinned exactly so rounding never drifts past a reference time.
                times[pin.index] = Some(pin.time);
                first_interval.get_or_insert(interval);
                last_interval = interval;
            } else {
                first_pin = Some(pin);
                times[pin.index] = Some(pin.time);
            }
            previous = Some(pin);
        }

        let (Some(head), Some(tail), Some(head_interval)) = (first_pin, previous, first_interval)
        else {
            return Err(CorrectionError::NoMatchFound { matches });
        };

        for k in 0..head.index {
            times[k] = Some(head.time - head_interval * (head.index - k) as f64);
        }
        for k in tail.index + 1..times.len() {
            times[k] = Some(tail.time + last_interval * (k - tail.index) as f64);
        }

        debug!(
            matches,
            unmatched,
            first_index = head.index,
            last_index = tail.index,
            samples = target.len(),
            head_interval,
            tail_interval = last_interval,
            "matched target profile against reference"
        );

        Ok(times.into_iter().map(|t| t.unwrap_or_default()).collect())
    }
}

/// Offset into `reference` of the entry `value` binds to. Entries that have
/// not reached `value` are passed over; among the run of entries within
/// `tolerance` that follows, the nearest one wins, earliest on ties.
fn nearest_match(
    reference: &[ReferenceTuple],
    direction: Direction,
    value: f64,
    tolerance: f64,
) -> Option<usize> {
    let mut offset = reference
        .iter()
        .position(|tuple| !lags(direction, tuple.value, value, tolerance))?;
    let mut distance = (reference[offset].value - value).abs();
    if distance > tolerance {
        return None;
    }

    while let Some(next) = reference.get(offset + 1) {
        let next_distance = (next.value - value).abs();
        if next_distance >= distance {
            break;
        }
        offset += 1;
        distance = next_distance;
    }
    Some(offset)
}

/// True while a reference value has not yet reached the target value in the
/// direction of travel.
fn lags(direction: Direction, reference: f64, target: f64, tolerance: f64) -> bool {
    match direction {
        Direction::Ascending => reference < target - tolerance,
        Direction::Descending => reference > target + tolerance,
    }
}
