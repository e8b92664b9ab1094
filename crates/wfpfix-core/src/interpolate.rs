//! Multi-profile correction through a value-to-time interpolation model.
//!
//! When target and reference sample at different values the lockstep matcher
//! finds few pins, so instead a piecewise-linear model of time as a function of
//! value is fitted to the reference profile and evaluated at every target value.

use tracing::debug;

use crate::config::CorrectionConfig;
use crate::error::CorrectionError;
use crate::model::{CorrectionOutcome, Direction, Profile, ReferenceTuple, Sample};
use crate::reference::{decimate, trim};

/// Where a value falls relative to the model's covered range, in travel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    Within,
    After,
}

/// Piecewise-linear time-from-value model over a reference profile.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationModel {
    // Parallel arrays, strictly increasing by value.
    values: Vec<f64>,
    times: Vec<f64>,
    direction: Direction,
    start_value: f64,
    end_value: f64,
}

impl InterpolationModel {
    /// Builds a model from time-ordered nodes. Needs at least two distinct values.
    pub fn new(nodes: &[ReferenceTuple]) -> Result<Self, CorrectionError> {
        let nodes: Vec<ReferenceTuple> = nodes
            .iter()
            .copied()
            .filter(|node| node.value.is_finite() && node.timestamp.is_finite())
            .collect();

        let (Some(first), Some(last)) = (nodes.first(), nodes.last()) else {
            return Err(CorrectionError::ModelUnderdetermined {
                reason: "reference profile has no usable nodes".into(),
            });
        };
        let direction = Direction::from_endpoints(first.value, last.value);
        let (start_value, end_value) = (first.value, last.value);

        let mut sorted = nodes.clone();
        sorted.sort_by(|a, b| a.value.total_cmp(&b.value));
        sorted.dedup_by(|later, earlier| later.value == earlier.value);

        if sorted.len() < 2 {
            return Err(CorrectionError::ModelUnderdetermined {
                reason: format!(
                    "{} reference nodes span fewer than two distinct values",
                    nodes.len()
                ),
            });
        }

        Ok(Self {
            values: sorted.iter().map(|node| node.value).collect(),
            times: sorted.iter().map(|node| node.timestamp).collect(),
            direction,
            start_value,
            end_value,
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Values of the first and last node in time order.
    pub fn endpoints(&self) -> (f64, f64) {
        (self.start_value, self.end_value)
    }

    /// Earliest and latest node times.
    pub fn time_span(&self) -> (f64, f64) {
        self.times
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| {
                (lo.min(t), hi.max(t))
            })
    }

    pub fn placement(&self, value: f64) -> Placement {
        if self.direction.is_before(value, self.start_value) {
            Placement::Before
        } else if self.direction.is_after(value, self.end_value) {
            Placement::After
        } else {
            Placement::Within
        }
    }

    /// Linear interpolation of time at `value`. `None` outside the covered
    /// range; the model never extrapolates.
    pub fn time_for(&self, value: f64) -> Option<f64> {
        let lowest = *self.values.first()?;
        let highest = *self.values.last()?;
        if !(lowest <= value && value <= highest) {
            return None;
        }

        let upper = self.values.partition_point(|v| *v < value);
        if self.values[upper] == value {
            return Some(self.times[upper]);
        }

        let lower = upper - 1;
        let fraction = (value - self.values[lower]) / (self.values[upper] - self.values[lower]);
        Some(self.times[lower] + fraction * (self.times[upper] - self.times[lower]))
    }
}

pub struct InterpolationProfileCorrector<'a, C> {
    config: &'a CorrectionConfig,
    convert: &'a C,
}

impl<'a, C> InterpolationProfileCorrector<'a, C>
where
    C: Fn(f64) -> f64,
{
    pub fn new(config: &'a CorrectionConfig, convert: &'a C) -> Self {
        Self { config, convert }
    }

    /// Trims and decimates `reference` into a model over its steady travel.
    pub fn build_model(
        &self,
        reference: &Profile<ReferenceTuple>,
    ) -> Result<InterpolationModel, CorrectionError> {
        let trimmed = trim(reference.as_slice(), self.config.trim_fraction);
        if trimmed.is_empty() {
            return Err(CorrectionError::NoReferenceData);
        }
        let nodes = decimate(trimmed, self.config.decimation_interval_s);
        InterpolationModel::new(&nodes)
    }

    /// Rewrites every target timestamp, or none of them.
    pub fn correct<P>(
        &self,
        target: &mut Profile<Sample<P>>,
        reference: &Profile<ReferenceTuple>,
    ) -> CorrectionOutcome {
        self.build_model(reference)
            .and_then(|model| self.corrected_times(target, &model))
            .map(|times| {
                for (sample, time) in target.iter_mut().zip(times) {
                    sample.set_timestamp(time);
                }
            })
            .into()
    }

    /// Evaluates `model` for every target sample and backfills the rest.
    pub fn corrected_times<P>(
        &self,
        target: &Profile<Sample<P>>,
        model: &InterpolationModel,
    ) -> Result<Vec<f64>, CorrectionError> {
        let mut times: Vec<Option<f64>> = vec![None; target.len()];
        let mut first_assigned: Option<usize> = None;
        let mut last_assigned: Option<usize> = None;

        for (index, sample) in target.iter().enumerate() {
            let value = (self.convert)(sample.value());
            match model.placement(value) {
                Placement::Before => continue,
                Placement::After => break,
                Placement::Within => {
                    if let Some(time) = model.time_for(value) {
                        times[index] = Some(time);
                        first_assigned.get_or_insert(index);
                        last_assigned = Some(index);
                    }
                }
            }
        }

        let (Some(first), Some(last)) = (first_assigned, last_assigned) else {
            let (start, end) = model.endpoints();
            return Err(CorrectionError::ModelUnderdetermined {
                reason: format!("no target sample lies within model range {start} to {end}"),
            });
        };
        if first == last && target.len() > 1 {
            return Err(CorrectionError::ModelUnderdetermined {
                reason: format!(
                    "only sample {first} of {} lies within the model, can not determine the time interval between samples",
                    target.len()
                ),
            });
        }

        let first_time = times[first].unwrap_or_default();
        let last_time = times[last].unwrap_or_default();
        let avg_interval = if last > first {
            (last_time - first_time) / (last - first) as f64
        } else {
            0.0
        };

        let (start_value, end_value) = model.endpoints();
        let (first_node_time, last_node_time) = model.time_span();
        debug!(
            nodes = model.values().len(),
            start_value,
            end_value,
            first_node_time,
            last_node_time,
            first_index = first,
            last_index = last,
            samples = target.len(),
            avg_interval,
            "interpolation model applied"
        );

        for (k, slot) in times.iter_mut().enumerate().take(first) {
            *slot = Some(first_time - avg_interval * (first - k) as f64);
        }
        for (k, slot) in times.iter_mut().enumerate().skip(last + 1) {
            *slot = Some(last_time + avg_interval * (k - last) as f64);
        }
        fill_interior_gaps(&mut times[first..=last]);

        Ok(times.into_iter().map(|t| t.unwrap_or_default()).collect())
    }
}

/// Linearly interpolates by index across runs of `None` bounded by known times.
/// The first and last slots must be known.
fn fill_interior_gaps(times: &mut [Option<f64>]) {
    let mut anchor = 0usize;
    for index in 1..times.len() {
        let Some(time) = times[index] else {
            continue;
        };
        let start = times[anchor].unwrap_or(time);
        let span = (index - anchor) as f64;
        for gap in anchor + 1..index {
            let fraction = (gap - anchor) as f64 / span;
            times[gap] = Some(start + fraction * (time - start));
        }
        anchor = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_interior_run_linearly() {
        let mut times = vec![Some(10.0), None, None, Some(40.0), None, Some(60.0)];
        fill_interior_gaps(&mut times);
        assert_eq!(
            times,
            vec![
                Some(10.0),
                Some(20.0),
                Some(30.0),
                Some(40.0),
                Some(50.0),
                Some(60.0)
            ]
        );
    }

    #[test]
    fn duplicate_values_keep_first_node() {
        let nodes = vec![
            ReferenceTuple::new(0.0, 1.0),
            ReferenceTuple::new(60.0, 2.0),
            ReferenceTuple::new(120.0, 2.0),
            ReferenceTuple::new(180.0, 3.0),
        ];
        let model = InterpolationModel::new(&nodes).expect("model");
        assert_eq!(model.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(model.time_for(2.0), Some(60.0));
    }
}
