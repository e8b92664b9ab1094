use crate::model::ReferenceTuple;

/// Drops `floor(len * fraction)` tuples from each end of a reference profile,
/// discarding readings taken while the profiler was not yet moving steadily.
pub fn trim(reference: &[ReferenceTuple], fraction: f64) -> &[ReferenceTuple] {
    let count = (reference.len() as f64 * fraction).floor() as usize;
    if count.saturating_mul(2) >= reference.len() {
        return &[];
    }
    &reference[count..reference.len() - count]
}

/// Keeps the first tuple and then every tuple at least `min_spacing` seconds
/// after the previously kept one.
pub fn decimate(points: &[ReferenceTuple], min_spacing: f64) -> Vec<ReferenceTuple> {
    let mut kept: Vec<ReferenceTuple> = Vec::with_capacity(points.len());
    for point in points {
        match kept.last() {
            Some(previous) if point.timestamp - previous.timestamp < min_spacing => {}
            _ => kept.push(*point),
        }
    }
    kept
}
