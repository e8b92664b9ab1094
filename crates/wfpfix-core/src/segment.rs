use crate::model::{Profile, Timestamped};

/// Splits a time-ordered sequence into profiles wherever the gap between
/// neighbours is strictly greater than `threshold` seconds.
pub fn segment_by<T, F>(
    items: impl IntoIterator<Item = T>,
    time_of: F,
    threshold: f64,
) -> Vec<Profile<T>>
where
    F: Fn(&T) -> f64,
{
    let mut profiles: Vec<Profile<T>> = Vec::new();

    for item in items {
        let split = match profiles.last() {
            Some(current) => time_of(&item) - time_of(current.last()) > threshold,
            None => true,
        };

        match profiles.last_mut() {
            Some(current) if !split => current.push(item),
            _ => profiles.extend(Profile::new(vec![item])),
        }
    }

    profiles
}

pub fn segment<T: Timestamped>(
    items: impl IntoIterator<Item = T>,
    threshold: f64,
) -> Vec<Profile<T>> {
    segment_by(items, |item: &T| item.timestamp(), threshold)
}
