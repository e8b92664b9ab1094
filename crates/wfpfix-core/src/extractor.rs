use std::fmt::Display;

use tracing::{debug, warn};

use crate::error::CorrectionError;
use crate::model::ReferenceTuple;

/// A parsed reference-stream record.
pub trait ReferenceRecord {
    /// Stream (particle type) name the record belongs to.
    fn stream(&self) -> &str;
    fn timestamp(&self) -> f64;
    /// Named physical field, already in reference units.
    fn field(&self, name: &str) -> Option<f64>;
}

/// Which stream and field of the reference records carry the correlating value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSelector {
    pub stream: String,
    pub field: String,
}

impl ReferenceSelector {
    pub fn new(stream: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            field: field.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub tuples: Vec<ReferenceTuple>,
    /// Set when the record stream failed mid-read; `tuples` holds what was
    /// collected before the failure.
    pub interrupted: Option<String>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn interruption(&self) -> Option<CorrectionError> {
        self.interrupted
            .as_ref()
            .map(|message| CorrectionError::ReferenceInterrupted {
                collected: self.tuples.len(),
                message: message.clone(),
            })
    }
}

/// Builds time-value tuples from a reference record stream.
///
/// Records are skipped until one value exceeds `floor`; from then on every
/// matching record is accepted, including later values near zero.
pub fn extract_reference<I, R, E>(
    records: I,
    selector: &ReferenceSelector,
    floor: f64,
) -> Extraction
where
    I: IntoIterator<Item = Result<R, E>>,
    R: ReferenceRecord,
    E: Display,
{
    let mut extraction = Extraction::default();
    let mut deployed = false;
    let mut skipped = 0usize;

    for record in records {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    collected = extraction.tuples.len(),
                    "reference stream interrupted: {err}"
                );
                extraction.interrupted = Some(err.to_string());
                break;
            }
        };

        if record.stream() != selector.stream {
            continue;
        }
        let Some(value) = record.field(&selector.field) else {
            continue;
        };

        if !deployed {
            if value > floor {
                deployed = true;
            } else {
                skipped += 1;
                continue;
            }
        }

        extraction
            .tuples
            .push(ReferenceTuple::new(record.timestamp(), value));
    }

    debug!(
        tuples = extraction.tuples.len(),
        skipped, "extracted reference tuples"
    );
    extraction
}
