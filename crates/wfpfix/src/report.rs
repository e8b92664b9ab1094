use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{StringRecord, Writer};
use serde::Serialize;
use wfpfix_core::{format_timestamp, CorrectionOutcome, Profile, Sample, TimeBase, Timestamped};

#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub index: usize,
    pub samples: usize,
    pub start: String,
    pub end: String,
    pub outcome: CorrectionOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub target: String,
    pub mode: &'static str,
    /// Reference sources that were only partly read, as `source: reason`.
    pub interrupted_sources: Vec<String>,
    pub profiles: Vec<ProfileReport>,
}

impl FileReport {
    pub fn corrected_profiles(&self) -> usize {
        self.profiles.iter().filter(|p| p.outcome.corrected).count()
    }
}

pub fn profile_reports(
    profiles: &[Profile<Sample<StringRecord>>],
    outcomes: Vec<CorrectionOutcome>,
    time_base: TimeBase,
) -> Vec<ProfileReport> {
    profiles
        .iter()
        .zip(outcomes)
        .enumerate()
        .map(|(index, (profile, outcome))| ProfileReport {
            index,
            samples: profile.len(),
            start: format_timestamp(profile.start_time(), time_base),
            end: format_timestamp(profile.end_time(), time_base),
            outcome,
        })
        .collect()
}

/// Writes every sample back out with its (possibly corrected) timestamp.
pub fn write_samples<'a>(
    path: &Path,
    headers: &StringRecord,
    timestamp_index: usize,
    samples: impl IntoIterator<Item = &'a Sample<StringRecord>>,
) -> Result<()> {
    let mut writer = Writer::from_path(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    writer.write_record(headers)?;

    for sample in samples {
        let timestamp = sample.timestamp().to_string();
        let row: StringRecord = sample
            .payload()
            .iter()
            .enumerate()
            .map(|(index, field)| {
                if index == timestamp_index {
                    timestamp.as_str()
                } else {
                    field
                }
            })
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_report(path: &Path, report: &FileReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create report file {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)?;
    Ok(())
}
