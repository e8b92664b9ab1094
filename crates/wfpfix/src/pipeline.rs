use std::iter;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use tracing::{info, warn};
use wfpfix_core::{
    extract_reference, CandidateFileSource, CandidateReference, CorrectionConfig,
    CorrectionOutcome, Corrector, Extraction, Profile, ReferenceSelector,
};

use crate::candidates::SequenceNeighborSource;
use crate::records::{read_reference, read_targets};
use crate::report::{profile_reports, write_report, write_samples, FileReport};

/// Linear raw-to-reference unit conversion, `raw * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearConversion {
    pub scale: f64,
    pub offset: f64,
}

impl Default for LinearConversion {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
        }
    }
}

impl LinearConversion {
    pub fn into_fn(self) -> impl Fn(f64) -> f64 + Sync {
        move |raw| raw * self.scale + self.offset
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub target: PathBuf,
    pub reference: PathBuf,
    pub output: PathBuf,
    pub report: Option<PathBuf>,
    pub value_column: String,
    pub selector: ReferenceSelector,
    pub conversion: LinearConversion,
    pub config: CorrectionConfig,
}

/// Loads one reference file, returning whatever could be extracted. Files that
/// can not be opened count as empty.
pub fn load_reference(path: &Path, selector: &ReferenceSelector, floor: f64) -> Extraction {
    match read_reference(path, &selector.stream) {
        Ok(records) => {
            let extraction = extract_reference(records, selector, floor);
            if let Some(message) = &extraction.interrupted {
                warn!(
                    "reference file {} interrupted after {} tuples: {message}",
                    path.display(),
                    extraction.tuples.len()
                );
            }
            extraction
        }
        Err(err) => {
            warn!("skipping reference file {}: {err:#}", path.display());
            Extraction::default()
        }
    }
}

/// Single-profile files: the whole target file is one profile matched
/// directly against the whole reference file.
pub fn run_direct(options: &RunOptions) -> Result<FileReport> {
    let table = read_targets(&options.target, &options.value_column)?;
    let mut profile = Profile::new(table.samples)
        .ok_or_else(|| anyhow!("{} contains no samples", options.target.display()))?;

    let extraction = load_reference(
        &options.reference,
        &options.selector,
        options.config.value_floor,
    );
    let corrector = Corrector::new(options.config.clone(), options.conversion.into_fn());

    let mut outcome = corrector.correct(&mut profile, &extraction.tuples);
    if outcome.corrected {
        if let Some(interruption) = extraction.interruption() {
            outcome = CorrectionOutcome::corrected_with_warning(interruption);
        }
    }

    write_samples(
        &options.output,
        &table.headers,
        table.timestamp_index,
        profile.iter(),
    )?;

    let profiles = [profile];
    let report = FileReport {
        target: options.target.display().to_string(),
        mode: "direct",
        interrupted_sources: extraction
            .interrupted
            .iter()
            .map(|message| format!("{}: {message}", options.reference.display()))
            .collect(),
        profiles: profile_reports(&profiles, vec![outcome], options.config.time_base),
    };
    finish(options, &report)?;
    Ok(report)
}

/// Multi-profile files: profiles are resolved against the primary reference
/// file first, then neighbouring files, and corrected by interpolation.
pub fn run_multi(options: &RunOptions, source: &SequenceNeighborSource) -> Result<FileReport> {
    let table = read_targets(&options.target, &options.value_column)?;
    let corrector = Corrector::new(options.config.clone(), options.conversion.into_fn());
    let mut profiles = corrector.segment_targets(table.samples);
    info!(
        target = %options.target.display(),
        profiles = profiles.len(),
        "segmented target file"
    );

    let neighbours = source.candidates(&options.reference, options.config.max_candidate_files);
    let selector = &options.selector;
    let floor = options.config.value_floor;
    let mut interrupted_sources = Vec::new();
    let candidates = iter::once(options.reference.clone())
        .chain(neighbours)
        .map(|path| {
            let extraction = load_reference(&path, selector, floor);
            let source = path.display().to_string();
            if let Some(message) = &extraction.interrupted {
                interrupted_sources.push(format!("{source}: {message}"));
            }
            CandidateReference::from_extraction(source, extraction)
        });

    let outcomes = corrector.correct_many(&mut profiles, candidates);

    write_samples(
        &options.output,
        &table.headers,
        table.timestamp_index,
        profiles.iter().flat_map(|profile| profile.iter()),
    )?;

    let report = FileReport {
        target: options.target.display().to_string(),
        mode: "multi",
        interrupted_sources,
        profiles: profile_reports(&profiles, outcomes, options.config.time_base),
    };
    finish(options, &report)?;
    Ok(report)
}

fn finish(options: &RunOptions, report: &FileReport) -> Result<()> {
    info!(
        target = %report.target,
        mode = report.mode,
        profiles = report.profiles.len(),
        corrected = report.corrected_profiles(),
        "correction finished"
    );
    if let Some(path) = &options.report {
        write_report(path, report)?;
    }
    Ok(())
}
