use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::warn;
use wfpfix_core::{alternating_offsets, CandidateFileSource};

/// File name split as `<prefix><zero-padded sequence>.<extension>`,
/// e.g. `E0000034.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceName {
    pub prefix: String,
    pub sequence: u64,
    pub width: usize,
    pub extension: String,
}

impl SequenceName {
    pub fn parse(file_name: &str) -> Option<Self> {
        let (stem, extension) = file_name.rsplit_once('.')?;
        let digits_start = stem
            .char_indices()
            .rev()
            .take_while(|(_, ch)| ch.is_ascii_digit())
            .last()
            .map(|(index, _)| index)?;
        let (prefix, digits) = stem.split_at(digits_start);

        Some(Self {
            prefix: prefix.to_string(),
            sequence: digits.parse().ok()?,
            width: digits.len(),
            extension: extension.to_string(),
        })
    }

    pub fn with_sequence(&self, sequence: u64) -> String {
        format!(
            "{}{:0width$}.{}",
            self.prefix,
            sequence,
            self.extension,
            width = self.width
        )
    }
}

/// Finds reference files whose sequence number is near the primary's, in the
/// primary's directory or an explicit search directory.
#[derive(Debug, Clone, Default)]
pub struct SequenceNeighborSource {
    pub search_dir: Option<PathBuf>,
}

impl SequenceNeighborSource {
    pub fn new(search_dir: Option<PathBuf>) -> Self {
        Self { search_dir }
    }

    fn directory_for(&self, primary: &Path) -> PathBuf {
        match (&self.search_dir, primary.parent()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(parent)) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn existing_names(&self, dir: &Path, name: &SequenceName) -> HashSet<String> {
        let pattern = format!(
            "{}/{}*.{}",
            Pattern::escape(&dir.to_string_lossy()),
            Pattern::escape(&name.prefix),
            Pattern::escape(&name.extension)
        );

        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("invalid candidate pattern {pattern}: {err}");
                return HashSet::new();
            }
        };

        entries
            .filter_map(|entry| match entry {
                Ok(path) => path.file_name().map(|n| n.to_string_lossy().into_owned()),
                Err(err) => {
                    warn!("could not read candidate path: {err}");
                    None
                }
            })
            .collect()
    }
}

impl CandidateFileSource for SequenceNeighborSource {
    fn candidates(&self, primary: &Path, limit: usize) -> Vec<PathBuf> {
        let Some(name) = primary
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(SequenceName::parse)
        else {
            warn!(
                "reference file {} has no sequence number, skipping neighbour search",
                primary.display()
            );
            return Vec::new();
        };

        let dir = self.directory_for(primary);
        let existing = self.existing_names(&dir, &name);

        alternating_offsets(limit)
            .filter_map(|offset| name.sequence.checked_add_signed(offset))
            .map(|sequence| name.with_sequence(sequence))
            .filter(|candidate| existing.contains(candidate))
            .map(|candidate| dir.join(candidate))
            .collect()
    }
}
