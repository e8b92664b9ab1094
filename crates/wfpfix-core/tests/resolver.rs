use std::path::{Path, PathBuf};

use wfpfix_core::{
    alternating_offsets, CandidateFileSource, Profile, ProfileResolver, ReferenceTuple,
    ResolutionState, Sample,
};

fn target_profile(start: f64, len: usize) -> Profile<Sample<()>> {
    let samples = (0..len)
        .map(|i| Sample::new(start + i as f64, 1.0, ()))
        .collect();
    Profile::new(samples).expect("target")
}

fn reference_run(start: f64, end: f64) -> Vec<ReferenceTuple> {
    let mut tuples = Vec::new();
    let mut t = start;
    while t <= end {
        tuples.push(ReferenceTuple::new(t, 5.0));
        t += 30.0;
    }
    tuples
}

#[test]
fn starts_pending_on_every_profile() {
    let targets = vec![target_profile(0.0, 10), target_profile(100_000.0, 10)];
    let resolver = ProfileResolver::new(&targets, 3600.0);

    assert_eq!(resolver.state(), ResolutionState::Pending(vec![0, 1]));
    assert!(resolver.is_pending());
}

#[test]
fn resolves_profiles_across_batches() {
    let targets = vec![target_profile(1_000.0, 100), target_profile(200_000.0, 100)];
    let mut resolver = ProfileResolver::new(&targets, 3600.0);

    let resolved = resolver.offer(reference_run(900.0, 1_200.0));
    assert_eq!(resolved, 1);
    assert_eq!(resolver.state(), ResolutionState::Pending(vec![1]));
    assert_eq!(resolver.missing_time_ranges(), vec![(200_000.0, 200_099.0)]);

    let resolved = resolver.offer(reference_run(199_950.0, 200_300.0));
    assert_eq!(resolved, 1);
    assert_eq!(resolver.state(), ResolutionState::AllResolved);
    assert!(!resolver.is_pending());

    let reference = resolver.reference(1).expect("resolved reference");
    assert_eq!(reference.start_time(), 199_950.0);
}

#[test]
fn midpoint_containment_is_inclusive() {
    // Midpoint of a 3-sample profile starting at 10 is element 1, t = 11.
    let targets = vec![target_profile(10.0, 3)];
    let mut resolver = ProfileResolver::new(&targets, 3600.0);

    let resolved = resolver.offer(vec![
        ReferenceTuple::new(0.0, 1.0),
        ReferenceTuple::new(11.0, 2.0),
    ]);

    assert_eq!(resolved, 1);
}

#[test]
fn one_reference_profile_may_serve_several_targets() {
    let targets = vec![target_profile(100.0, 10), target_profile(500.0, 10)];
    let mut resolver = ProfileResolver::new(&targets, 3600.0);

    assert_eq!(resolver.offer(reference_run(0.0, 1_000.0)), 2);
    let references = resolver.into_references();
    let first = references[0].as_ref().expect("first");
    let second = references[1].as_ref().expect("second");
    assert!(std::sync::Arc::ptr_eq(first, second));
}

#[test]
fn exhaustion_reports_still_missing_indices() {
    let targets = vec![target_profile(0.0, 10), target_profile(50_000.0, 10)];
    let mut resolver = ProfileResolver::new(&targets, 3600.0);

    resolver.offer(reference_run(50_000.0, 50_100.0));
    resolver.exhaust();

    assert_eq!(resolver.state(), ResolutionState::ExhaustedCandidates(vec![0]));
    assert!(!resolver.is_pending());
    assert!(resolver.reference(0).is_none());
}

struct NumberedFiles;

impl CandidateFileSource for NumberedFiles {
    fn candidates(&self, primary: &Path, limit: usize) -> Vec<PathBuf> {
        let stem: i64 = primary
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        alternating_offsets(limit)
            .map(|offset| stem + offset)
            .filter(|n| *n >= 0)
            .map(|n| PathBuf::from(format!("{n}.csv")))
            .collect()
    }
}

#[test]
fn candidate_sources_order_by_proximity() {
    let candidates = NumberedFiles.candidates(Path::new("10.csv"), 4);
    assert_eq!(
        candidates,
        vec![
            PathBuf::from("11.csv"),
            PathBuf::from("9.csv"),
            PathBuf::from("12.csv"),
            PathBuf::from("8.csv"),
        ]
    );
}
