use dupfind::duplicates::{DuplicateFinder, DuplicateReport, FinderConfig, FinderError};
use dupfind::error::ExitCode;
use dupfind::fingerprint::FingerprintConfig;
use dupfind::output::{write_diagnostics, write_report, OutputFormat};
use dupfind::scanner::{FileDescriptor, WalkerConfig};
use dupfind::signal::ShutdownHandler;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn finder(algo: &str, workers: usize, min_size: u64) -> DuplicateFinder {
    let config = FinderConfig::default()
        .with_fingerprint(FingerprintConfig::new(algo, workers).unwrap())
        .with_walker_config(WalkerConfig {
            min_size,
            ..Default::default()
        });
    DuplicateFinder::new(config, ShutdownHandler::new())
}

fn duplicate_paths(report: &DuplicateReport) -> BTreeSet<PathBuf> {
    report
        .entries()
        .into_iter()
        .map(|(_, _, path)| path.to_path_buf())
        .collect()
}

fn group_sets(report: &DuplicateReport) -> BTreeSet<BTreeSet<PathBuf>> {
    report
        .groups
        .iter()
        .map(|g| g.paths().into_iter().collect())
        .collect()
}

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_scenario_three_of_four_identical() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "A", b"hello world");
    let b = write(dir.path(), "B", b"hello world");
    write(dir.path(), "C", b"different content");
    let d = write(dir.path(), "D", b"hello world");

    let report = finder("sha256", 4, 0).find_duplicates(dir.path()).unwrap();

    assert_eq!(duplicate_paths(&report), BTreeSet::from([a, b, d]));
    assert_eq!(report.groups.len(), 1);
    assert_eq!(
        report.groups[0].hash,
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
    assert_eq!(report.summary.total_files, 4);
    assert_eq!(report.summary.duplicate_files, 2);
    assert_eq!(report.summary.reclaimable_space, 22);
    assert!(!report.is_partial());
}

#[test]
fn test_scenario_pairwise_distinct() {
    let dir = tempdir().unwrap();
    write(dir.path(), "one", b"aaa");
    write(dir.path(), "two", b"bbb");
    write(dir.path(), "three", b"ccc");

    let report = finder("md5", 2, 0).find_duplicates(dir.path()).unwrap();

    assert!(report.entries().is_empty());
    assert!(!report.has_duplicates());
    assert_eq!(report.summary.candidates, 3);
    assert_eq!(report.summary.hashed_files, 3);
}

#[test]
fn test_unique_sizes_are_never_hashed() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"1");
    write(dir.path(), "b", b"22");
    write(dir.path(), "c", b"333");

    let report = finder("sha256", 2, 0).find_duplicates(dir.path()).unwrap();
    assert_eq!(report.summary.candidates, 0);
    assert_eq!(report.summary.eliminated_by_size, 3);
    assert_eq!(report.summary.bytes_hashed, 0);
}

#[test]
fn test_same_size_different_content_split() {
    let dir = tempdir().unwrap();
    let a1 = write(dir.path(), "a1", b"aaaa");
    let a2 = write(dir.path(), "a2", b"aaaa");
    let b1 = write(dir.path(), "b1", b"bbbb");
    let b2 = write(dir.path(), "sub/b2", b"bbbb");
    write(dir.path(), "c", b"cccc");

    let report = finder("xxh3", 3, 0).find_duplicates(dir.path()).unwrap();

    assert_eq!(
        group_sets(&report),
        BTreeSet::from([BTreeSet::from([a1, a2]), BTreeSet::from([b1, b2])])
    );
}

#[test]
fn test_unreadable_file_excluded_group_survives() {
    let dir = tempdir().unwrap();
    let files: Vec<FileDescriptor> = ["x", "y", "z"]
        .iter()
        .map(|name| FileDescriptor::new(write(dir.path(), name, b"same bytes"), 10))
        .chain(std::iter::once(FileDescriptor::new(dir.path().join("vanished"), 10)))
        .collect();

    let report = finder("sha256", 4, 0)
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 3);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].descriptor.path.ends_with("vanished"));
    assert!(!duplicate_paths(&report).contains(&dir.path().join("vanished")));

    let exit = ExitCode::for_outcome(report.has_duplicates(), report.error_count(), false);
    assert_eq!(exit, ExitCode::PartialSuccess);

    let mut stdout = Vec::new();
    write_report(&report, OutputFormat::Plain, exit, &mut stdout).unwrap();
    let stdout = String::from_utf8(stdout).unwrap();
    assert_eq!(stdout.lines().count(), 3);
    assert!(!stdout.contains("vanished"));

    yansi::disable();
    let mut stderr = Vec::new();
    write_diagnostics(&report, &mut stderr).unwrap();
    let stderr = String::from_utf8(stderr).unwrap();
    assert!(stderr.contains("vanished"));
    assert!(stderr.contains("file not found"));
}

#[test]
fn test_worker_count_does_not_change_result() {
    let dir = tempdir().unwrap();
    for i in 0..40 {
        write(
            dir.path(),
            &format!("d{}/f{i}", i % 4),
            format!("payload {}", i % 7).as_bytes(),
        );
    }

    let baseline = group_sets(&finder("sha1", 1, 0).find_duplicates(dir.path()).unwrap());
    assert!(!baseline.is_empty());
    for workers in [2, 3, 8, 16] {
        let report = finder("sha1", workers, 0).find_duplicates(dir.path()).unwrap();
        assert_eq!(group_sets(&report), baseline, "workers = {workers}");
    }
}

#[test]
fn test_rescan_is_idempotent() {
    let dir = tempdir().unwrap();
    for i in 0..12 {
        write(dir.path(), &format!("f{i}"), &[(i % 3) as u8; 512]);
    }

    let first = finder("blake3", 4, 0).find_duplicates(dir.path()).unwrap();
    let second = finder("blake3", 4, 0).find_duplicates(dir.path()).unwrap();
    assert_eq!(group_sets(&first), group_sets(&second));
    assert_eq!(first.entries(), second.entries());
}

#[test]
fn test_default_min_size_skips_empty_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "e1", b"");
    write(dir.path(), "e2", b"");

    assert!(!finder("sha256", 2, 1)
        .find_duplicates(dir.path())
        .unwrap()
        .has_duplicates());

    let report = finder("sha256", 2, 0).find_duplicates(dir.path()).unwrap();
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].size, 0);
}

#[test]
fn test_cancelled_scan_is_partial_not_error() {
    let dir = tempdir().unwrap();
    for i in 0..10 {
        write(dir.path(), &format!("f{i}"), b"dup");
    }

    let shutdown = ShutdownHandler::new();
    shutdown.request_shutdown();
    let finder = DuplicateFinder::new(FinderConfig::default(), shutdown);

    let report = finder.find_duplicates(dir.path()).unwrap();
    assert!(report.is_partial());
    assert_eq!(
        ExitCode::for_outcome(report.has_duplicates(), report.error_count(), report.is_partial()),
        ExitCode::Interrupted
    );
}

#[test]
fn test_root_must_be_directory() {
    let dir = tempdir().unwrap();
    let file = write(dir.path(), "file", b"x");

    assert!(matches!(
        finder("sha256", 1, 0).find_duplicates(&dir.path().join("missing")),
        Err(FinderError::PathNotFound(_))
    ));
    assert!(matches!(
        finder("sha256", 1, 0).find_duplicates(&file),
        Err(FinderError::NotADirectory(_))
    ));
}

#[test]
fn test_json_and_csv_agree_with_plain() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"twin");
    write(dir.path(), "b", b"twin");

    let report = finder("md5", 2, 0).find_duplicates(dir.path()).unwrap();

    let mut json = Vec::new();
    write_report(&report, OutputFormat::Json, ExitCode::Success, &mut json).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(value["duplicates"][0]["files"].as_array().unwrap().len(), 2);
    assert_eq!(value["summary"]["exit_code"], 0);

    let mut csv = Vec::new();
    write_report(&report, OutputFormat::Csv, ExitCode::Success, &mut csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.starts_with("hash,size,path\n"));
}
