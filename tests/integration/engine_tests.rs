use dupfind::fingerprint::{FingerprintConfig, FingerprintEngine, HashAlgorithm};
use dupfind::progress::ProgressCallback;
use dupfind::scanner::FileDescriptor;
use dupfind::signal::ShutdownHandler;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

fn write(dir: &Path, name: &str, content: &[u8]) -> FileDescriptor {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    FileDescriptor::new(path, content.len() as u64)
}

fn engine(algo: &str, workers: usize) -> FingerprintEngine {
    FingerprintEngine::new(
        FingerprintConfig::new(algo, workers).unwrap(),
        ShutdownHandler::new(),
    )
}

/// Requests shutdown as soon as the first result is collected.
struct CancelAfterFirst(ShutdownHandler);

impl ProgressCallback for CancelAfterFirst {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}

    fn on_progress(&self, current: usize, _path: &str) {
        if current == 1 {
            self.0.request_shutdown();
        }
    }

    fn on_phase_end(&self, _phase: &str) {}
}

#[test]
fn test_known_digests_through_engine() {
    let dir = tempdir().unwrap();
    let file = write(dir.path(), "hello.txt", b"hello world");

    let cases = [
        ("md5", "5eb63bbbe01eeed093cb22bb8f5acdc3"),
        ("sha1", "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"),
        ("sha256", HELLO_SHA256),
    ];
    for (algo, expected) in cases {
        let outcome = engine(algo, 2).hash_files(vec![file.clone()]).unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].hash(), Some(expected), "{algo}");
    }
}

#[test]
fn test_every_algorithm_produces_hex_of_expected_length() {
    let dir = tempdir().unwrap();
    let file = write(dir.path(), "data.bin", &[7u8; 1000]);

    for algo in HashAlgorithm::ALL {
        let outcome = engine(algo.name(), 1).hash_files(vec![file.clone()]).unwrap();
        let hash = outcome.results[0].hash().unwrap();
        assert_eq!(hash.len(), algo.hex_len(), "{algo}");
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}

#[test]
fn test_identical_content_identical_hash() {
    let dir = tempdir().unwrap();
    let files = vec![
        write(dir.path(), "a", b"hello world"),
        write(dir.path(), "b", b"hello world"),
        write(dir.path(), "c", b"hello worle"),
    ];

    let outcome = engine("sha256", 4).hash_files(files).unwrap();
    let hash_of = |name: &str| {
        outcome
            .results
            .iter()
            .find(|r| r.descriptor.path.ends_with(name))
            .and_then(|r| r.hash())
            .unwrap()
            .to_string()
    };

    assert_eq!(hash_of("a"), HELLO_SHA256);
    assert_eq!(hash_of("a"), hash_of("b"));
    assert_ne!(hash_of("a"), hash_of("c"));
}

#[test]
fn test_multi_chunk_file() {
    let dir = tempdir().unwrap();
    let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let file = write(dir.path(), "big.bin", &content);

    let outcome = engine("blake3", 2).hash_files(vec![file]).unwrap();
    assert_eq!(
        outcome.results[0].hash(),
        Some(blake3::hash(&content).to_hex().as_str())
    );
    assert_eq!(outcome.stats.bytes_hashed, 200_000);
}

#[test]
fn test_empty_file_is_hashed() {
    let dir = tempdir().unwrap();
    let file = write(dir.path(), "empty", b"");

    let outcome = engine("sha256", 1).hash_files(vec![file]).unwrap();
    assert_eq!(
        outcome.results[0].hash(),
        Some("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
    );
}

#[test]
fn test_missing_file_is_reported_not_fatal() {
    let dir = tempdir().unwrap();
    let good = write(dir.path(), "good", b"x");
    let ghost = FileDescriptor::new(dir.path().join("ghost"), 1);

    let outcome = engine("sha256", 2).hash_files(vec![good, ghost]).unwrap();
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.stats.hashed_files, 1);
    assert_eq!(outcome.stats.failed_files, 1);

    let failed = outcome.results.iter().find(|r| !r.is_ok()).unwrap();
    assert!(failed.descriptor.path.ends_with("ghost"));
    assert!(!failed.is_interrupted());
}

#[test]
fn test_each_input_yields_exactly_one_result() {
    let dir = tempdir().unwrap();
    let files: Vec<_> = (0..50)
        .map(|i| write(dir.path(), &format!("f{i}"), format!("content {}", i % 5).as_bytes()))
        .collect();

    let outcome = engine("xxh3", 8).hash_files(files.clone()).unwrap();
    let mut seen: Vec<_> = outcome.results.iter().map(|r| r.descriptor.clone()).collect();
    seen.sort_by(|a, b| a.path.cmp(&b.path));
    let mut expected = files;
    expected.sort_by(|a, b| a.path.cmp(&b.path));
    assert_eq!(seen, expected);
}

#[test]
fn test_accumulators_bounded_by_workers() {
    let dir = tempdir().unwrap();
    let files: Vec<_> = (0..40)
        .map(|i| write(dir.path(), &format!("f{i}"), &[i as u8; 4096]))
        .collect();

    for workers in [1, 3, 8] {
        let outcome = engine("sha1", workers).hash_files(files.clone()).unwrap();
        assert!(outcome.stats.accumulators_created >= 1);
        assert!(outcome.stats.accumulators_created <= workers);
    }
}

#[test]
fn test_cancellation_after_first_result() {
    let dir = tempdir().unwrap();
    let files: Vec<_> = (0..10)
        .map(|i| write(dir.path(), &format!("f{i}"), &vec![i as u8; 256 * 1024]))
        .collect();

    let shutdown = ShutdownHandler::new();
    let engine = FingerprintEngine::new(FingerprintConfig::new("sha256", 2).unwrap(), shutdown.clone())
        .with_progress_callback(Arc::new(CancelAfterFirst(shutdown.clone())));

    let outcome = engine.hash_files(files).unwrap();

    assert!(shutdown.is_shutdown_requested());
    assert!(outcome.results.len() <= 10);
    assert!(!outcome.results.is_empty());
    assert!(outcome.results.iter().all(|r| !r.is_interrupted()));
    if outcome.results.len() < 10 {
        assert!(outcome.stats.interrupted);
    }
}

#[test]
fn test_cancelled_before_start_terminates() {
    let dir = tempdir().unwrap();
    let files: Vec<_> = (0..10)
        .map(|i| write(dir.path(), &format!("f{i}"), b"same"))
        .collect();

    let shutdown = ShutdownHandler::new();
    shutdown.request_shutdown();
    let engine = FingerprintEngine::new(FingerprintConfig::new("md5", 4).unwrap(), shutdown);

    let outcome = engine.hash_files(files).unwrap();
    assert!(outcome.results.len() <= 10);
    assert!(outcome.results.iter().all(|r| !r.is_interrupted()));
}

#[test]
fn test_stream_closes_when_done() {
    let dir = tempdir().unwrap();
    let files: Vec<_> = (0..5)
        .map(|i| write(dir.path(), &format!("f{i}"), b"abc"))
        .collect();

    let stream = engine("sha256", 3).stream(files).unwrap();
    let hashes: Vec<_> = stream.filter_map(|r| r.hash().map(String::from)).collect();

    assert_eq!(hashes.len(), 5);
    assert!(hashes.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_stream_dropped_early_does_not_hang() {
    let dir = tempdir().unwrap();
    let files: Vec<_> = (0..30)
        .map(|i| write(dir.path(), &format!("f{i}"), &[1u8; 8192]))
        .collect();

    let mut stream = engine("sha256", 2).stream(files).unwrap();
    assert!(stream.next().is_some());
    drop(stream);
}
