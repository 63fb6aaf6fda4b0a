use clap::Parser;
use dupfind::cli::Cli;
use dupfind::config::Config;
use dupfind::error::ConfigError;
use dupfind::fingerprint::HashAlgorithm;
use dupfind::output::OutputFormat;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
algo = "blake3"
workers = 6
min_size = "2KB"
exclude_ext = ["JPG", ".png"]
ignore = ["*.tmp"]
skip_hidden = true
format = "csv"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).unwrap();

    assert_eq!(config.algo, "blake3");
    assert_eq!(config.workers, 6);
    assert_eq!(config.min_size, 2_048);
    assert_eq!(config.format, OutputFormat::Csv);
    assert!(config.skip_hidden);

    let walker = config.walker_config().unwrap();
    assert_eq!(walker.normalized_exts(), vec![".jpg", ".png"]);
    assert_eq!(walker.ignore_patterns, vec!["*.tmp"]);
}

#[test]
fn test_env_overrides_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "algo = \"md5\"\nworkers = 2\n").unwrap();

    // Scoped variable names so other tests never see them.
    std::env::set_var("DUPFIND_TEST_ALGO", "sha1");
    std::env::set_var("DUPFIND_TEST_MIN_SIZE", "1KiB");
    std::env::set_var("DUPFIND_TEST_EXCLUDE_DIR", "target, node_modules");

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .merge(Env::prefixed("DUPFIND_TEST_"))
        .extract()
        .unwrap();

    std::env::remove_var("DUPFIND_TEST_ALGO");
    std::env::remove_var("DUPFIND_TEST_MIN_SIZE");
    std::env::remove_var("DUPFIND_TEST_EXCLUDE_DIR");

    assert_eq!(config.algo, "sha1");
    assert_eq!(config.workers, 2);
    assert_eq!(config.min_size, 1024);
    assert_eq!(config.exclude_dir, vec!["target", "node_modules"]);
}

#[test]
fn test_cli_overrides_every_layer() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "algo = \"md5\"\nformat = \"json\"\nmin_size = 0\n").unwrap();

    let mut config = Config::load_from_path(&config_path).unwrap();
    let cli = Cli::try_parse_from([
        "dupfind",
        "/data",
        "--algo",
        "xxh3",
        "--workers",
        "5",
        "--format",
        "paths",
    ])
    .unwrap();
    config.merge_cli(&cli);

    let fingerprint = config.fingerprint_config().unwrap();
    assert_eq!(fingerprint.algorithm(), HashAlgorithm::Xxh3);
    assert_eq!(fingerprint.workers(), 5);
    assert_eq!(config.format, OutputFormat::Paths);
    // Not given on the command line, so the file value stays.
    assert_eq!(config.min_size, 0);
}

#[test]
fn test_unknown_algorithm_suggests_closest() {
    let cli = Cli::try_parse_from(["dupfind", "/data", "--algo", "blake2"]).unwrap();
    let mut config = Config::default();
    config.merge_cli(&cli);

    let err = config.fingerprint_config().unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnknownAlgorithm {
            name: "blake2".into(),
            suggestion: Some("blake3"),
        }
    );
}

#[test]
fn test_zero_workers_rejected() {
    let cli = Cli::try_parse_from(["dupfind", "/data", "--workers", "0"]).unwrap();
    let mut config = Config::default();
    config.merge_cli(&cli);
    assert_eq!(config.fingerprint_config(), Err(ConfigError::ZeroWorkers));
}

#[test]
fn test_invalid_toml_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "algo = [unclosed").unwrap();

    assert!(matches!(
        Config::load_from_path(&config_path),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_invalid_size_in_file_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "min_size = \"lots\"\n").unwrap();

    assert!(Config::load_from_path(&config_path).is_err());
}

#[test]
fn test_explicit_config_file_is_used() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("dupfind.toml");
    fs::write(&config_path, "follow_symlinks = true\n").unwrap();

    let config = Config::load(Some(config_path.as_path())).unwrap();
    assert!(config.follow_symlinks);
}
