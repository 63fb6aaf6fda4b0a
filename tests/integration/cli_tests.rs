use clap::Parser;
use dupfind::cli::{parse_size, split_list, Cli};
use dupfind::output::OutputFormat;
use std::path::PathBuf;

#[test]
fn test_cli_parse_help() {
    // --help causes an early exit, which is an error in try_parse_from
    let err = Cli::try_parse_from(["dupfind", "--help"]).unwrap_err();
    assert!(!err.use_stderr());
}

#[test]
fn test_cli_usage_error_goes_to_stderr() {
    let err = Cli::try_parse_from(["dupfind", "/p", "--no-such-flag"]).unwrap_err();
    assert!(err.use_stderr());
}

#[test]
fn test_cli_all_flags() {
    let cli = Cli::try_parse_from([
        "dupfind",
        "/data",
        "--algo",
        "md5",
        "--workers",
        "2",
        "--min-size",
        "0",
        "--max-size",
        "10MiB",
        "--exclude-ext",
        "jpg, png",
        "--exclude-dir",
        "node_modules,,target",
        "--exclude-dir",
        ".git",
        "--ignore",
        "*.log",
        "--follow-symlinks",
        "--skip-hidden",
        "--format",
        "csv",
        "--delete",
        "--permanent",
        "-y",
        "--config",
        "/etc/dupfind.toml",
        "--json-errors",
        "-vv",
    ])
    .unwrap();

    assert_eq!(cli.path, PathBuf::from("/data"));
    assert_eq!(cli.algo.as_deref(), Some("md5"));
    assert_eq!(cli.workers, Some(2));
    assert_eq!(cli.min_size, Some(0));
    assert_eq!(cli.max_size, Some(10 * 1_048_576));
    assert_eq!(split_list(&cli.exclude_ext), vec!["jpg", "png"]);
    assert_eq!(
        split_list(&cli.exclude_dir),
        vec!["node_modules", "target", ".git"]
    );
    assert_eq!(cli.ignore_patterns, vec!["*.log"]);
    assert!(cli.follow_symlinks);
    assert!(cli.skip_hidden);
    assert_eq!(cli.format, Some(OutputFormat::Csv));
    assert!(cli.delete);
    assert!(cli.permanent);
    assert!(cli.yes);
    assert_eq!(cli.config, Some(PathBuf::from("/etc/dupfind.toml")));
    assert!(cli.json_errors);
    assert_eq!(cli.verbose, 2);
}

#[test]
fn test_cli_rejects_unknown_format() {
    assert!(Cli::try_parse_from(["dupfind", "/data", "--format", "xml"]).is_err());
}

#[test]
fn test_cli_quiet() {
    let cli = Cli::try_parse_from(["dupfind", "-q", "/data"]).unwrap();
    assert!(cli.quiet);
    assert_eq!(cli.verbose, 0);
}

#[test]
fn test_parse_size_table() {
    let cases = [
        ("1B", 1),
        ("1b", 1),
        ("2KB", 2_048),
        ("2KiB", 2_048),
        ("1.5KiB", 1_536),
        ("3mb", 3_145_728),
        ("1GiB", 1_073_741_824),
    ];
    for (input, expected) in cases {
        assert_eq!(parse_size(input), Ok(expected), "{input}");
    }
    for bad in ["", "-5", "5 XB", "KB"] {
        assert!(parse_size(bad).is_err(), "{bad}");
    }
}
