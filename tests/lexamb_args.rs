//! Unit tests for `LexambArgs` loading and validation.
#![cfg(feature = "cli")]

use lexical_ambiguity::cli::{self, CliError, LexambArgs};
use lexical_ambiguity::{CancellationToken, ConfigError, RetryPolicy, ScorerConfig};
use ortho_config::OrthoConfig;
use rstest::{fixture, rstest};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::sync::{LazyLock, Mutex, MutexGuard};
use tempfile::NamedTempFile;

#[fixture]
fn temp_toml_file() -> NamedTempFile {
    NamedTempFile::new().unwrap_or_else(|e| panic!("create temp file: {e}"))
}

fn write_toml_content(file: &mut NamedTempFile, content: &str) {
    writeln!(file, "{content}").unwrap_or_else(|e| panic!("write config: {e}"));
}

fn get_config_path(file: &NamedTempFile) -> &str {
    file.path().to_str().unwrap_or_else(|| panic!("path str"))
}

fn load(argv: &[&str]) -> LexambArgs {
    LexambArgs::load_from_iter(argv.iter().copied())
        .unwrap_or_else(|e| panic!("unexpected parse error: {e}"))
}

static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

struct EnvVarGuard {
    key: String,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    fn new(key: &str, val: &str) -> Self {
        let lock = ENV_LOCK
            .lock()
            .unwrap_or_else(|e| panic!("env lock poisoned: {e}"));
        // Safety: process-wide env mutation is synchronised by ENV_LOCK.
        unsafe { env::set_var(key, val) };
        Self {
            key: key.to_owned(),
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        // Safety: process-wide env mutation is synchronised by ENV_LOCK.
        unsafe { env::remove_var(&self.key) };
    }
}

#[rstest]
#[serial]
fn defaults_match_library_defaults() {
    let args = load(&["lexamb"]);
    assert!((args.threshold - lexical_ambiguity::DEFAULT_THRESHOLD).abs() < f32::EPSILON);
    assert_eq!(args.scorer_config(), ScorerConfig::default());
    assert_eq!(args.retry_policy(), RetryPolicy::default());
    assert_eq!(args.request_timeout_ms, 10_000);
    assert_eq!(args.log_level(), "warn");
    assert!(!args.json);
}

#[rstest]
#[serial]
#[case(&["lexamb", "--threshold=0.5"], 0.5)]
#[case(&["lexamb", "--threshold=-0.25"], -0.25)]
fn parses_threshold_flag(#[case] argv: &[&str], #[case] expected: f32) {
    let args = load(argv);
    assert!((args.threshold - expected).abs() < f32::EPSILON);
}

#[rstest]
#[serial]
fn parses_service_flags() {
    let args = load(&[
        "lexamb",
        "--text",
        "bancă",
        "--tokenizer-url",
        "http://teprolin:5000",
        "--embedding-url",
        "http://embed/v1",
        "--workers=2",
        "--max-attempts=5",
        "--json=true",
    ]);
    assert_eq!(args.text.as_deref(), Some("bancă"));
    assert_eq!(args.tokenizer_url.as_deref(), Some("http://teprolin:5000"));
    assert_eq!(args.embedding_url.as_deref(), Some("http://embed/v1"));
    assert_eq!(args.workers, 2);
    assert_eq!(args.retry_policy().max_attempts, 5);
    assert!(args.json);
}

#[rstest]
#[case("--threshold=high")]
#[case("--workers=-1")]
#[case("--json=maybe")]
fn rejects_unparsable_flags(#[case] arg: &str) {
    let result = LexambArgs::load_from_iter(["lexamb", arg]);
    assert!(result.is_err());
}

#[rstest]
#[serial]
fn env_var_sets_threshold() {
    let _guard = EnvVarGuard::new("LEXAMB_THRESHOLD", "0.3");
    let args =
        LexambArgs::load_from_env().unwrap_or_else(|e| panic!("unexpected env parse error: {e}"));
    assert!((args.threshold - 0.3).abs() < f32::EPSILON);
}

#[rstest]
#[serial]
fn env_var_rejects_invalid_workers() {
    let _guard = EnvVarGuard::new("LEXAMB_WORKERS", "many");
    assert!(LexambArgs::load_from_env().is_err());
}

#[rstest]
fn config_file_sets_threshold(mut temp_toml_file: NamedTempFile) {
    write_toml_content(&mut temp_toml_file, "threshold = 0.5\nworkers = 8");
    let path = get_config_path(&temp_toml_file);
    let args = LexambArgs::load_from_config(path)
        .unwrap_or_else(|e| panic!("unexpected config parse error: {e}"));
    assert!((args.threshold - 0.5).abs() < f32::EPSILON);
    assert_eq!(args.workers, 8);
}

#[rstest]
fn config_file_rejects_invalid_threshold(mut temp_toml_file: NamedTempFile) {
    write_toml_content(&mut temp_toml_file, "threshold = \"high\"");
    let path = get_config_path(&temp_toml_file);
    assert!(LexambArgs::load_from_config(path).is_err());
}

#[rstest]
#[serial]
fn precedence_cli_over_env_and_config(mut temp_toml_file: NamedTempFile) {
    let _guard = EnvVarGuard::new("LEXAMB_THRESHOLD", "0.4");
    write_toml_content(&mut temp_toml_file, "threshold = 0.2");
    let path = get_config_path(&temp_toml_file);
    let args = load(&["lexamb", "--threshold=0.9", "--config-path", path]);
    assert!((args.threshold - 0.9).abs() < f32::EPSILON);
}

#[rstest]
#[serial]
fn precedence_env_over_config(mut temp_toml_file: NamedTempFile) {
    let _guard = EnvVarGuard::new("LEXAMB_THRESHOLD", "0.4");
    write_toml_content(&mut temp_toml_file, "threshold = 0.2");
    let path = get_config_path(&temp_toml_file);
    let args = LexambArgs::load_from_env_and_config(path)
        .unwrap_or_else(|e| panic!("unexpected parse error: {e}"));
    assert!((args.threshold - 0.4).abs() < f32::EPSILON);
}

#[rstest]
#[serial]
#[case(&["lexamb", "--threshold=1.5", "--text", "bancă"])]
#[case(&["lexamb", "--threshold=-2", "--text", "bancă"])]
fn run_rejects_threshold_before_contacting_services(#[case] argv: &[&str]) {
    let args = load(argv);
    let result = cli::run(&args, &CancellationToken::new());
    assert!(matches!(
        result,
        Err(CliError::Config(ConfigError::ThresholdOutOfRange(_)))
    ));
}

#[rstest]
#[serial]
#[case(&["lexamb", "--workers=0", "--text", "bancă"], ConfigError::ZeroWorkers)]
#[case(&["lexamb", "--token-timeout-ms=0", "--text", "bancă"], ConfigError::ZeroTokenTimeout)]
#[case(&["lexamb", "--max-attempts=0", "--text", "bancă"], ConfigError::ZeroAttempts)]
fn run_rejects_invalid_limits(#[case] argv: &[&str], #[case] expected: ConfigError) {
    let args = load(argv);
    match cli::run(&args, &CancellationToken::new()) {
        Err(CliError::Config(err)) => assert_eq!(err, expected),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[rstest]
#[serial]
fn run_requires_a_lexicon() {
    let args = load(&["lexamb", "--text", "bancă", "--embedding-url", "http://127.0.0.1:9"]);
    assert!(matches!(
        cli::run(&args, &CancellationToken::new()),
        Err(CliError::MissingLexicon)
    ));
}

#[rstest]
#[serial]
fn run_requires_an_embedding_endpoint(mut temp_toml_file: NamedTempFile) {
    write_toml_content(&mut temp_toml_file, "{}");
    let path = get_config_path(&temp_toml_file);
    let args = load(&["lexamb", "--text", "bancă", "--lexicon-path", path]);
    assert!(matches!(
        cli::run(&args, &CancellationToken::new()),
        Err(CliError::MissingEmbeddingUrl)
    ));
}
