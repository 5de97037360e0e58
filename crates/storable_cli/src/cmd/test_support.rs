use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::OnceLock;

static STORABLE_BIN: OnceLock<PathBuf> = OnceLock::new();

pub(crate) fn fixture_path(name: &str) -> PathBuf {
	storable_testkit::fixture_path(name)
}

/// Per-test scratch file under the workspace target directory.
pub(crate) fn scratch_path(name: &str) -> PathBuf {
	let dir = storable_testkit::target_dir().join("storable-cli-tests");
	std::fs::create_dir_all(&dir).expect("scratch dir is writable");
	dir.join(name)
}

pub(crate) fn run_storable(args: &[&str]) -> Output {
	Command::new(storable_bin()).args(args).output().expect("storable command executes")
}

pub(crate) fn run_storable_json(args: &[&str]) -> serde_json::Value {
	let output = run_storable(args);
	assert!(
		output.status.success(),
		"storable command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}

fn storable_bin() -> &'static PathBuf {
	STORABLE_BIN.get_or_init(resolve_storable_bin)
}

fn resolve_storable_bin() -> PathBuf {
	if let Ok(path) = std::env::var("CARGO_BIN_EXE_storable") {
		return PathBuf::from(path);
	}

	let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
	let mut bin = storable_testkit::target_dir().join("debug");
	bin.push(if cfg!(windows) { "storable.exe" } else { "storable" });

	let status = Command::new("cargo")
		.current_dir(&manifest_dir)
		.args(["build", "--quiet", "--bin", "storable"])
		.status()
		.expect("cargo build executes");
	assert!(status.success(), "failed to build storable binary at {}", bin.display());

	bin
}
