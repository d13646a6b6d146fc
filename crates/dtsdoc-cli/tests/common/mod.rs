#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared config file that turns markdown saving off.
fn config_file() -> &'static Path {
    static CONFIG: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
    let (_dir, path) = CONFIG.get_or_init(|| {
        let dir = tempfile::tempdir().expect("failed to create config dir for tests");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\nsave_docs = false\n").expect("failed to write config");
        (dir, path)
    });
    path
}

/// Create a configured `dtsdoc` command using `cache_dir` as its cache root.
#[allow(dead_code)]
pub fn dtsdoc_cmd(cache_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dtsdoc"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env("DTSDOC_CONFIG", config_file());
    cmd.env("DTSDOC_CACHE_DIR", cache_dir);
    cmd.env_remove("DTSDOC_BASE_URL");
    cmd.env("NO_COLOR", "1");
    cmd
}

/// The `Marker` page fixture shared with the core crate.
#[allow(dead_code)]
pub fn marker_fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../dtsdoc-core/tests/fixtures/Marker.html")
}
