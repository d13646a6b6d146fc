//! Output helpers: JSON on stdout and saved markdown files.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

/// Write `value` as pretty JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value).context("Failed to serialize JSON output")?;
    writeln!(writer)?;
    Ok(())
}

/// Print `value` as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    write_json(std::io::stdout().lock(), value)
}

/// File name for saved markdown: `Marker.md` or `Marker.add.md`.
#[must_use]
pub fn markdown_file_name(identifier: &str, method: Option<&str>) -> String {
    match method {
        Some(method) => format!("{identifier}.{}.md", sanitize(method)),
        None => format!("{identifier}.md"),
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Save rendered markdown under `dir`, creating it if needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save_markdown(
    dir: &Path,
    identifier: &str,
    method: Option<&str>,
    markdown: &str,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let path = dir.join(markdown_file_name(identifier, method));
    fs::write(&path, markdown).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
