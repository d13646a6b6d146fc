//! `dtsdoc parse` and `dtsdoc links`: work on a local HTML page.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use dtsdoc_core::{extract, extract_links};

use crate::error::{CliError, ErrorCategory};
use crate::output::write_json;

fn read_page(file: &Path) -> Result<String> {
    fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

/// Extract `file` and print the record as JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be read or has no class title.
pub fn execute<W: Write>(file: &Path, writer: W) -> Result<()> {
    let markup = read_page(file)?;
    let record = extract(&markup).map_err(|e| {
        CliError::new(
            ErrorCategory::Integrity,
            anyhow::Error::new(e).context(format!("Failed to extract {}", file.display())),
        )
    })?;
    write_json(writer, &record)
}

/// Print the class names `file` links to as JSON.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn links<W: Write>(file: &Path, writer: W) -> Result<()> {
    let markup = read_page(file)?;
    write_json(writer, &extract_links(&markup))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PAGE: &str = r#"<h1 class="page-title">Class: Layer</h1>
        <a href="Marker.html">Marker</a>
        <h4 class="name" id="show"><span class="signature">()</span></h4>"#;

    #[test]
    fn test_parse_prints_record() -> Result<()> {
        let temp = TempDir::new()?;
        let file = temp.path().join("Layer.html");
        fs::write(&file, PAGE)?;

        let mut out = Vec::new();
        execute(&file, &mut out)?;
        let value: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(value["identifier"], "Layer");
        assert_eq!(value["methods"][0]["signature"], "show()");
        Ok(())
    }

    #[test]
    fn test_parse_without_title_is_integrity_error() -> Result<()> {
        let temp = TempDir::new()?;
        let file = temp.path().join("blank.html");
        fs::write(&file, "<p>nothing here</p>")?;

        let err = execute(&file, Vec::new()).unwrap_err();
        assert_eq!(crate::error::exit_code_from_error(&err), 7);
        Ok(())
    }

    #[test]
    fn test_links_prints_names() -> Result<()> {
        let temp = TempDir::new()?;
        let file = temp.path().join("Layer.html");
        fs::write(&file, PAGE)?;

        let mut out = Vec::new();
        links(&file, &mut out)?;
        let names: Vec<String> = serde_json::from_slice(&out)?;
        assert_eq!(names, vec!["Marker"]);
        Ok(())
    }
}
