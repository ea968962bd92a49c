//! Integration test utilities for the VSL front end

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use vsl_driver::{Compilation, DriverConfig};

/// Directory holding the JSON syntax tree fixtures
#[must_use]
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Path of the fixture called `name`
#[must_use]
pub fn fixture_path(name: &str) -> PathBuf {
    fixtures_dir().join(format!("{name}.json"))
}

/// Loads a fixture without running any phase
///
/// # Errors
///
/// Returns an error if the fixture is missing or not a valid tree
pub fn load_fixture(name: &str, config: DriverConfig) -> Result<Compilation> {
    Compilation::load(fixture_path(name), config)
}

/// Loads a fixture and runs the configured phases
///
/// # Errors
///
/// Returns an error if loading or a phase fails
pub fn compile_fixture(name: &str, config: DriverConfig) -> Result<Compilation> {
    let mut compilation = load_fixture(name, config)?;
    compilation.run()?;
    Ok(compilation)
}

/// Writes `json` to a temporary file that lives as long as the handle
///
/// # Errors
///
/// Returns an error if the file cannot be created or written
pub fn write_tree(json: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().context("Failed to create temporary tree file")?;
    file.write_all(json.as_bytes())
        .context("Failed to write temporary tree file")?;
    Ok(file)
}
