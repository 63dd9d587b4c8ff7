//! CLI command implementations

pub mod convert;
pub mod info;

use anyhow::{Context as _, Result, bail};
use cdl_core::{ColorCollection, Config, Context};
use cdl_io::Format;
use std::path::{Path, PathBuf};

/// Loads the YAML config when one is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Reads any CDL document into `ctx`.
pub fn load_collection(ctx: &mut Context, path: &Path) -> Result<ColorCollection> {
    cdl_io::read_any(ctx, path).with_context(|| format!("Failed to read: {}", path.display()))
}

/// Expands glob patterns. Plain paths pass through untouched so a missing
/// file is reported by the reader.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            files.push(PathBuf::from(pattern));
            continue;
        }
        let before = files.len();
        files.extend(
            glob::glob(pattern)
                .with_context(|| format!("Invalid pattern: {pattern}"))?
                .filter_map(|r| r.ok()),
        );
        if files.len() == before {
            bail!("No files match pattern: {}", pattern);
        }
    }
    Ok(files)
}

/// Parses a comma separated list of format tags, dropping repeats.
pub fn parse_formats(list: &str) -> Result<Vec<Format>> {
    let mut formats = Vec::new();
    for tag in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let format: Format = tag.parse()?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    if formats.is_empty() {
        bail!("No output format given");
    }
    Ok(formats)
}
