use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Input extensions, compared case-insensitively.
pub const INPUT_EXTENSIONS: [&str; 2] = ["wav", "wave"];
pub const OUTPUT_EXTENSION: &str = "mp3";

/// Lists the convertible files directly inside `dir`, sorted by name.
///
/// Subdirectories and other non-regular entries are skipped, as are names
/// that are not valid UTF-8.
pub fn discover_inputs(dir: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();

        if !has_input_extension(&path) {
            continue;
        }

        // follows symlinks, so a link to a regular file is accepted
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                log::debug!("Skipping {}: not a regular file", path.display());
                continue;
            }
            Err(e) => {
                log::warn!("Skipping {}: {e}", path.display());
                continue;
            }
        }

        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => log::warn!("Skipping {}: name is not valid UTF-8", name.to_string_lossy()),
        }
    }

    names.sort();
    Ok(names)
}

pub fn has_input_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            INPUT_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Output path for an input: same directory and stem, `.mp3` extension.
pub fn output_path(input: &Path) -> PathBuf {
    input.with_extension(OUTPUT_EXTENSION)
}
