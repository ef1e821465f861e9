use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Refuse to write `output` over the `input` document.
pub fn ensure_distinct_output(output: &Path, input: &Path) -> Result<()> {
    let input = input
        .canonicalize()
        .with_context(|| format!("failed to resolve input path {}", input.display()))?;
    if resolve_output(output)? == input {
        bail!(
            "refusing to overwrite the input document {}; choose another --output",
            input.display()
        );
    }
    Ok(())
}

/// Resolve the output through its parent directory, which must exist for
/// the write to succeed anyway, so `..` and symlinks are handled even when
/// the file itself is new.
fn resolve_output(output: &Path) -> Result<PathBuf> {
    if output.exists() {
        return output
            .canonicalize()
            .with_context(|| format!("failed to resolve output path {}", output.display()));
    }
    let file_name = output
        .file_name()
        .with_context(|| format!("output path {} has no file name", output.display()))?;
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let parent = parent
        .canonicalize()
        .with_context(|| format!("output directory {} does not exist", parent.display()))?;
    Ok(parent.join(file_name))
}
