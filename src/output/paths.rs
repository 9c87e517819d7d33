use super::{OutputResult, IMAGE_STEM};
use crate::OutputError;
use std::fs;
use std::path::{Path, PathBuf};

/// Where an image with the given suffix (".jpg", ".png") goes
///
/// Without an explicit path the image is `artwork<suffix>` inside `dir`. An
/// explicit path keeps its directory and stem but takes the real suffix of
/// the image; a changed suffix is logged.
pub fn image_path(dir: &Path, explicit: Option<&Path>, suffix: &str) -> PathBuf {
    let Some(explicit) = explicit else {
        return dir.join(format!("{}{}", IMAGE_STEM, suffix));
    };

    let current = explicit
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    if current == suffix {
        return explicit.to_path_buf();
    }

    tracing::warn!("Changing file extension: {:?} -> {:?}", current, suffix);
    explicit.with_extension(suffix.trim_start_matches('.'))
}

/// Writes `links` to `path`, one per line
pub fn write_link_list(path: &Path, links: &[String]) -> OutputResult<()> {
    let mut contents = String::new();
    for link in links {
        contents.push_str(link);
        contents.push('\n');
    }
    write_file(path, contents.as_bytes())
}

/// Writes a file, creating its parent directories
pub(super) fn write_file(path: &Path, contents: &[u8]) -> OutputResult<()> {
    let wrap = |source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    fs::write(path, contents).map_err(wrap)
}
