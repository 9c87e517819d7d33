use super::paths::{image_path, write_file};
use super::{OutputResult, DESCRIPTION_FILE, IMAGE_STEM, METADATA_FILE, WORKS_FILE};
use crate::ident::Identifier;
use crate::metadata::{ArtistMetadata, ArtworkMetadata};
use crate::OutputError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Whether a write touched the disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// The file already existed and skip-existing is on
    Skipped(PathBuf),
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(path) | Self::Skipped(path) => path,
        }
    }

    pub fn was_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Files written for one artist
#[derive(Debug, Clone)]
pub struct ArtistArtifacts {
    pub works: PathBuf,
    pub description: PathBuf,
    pub metadata: PathBuf,
}

/// On-disk layout of scraped artifacts
///
/// Every artwork and every artist gets a directory named by its
/// [`Identifier`] under the root.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    skip_existing: bool,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>, skip_existing: bool) -> Self {
        Self {
            root: root.into(),
            skip_existing,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn skip_existing(&self) -> bool {
        self.skip_existing
    }

    pub fn dir(&self, id: &Identifier) -> PathBuf {
        self.root.join(id.as_str())
    }

    pub fn metadata_path(&self, id: &Identifier) -> PathBuf {
        self.dir(id).join(METADATA_FILE)
    }

    /// Image path for `id`; see [`image_path`]
    pub fn image_path(&self, id: &Identifier, explicit: Option<&Path>, suffix: &str) -> PathBuf {
        image_path(&self.dir(id), explicit, suffix)
    }

    /// Whether an existing file should be left alone
    pub fn should_skip(&self, path: &Path) -> bool {
        self.skip_existing && is_nonempty_file(path)
    }

    /// A previously saved default image of `id`, whatever its suffix
    pub fn existing_image(&self, id: &Identifier) -> Option<PathBuf> {
        let entries = fs::read_dir(self.dir(id)).ok()?;
        entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.file_stem().is_some_and(|stem| stem == IMAGE_STEM))
            .find(|path| is_nonempty_file(path))
    }

    /// Whether metadata and image of `id` are both saved and skip-existing
    /// is on
    pub fn artwork_complete(&self, id: &Identifier) -> bool {
        self.should_skip(&self.metadata_path(id)) && self.existing_image(id).is_some()
    }

    /// Writes the metadata document of an artwork
    pub fn write_artwork_metadata(
        &self,
        id: &Identifier,
        metadata: &ArtworkMetadata,
        explicit: Option<&Path>,
    ) -> OutputResult<WriteOutcome> {
        let path = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.metadata_path(id));
        self.write_json(path, metadata)
    }

    /// Metadata saved by an earlier run, if readable
    pub fn read_artwork_metadata(&self, id: &Identifier) -> Option<ArtworkMetadata> {
        let path = self.metadata_path(id);
        let contents = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::warn!("Ignoring unreadable {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Writes image bytes to an already resolved path
    pub fn write_image(&self, path: &Path, bytes: &[u8]) -> OutputResult<WriteOutcome> {
        if self.should_skip(path) {
            tracing::debug!("Keeping existing {}", path.display());
            return Ok(WriteOutcome::Skipped(path.to_path_buf()));
        }
        write_file(path, bytes)?;
        tracing::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(WriteOutcome::Written(path.to_path_buf()))
    }

    pub fn artist_artifacts(&self, artist: &Identifier) -> ArtistArtifacts {
        let dir = self.dir(artist);
        ArtistArtifacts {
            works: dir.join(WORKS_FILE),
            description: dir.join(DESCRIPTION_FILE),
            metadata: dir.join(METADATA_FILE),
        }
    }

    /// Whether every artist artifact exists and skip-existing is on
    pub fn artist_complete(&self, artist: &Identifier) -> bool {
        let files = self.artist_artifacts(artist);
        self.skip_existing
            && is_nonempty_file(&files.works)
            && files.description.is_file()
            && is_nonempty_file(&files.metadata)
    }

    /// Writes the work list, description and metadata of an artist
    ///
    /// The three files are always rewritten together so they describe the
    /// same scrape.
    pub fn write_artist(
        &self,
        artist: &Identifier,
        works: &[String],
        description: &str,
        metadata: &ArtistMetadata,
    ) -> OutputResult<ArtistArtifacts> {
        let files = self.artist_artifacts(artist);

        super::write_link_list(&files.works, works)?;
        write_file(&files.description, description.as_bytes())?;
        write_file(&files.metadata, serde_json::to_string(metadata)?.as_bytes())?;

        tracing::info!(
            "Saved {} works and metadata for {} in {}",
            works.len(),
            artist,
            self.dir(artist).display()
        );
        Ok(files)
    }

    fn write_json<T: Serialize>(&self, path: PathBuf, value: &T) -> OutputResult<WriteOutcome> {
        if self.should_skip(&path) {
            tracing::debug!("Keeping existing {}", path.display());
            return Ok(WriteOutcome::Skipped(path));
        }
        let json = serde_json::to_string(value).map_err(OutputError::Serialize)?;
        write_file(&path, json.as_bytes())?;
        tracing::info!("Wrote {}", path.display());
        Ok(WriteOutcome::Written(path))
    }
}

fn is_nonempty_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}
