//! Archive ingestion pipeline for design versions.
//!
//! A creation request runs strictly in order: allocate the version directory
//! (fail fast on collision), extract the uploaded archive into it, rewrite
//! font references for offline use (best effort), resolve the entry document,
//! and hand the derived preview path back to the caller for persistence. Any
//! fatal step leaves the directory debris in place; no record is written for
//! a failed ingestion.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;

pub mod archive;
pub mod entry;
pub mod fonts;
pub mod paths;
pub mod walk;

/// Public mount under which extracted bundles are served as static files.
pub const PREVIEW_MOUNT: &str = "/prototypes";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("version already exists")]
    VersionExists,
    #[error("upload tmp file not found")]
    MissingUpload,
    #[error("invalid zip file")]
    InvalidArchive(#[source] anyhow::Error),
    #[error("no index.html or start.html found in zip file")]
    NoEntryDocument,
    #[error("entry file not found for HTML Demo")]
    HtmlEntryMissing,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<IngestError> for AppError {
    fn from(value: IngestError) -> Self {
        match value {
            IngestError::Io(err) => AppError::internal(err),
            other => AppError::bad_request(other.to_string()),
        }
    }
}

/// Identifies the extraction directory of one design version:
/// `<uploadRoot>/<projectId>/<productVersionId>/<designId>/<version>`.
#[derive(Debug, Clone)]
pub struct VersionCoordinates {
    pub project_id: Uuid,
    pub product_version_id: Uuid,
    pub design_id: Uuid,
    pub version: String,
}

/// How the renderable entry document is located inside the extracted tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryMode {
    /// Search the tree for `index.html` / `start.html`, current directory
    /// before subdirectories. Font references are rewritten in this mode.
    Axure,
    /// The caller names the entry file relative to the version directory.
    Html { entry: String },
}

impl EntryMode {
    pub fn kind(&self) -> &'static str {
        match self {
            EntryMode::Axure => "axure",
            EntryMode::Html { .. } => "html",
        }
    }
}

/// An uploaded archive, staged on disk, held in memory, or both. The staged
/// file is preferred when it exists and is always deleted after extraction.
#[derive(Debug, Default)]
pub struct UploadedArchive {
    pub staged_path: Option<PathBuf>,
    pub bytes: Option<Bytes>,
}

/// Outcome of a successful ingestion, ready to be persisted.
#[derive(Debug)]
pub struct PreparedVersion {
    pub preview_path: String,
    pub rewritten_files: usize,
}

pub fn ingest(
    upload_root: &Path,
    coords: &VersionCoordinates,
    mode: &EntryMode,
    upload: UploadedArchive,
) -> Result<PreparedVersion, IngestError> {
    let version_dir = match paths::allocate(upload_root, coords) {
        Ok(dir) => dir,
        Err(err) => {
            // Collision happens before extraction ever touches the staged
            // file, so it has to be dropped here.
            if let Some(path) = upload.staged_path.as_deref() {
                let _ = fs::remove_file(path);
            }
            return Err(err);
        }
    };
    archive::extract(&upload, &version_dir)?;

    let mut rewritten_files = 0;
    if matches!(mode, EntryMode::Axure) {
        let report = fonts::rewrite_tree(&version_dir);
        for warning in &report.warnings {
            warn!(
                path = %warning.path.display(),
                reason = %warning.reason,
                "font rewrite skipped a file"
            );
        }
        rewritten_files = report.rewritten;
    }

    let entry_file = entry::resolve(&version_dir, mode)?;
    let preview_path = preview_path(upload_root, &entry_file)?;

    info!(
        design_id = %coords.design_id,
        version = %coords.version,
        kind = mode.kind(),
        rewritten_files,
        preview_path = %preview_path,
        "design version ingested"
    );

    Ok(PreparedVersion {
        preview_path,
        rewritten_files,
    })
}

/// Deletes the extracted directory tree of a version. A missing directory is
/// not an error; the record owns the tree and removal keeps them in lockstep.
pub fn remove_version_dir(upload_root: &Path, coords: &VersionCoordinates) -> io::Result<()> {
    let version_dir = paths::version_dir(upload_root, coords);
    if version_dir.exists() {
        fs::remove_dir_all(&version_dir)?;
    }
    Ok(())
}

fn preview_path(upload_root: &Path, entry_file: &Path) -> Result<String, IngestError> {
    let relative = entry_file.strip_prefix(upload_root).map_err(|_| {
        io::Error::other(format!(
            "entry document {} resolved outside the upload root",
            entry_file.display()
        ))
    })?;
    let segments: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(format!("{PREVIEW_MOUNT}/{}", segments.join("/")))
}
