//! Version directory allocation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{IngestError, VersionCoordinates};

/// Computes the extraction directory for a version without touching disk.
pub fn version_dir(upload_root: &Path, coords: &VersionCoordinates) -> PathBuf {
    upload_root
        .join(coords.project_id.to_string())
        .join(coords.product_version_id.to_string())
        .join(coords.design_id.to_string())
        .join(&coords.version)
}

/// Creates the version directory, including missing parents. The leaf is
/// created with an exclusive primitive so that two concurrent requests for
/// the same coordinates cannot both proceed; the loser gets `VersionExists`.
pub fn allocate(upload_root: &Path, coords: &VersionCoordinates) -> Result<PathBuf, IngestError> {
    let dir = version_dir(upload_root, coords);
    if let Some(parent) = dir.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::create_dir(&dir) {
        Ok(()) => Ok(dir),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => Err(IngestError::VersionExists),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn coords(version: &str) -> VersionCoordinates {
        VersionCoordinates {
            project_id: Uuid::new_v4(),
            product_version_id: Uuid::new_v4(),
            design_id: Uuid::new_v4(),
            version: version.to_string(),
        }
    }

    #[test]
    fn allocates_nested_directory() {
        let root = tempfile::tempdir().unwrap();
        let coords = coords("1.0.0");

        let dir = allocate(root.path(), &coords).unwrap();

        assert!(dir.is_dir());
        assert_eq!(dir, version_dir(root.path(), &coords));
    }

    #[test]
    fn rejects_reused_version_label() {
        let root = tempfile::tempdir().unwrap();
        let coords = coords("2.0");

        allocate(root.path(), &coords).unwrap();
        let err = allocate(root.path(), &coords).unwrap_err();

        assert!(matches!(err, IngestError::VersionExists));
        assert_eq!(err.to_string(), "version already exists");
    }

    #[test]
    fn distinct_labels_share_parents() {
        let root = tempfile::tempdir().unwrap();
        let mut first = coords("1.0");
        allocate(root.path(), &first).unwrap();

        first.version = "1.1".to_string();
        let second = allocate(root.path(), &first).unwrap();
        assert!(second.is_dir());
    }
}
