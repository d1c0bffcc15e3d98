//! Zip extraction with traversal protection and staged-file cleanup.

use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek};
use std::path::Path;

use tracing::warn;
use zip::ZipArchive;

use super::{IngestError, UploadedArchive};

/// Extracts the uploaded archive into `dest`. The staged on-disk file is
/// preferred when it exists; the in-memory buffer is the fallback. Entries
/// whose names escape `dest` are skipped. The staged file is deleted on every
/// exit path, including panics, via a drop guard.
pub fn extract(upload: &UploadedArchive, dest: &Path) -> Result<(), IngestError> {
    let _cleanup = StagedCleanup(upload.staged_path.as_deref());

    let staged = upload.staged_path.as_deref().filter(|path| path.exists());
    match (staged, upload.bytes.as_ref()) {
        (Some(path), _) => {
            let file = File::open(path).map_err(invalid)?;
            extract_entries(file, dest)
        }
        (None, Some(bytes)) => extract_entries(Cursor::new(bytes.as_ref()), dest),
        (None, None) => Err(IngestError::MissingUpload),
    }
}

fn extract_entries<R: Read + Seek>(reader: R, dest: &Path) -> Result<(), IngestError> {
    let mut archive = ZipArchive::new(reader).map_err(invalid)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(invalid)?;
        let enclosed = match entry.enclosed_name() {
            Some(name) => name,
            None => {
                warn!(name = %entry.name(), "skipping archive entry escaping the target directory");
                continue;
            }
        };

        let out_path = dest.join(enclosed);
        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(invalid)?;
        } else {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).map_err(invalid)?;
            }
            let mut out_file = File::create(&out_path).map_err(invalid)?;
            io::copy(&mut entry, &mut out_file).map_err(invalid)?;
        }
    }

    Ok(())
}

fn invalid<E: Into<anyhow::Error>>(err: E) -> IngestError {
    IngestError::InvalidArchive(err.into())
}

/// Best-effort removal of the staged upload file when dropped.
struct StagedCleanup<'a>(Option<&'a Path>);

impl Drop for StagedCleanup<'_> {
    fn drop(&mut self) {
        if let Some(path) = self.0 {
            let _ = fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    use bytes::Bytes;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn stage(dir: &Path, bytes: &[u8]) -> PathBuf {
        let path = dir.join("upload.zip");
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn extracts_from_memory_buffer() {
        let dest = tempfile::tempdir().unwrap();
        let bytes = build_zip(&[("index.html", "<html></html>"), ("css/site.css", "body{}")]);

        let upload = UploadedArchive {
            staged_path: None,
            bytes: Some(Bytes::from(bytes)),
        };
        extract(&upload, dest.path()).unwrap();

        assert!(dest.path().join("index.html").is_file());
        assert!(dest.path().join("css/site.css").is_file());
    }

    #[test]
    fn prefers_staged_file_and_deletes_it() {
        let staging = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let staged = stage(staging.path(), &build_zip(&[("start.html", "hi")]));

        let upload = UploadedArchive {
            staged_path: Some(staged.clone()),
            bytes: None,
        };
        extract(&upload, dest.path()).unwrap();

        assert!(dest.path().join("start.html").is_file());
        assert!(!staged.exists());
    }

    #[test]
    fn falls_back_to_buffer_when_staged_file_is_gone() {
        let dest = tempfile::tempdir().unwrap();
        let bytes = build_zip(&[("index.html", "hi")]);

        let upload = UploadedArchive {
            staged_path: Some(PathBuf::from("/nonexistent/upload.zip")),
            bytes: Some(Bytes::from(bytes)),
        };
        extract(&upload, dest.path()).unwrap();

        assert!(dest.path().join("index.html").is_file());
    }

    #[test]
    fn fails_without_any_source() {
        let dest = tempfile::tempdir().unwrap();
        let err = extract(&UploadedArchive::default(), dest.path()).unwrap_err();
        assert_eq!(err.to_string(), "upload tmp file not found");
    }

    #[test]
    fn corrupt_archive_fails_but_staged_file_is_still_deleted() {
        let staging = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let staged = stage(staging.path(), b"this is not a zip archive");

        let upload = UploadedArchive {
            staged_path: Some(staged.clone()),
            bytes: None,
        };
        let err = extract(&upload, dest.path()).unwrap_err();

        assert_eq!(err.to_string(), "invalid zip file");
        assert!(!staged.exists());
    }

    #[test]
    fn traversal_entries_are_skipped() {
        let parent = tempfile::tempdir().unwrap();
        let dest = parent.path().join("versions/1.0");
        fs::create_dir_all(&dest).unwrap();
        let bytes = build_zip(&[
            ("ok.txt", "fine"),
            ("../escape.txt", "evil"),
            ("nested/../../escape2.txt", "evil"),
        ]);

        let upload = UploadedArchive {
            staged_path: None,
            bytes: Some(Bytes::from(bytes)),
        };
        extract(&upload, &dest).unwrap();

        assert!(dest.join("ok.txt").is_file());
        assert!(!parent.path().join("versions/escape.txt").exists());
        assert!(!parent.path().join("escape2.txt").exists());
        assert!(!parent.path().join("versions/escape2.txt").exists());
    }
}
