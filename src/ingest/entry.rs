//! Entry document resolution.

use std::path::{Component, Path, PathBuf};

use super::walk::{walk_files, WalkFlow, WalkRules};
use super::{EntryMode, IngestError};

const ENTRY_CANDIDATES: &[&str] = &["index.html", "start.html"];

/// Rules for the Axure entry search: `__MACOSX` is never descended into,
/// dotfiles stay visible so an intentionally hidden entry still resolves.
const SEARCH_RULES: WalkRules = WalkRules {
    skip_dirs: &["__MACOSX"],
    skip_hidden: false,
};

/// Locates the renderable entry document inside an extracted version
/// directory and returns its absolute path.
pub fn resolve(version_dir: &Path, mode: &EntryMode) -> Result<PathBuf, IngestError> {
    match mode {
        EntryMode::Axure => find_entry_document(version_dir)?.ok_or(IngestError::NoEntryDocument),
        EntryMode::Html { entry } => resolve_explicit_entry(version_dir, entry),
    }
}

/// Searches for `index.html` or `start.html` (case-insensitive). Files at
/// the current directory level take priority over any match deeper in the
/// tree; descent follows listing order.
fn find_entry_document(version_dir: &Path) -> Result<Option<PathBuf>, IngestError> {
    let mut found = None;
    walk_files(version_dir, &SEARCH_RULES, &mut |path| {
        let is_candidate = path
            .file_name()
            .map(|name| {
                ENTRY_CANDIDATES
                    .iter()
                    .any(|candidate| name.to_string_lossy().eq_ignore_ascii_case(candidate))
            })
            .unwrap_or(false);
        if is_candidate {
            found = Some(path.to_path_buf());
            WalkFlow::Stop
        } else {
            WalkFlow::Continue
        }
    })?;
    Ok(found)
}

fn resolve_explicit_entry(version_dir: &Path, entry: &str) -> Result<PathBuf, IngestError> {
    let entry = entry.trim();
    let entry = if entry.is_empty() { "index.html" } else { entry };

    // The entry must stay inside the version directory.
    let relative = Path::new(entry);
    if !relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        return Err(IngestError::HtmlEntryMissing);
    }

    let candidate = version_dir.join(relative);
    if candidate.is_file() {
        Ok(candidate)
    } else {
        Err(IngestError::HtmlEntryMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"<html></html>").unwrap();
    }

    #[test]
    fn top_level_entry_wins_over_nested_one() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("index.html"));
        touch(&root.path().join("sub/index.html"));

        let entry = resolve(root.path(), &EntryMode::Axure).unwrap();
        assert_eq!(entry, root.path().join("index.html"));
    }

    #[test]
    fn finds_nested_start_html() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("bundle/output/start.html"));

        let entry = resolve(root.path(), &EntryMode::Axure).unwrap();
        assert_eq!(entry, root.path().join("bundle/output/start.html"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("Index.HTML"));

        resolve(root.path(), &EntryMode::Axure).unwrap();
    }

    #[test]
    fn macosx_directory_is_never_descended() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("__MACOSX/index.html"));

        let err = resolve(root.path(), &EntryMode::Axure).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no index.html or start.html found in zip file"
        );
    }

    #[test]
    fn missing_entry_document_is_terminal() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("readme.txt"));

        assert!(matches!(
            resolve(root.path(), &EntryMode::Axure),
            Err(IngestError::NoEntryDocument)
        ));
    }

    #[test]
    fn explicit_entry_resolves_relative_path() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("demo/page.html"));

        let mode = EntryMode::Html {
            entry: " demo/page.html ".to_string(),
        };
        let entry = resolve(root.path(), &mode).unwrap();
        assert_eq!(entry, root.path().join("demo/page.html"));
    }

    #[test]
    fn explicit_entry_defaults_to_index_html() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("index.html"));

        let mode = EntryMode::Html {
            entry: "  ".to_string(),
        };
        let entry = resolve(root.path(), &mode).unwrap();
        assert_eq!(entry, root.path().join("index.html"));
    }

    #[test]
    fn explicit_entry_must_exist_as_regular_file() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("page.html")).unwrap();

        let mode = EntryMode::Html {
            entry: "page.html".to_string(),
        };
        let err = resolve(root.path(), &mode).unwrap_err();
        assert_eq!(err.to_string(), "entry file not found for HTML Demo");
    }

    #[test]
    fn explicit_entry_cannot_escape_version_directory() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("outside.html"));
        let version_dir = root.path().join("v1");
        fs::create_dir_all(&version_dir).unwrap();

        let mode = EntryMode::Html {
            entry: "../outside.html".to_string(),
        };
        assert!(matches!(
            resolve(&version_dir, &mode),
            Err(IngestError::HtmlEntryMissing)
        ));
    }
}
