//! Directory traversal shared by entry resolution and asset post-processing.
//!
//! Files at a directory level are visited before any subdirectory is entered,
//! and descent follows listing order. Exclusions are traversal configuration
//! rather than per-call-site conditionals.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct WalkRules {
    /// Directory names that are never descended into.
    pub skip_dirs: &'static [&'static str],
    /// Skip any directory or file whose name starts with a dot.
    pub skip_hidden: bool,
}

impl WalkRules {
    fn excludes(&self, name: &OsStr, is_dir: bool) -> bool {
        let name = name.to_string_lossy();
        if self.skip_hidden && name.starts_with('.') {
            return true;
        }
        is_dir && self.skip_dirs.iter().any(|skipped| name == *skipped)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum WalkFlow {
    Continue,
    Stop,
}

/// Calls `visit` for every regular file under `dir`, current-level files
/// first, then each subdirectory depth-first. Returning [`WalkFlow::Stop`]
/// from `visit` ends the traversal early.
pub fn walk_files<F>(dir: &Path, rules: &WalkRules, visit: &mut F) -> io::Result<WalkFlow>
where
    F: FnMut(&Path) -> WalkFlow,
{
    let mut subdirs = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if rules.excludes(&entry.file_name(), file_type.is_dir()) {
            continue;
        }
        if file_type.is_dir() {
            subdirs.push(entry.path());
        } else if file_type.is_file() && visit(&entry.path()) == WalkFlow::Stop {
            return Ok(WalkFlow::Stop);
        }
    }

    for subdir in subdirs {
        if walk_files(&subdir, rules, visit)? == WalkFlow::Stop {
            return Ok(WalkFlow::Stop);
        }
    }

    Ok(WalkFlow::Continue)
}
