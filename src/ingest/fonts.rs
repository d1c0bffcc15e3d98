//! Offline font rewriting for extracted Axure bundles.
//!
//! Axure exports reference Google Fonts from a CDN, which breaks previews on
//! air-gapped networks. The post-processor swaps the Inter stylesheet for a
//! locally served copy, drops preconnect hints, and comments out any other
//! CDN stylesheet so the removal stays visible in the markup. Reprocessing an
//! already rewritten file is a no-op.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::walk::{walk_files, WalkFlow, WalkRules};

/// Stylesheet served from the upload host instead of the font CDN.
pub const LOCAL_FONT_LINK: &str = r#"<link href="/fonts/inter.css" rel="stylesheet">"#;

const REWRITE_RULES: WalkRules = WalkRules {
    skip_dirs: &["__MACOSX"],
    skip_hidden: true,
};

static PRECONNECT_GOOGLEAPIS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<link\s+rel=["']preconnect["']\s+href=["']https://fonts\.googleapis\.com["']\s*/?>"#)
        .expect("preconnect googleapis pattern")
});

static PRECONNECT_GSTATIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<link\s+rel=["']preconnect["']\s+href=["']https://fonts\.gstatic\.com["']\s+crossorigin\s*/?>"#)
        .expect("preconnect gstatic pattern")
});

static INTER_STYLESHEET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)<link\s+[^>]*href=["']https://fonts\.googleapis\.com/css2\?family=Inter[^"']*["'][^>]*>"#,
    )
    .expect("inter stylesheet pattern")
});

static ANY_FONT_STYLESHEET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<link\s+[^>]*href=["'](https://fonts\.googleapis\.com/[^"']*)["'][^>]*>"#)
        .expect("font stylesheet pattern")
});

static WIDTH_OVERRIDE_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<style>\s*/\* axure width override \*/.*?</style>\s*"#)
        .expect("width override pattern")
});

/// A file the rewriter could not process. Never fatal for the ingestion.
#[derive(Debug)]
pub struct RewriteWarning {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct RewriteReport {
    /// Number of files whose content actually changed.
    pub rewritten: usize,
    pub warnings: Vec<RewriteWarning>,
}

/// Rewrites every `.html`/`.htm`/`.css` file under `root`, skipping
/// `__MACOSX` and dot-prefixed names. Per-file I/O errors become warnings and
/// processing continues.
pub fn rewrite_tree(root: &Path) -> RewriteReport {
    let mut report = RewriteReport::default();

    let walked = walk_files(root, &REWRITE_RULES, &mut |path| {
        if is_rewritable(path) {
            match rewrite_file(path) {
                Ok(true) => report.rewritten += 1,
                Ok(false) => {}
                Err(err) => report.warnings.push(RewriteWarning {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                }),
            }
        }
        WalkFlow::Continue
    });

    if let Err(err) = walked {
        report.warnings.push(RewriteWarning {
            path: root.to_path_buf(),
            reason: err.to_string(),
        });
    }

    report
}

fn is_rewritable(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            ext.eq_ignore_ascii_case("html")
                || ext.eq_ignore_ascii_case("htm")
                || ext.eq_ignore_ascii_case("css")
        })
        .unwrap_or(false)
}

fn rewrite_file(path: &Path) -> io::Result<bool> {
    let original = fs::read_to_string(path)?;
    let updated = rewrite_markup(&original);
    if updated != original {
        fs::write(path, &updated)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Applies the rewrite passes to one file's content. The local link is
/// emitted at most once per file; the dedup flag is local to this call.
pub fn rewrite_markup(content: &str) -> String {
    let has_local_link = content.contains(LOCAL_FONT_LINK);

    let mut output = PRECONNECT_GOOGLEAPIS.replace_all(content, "").into_owned();
    output = PRECONNECT_GSTATIC.replace_all(&output, "").into_owned();

    let mut inter_replaced = has_local_link;
    output = INTER_STYLESHEET
        .replace_all(&output, |_: &Captures| {
            if inter_replaced {
                String::new()
            } else {
                inter_replaced = true;
                LOCAL_FONT_LINK.to_string()
            }
        })
        .into_owned();

    // Catch-all for CDN references the dedicated patterns missed. Non-Inter
    // families are commented out by href only, so a second pass over the
    // comment never matches again.
    output = ANY_FONT_STYLESHEET
        .replace_all(&output, |caps: &Captures| {
            if caps[0].contains("Inter") {
                if inter_replaced {
                    String::new()
                } else {
                    inter_replaced = true;
                    LOCAL_FONT_LINK.to_string()
                }
            } else {
                format!(
                    "<!-- external font stylesheet {} removed for offline use -->",
                    &caps[1]
                )
            }
        })
        .into_owned();

    WIDTH_OVERRIDE_STYLE.replace_all(&output, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const AXURE_HEAD: &str = concat!(
        r#"<link rel="preconnect" href="https://fonts.googleapis.com">"#,
        "\n",
        r#"<link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>"#,
        "\n",
        r#"<link href="https://fonts.googleapis.com/css2?family=Inter:wght@400;600&display=swap" rel="stylesheet">"#,
    );

    #[test]
    fn replaces_inter_and_strips_preconnects() {
        let output = rewrite_markup(AXURE_HEAD);

        assert_eq!(output.matches(LOCAL_FONT_LINK).count(), 1);
        assert!(!output.contains("preconnect"));
        assert!(!output.contains("fonts.gstatic.com"));
    }

    #[test]
    fn emits_the_local_link_at_most_once() {
        let input = format!(
            "{}\n{}",
            AXURE_HEAD,
            r#"<link href="https://fonts.googleapis.com/css2?family=Inter&display=swap" rel="stylesheet">"#,
        );
        let output = rewrite_markup(&input);
        assert_eq!(output.matches(LOCAL_FONT_LINK).count(), 1);
    }

    #[test]
    fn existing_local_link_suppresses_replacement() {
        let input = format!("{LOCAL_FONT_LINK}\n{AXURE_HEAD}");
        let output = rewrite_markup(&input);
        assert_eq!(output.matches(LOCAL_FONT_LINK).count(), 1);
    }

    #[test]
    fn unrelated_family_is_commented_out_by_href() {
        let input =
            r#"<link href="https://fonts.googleapis.com/css?family=Source+Sans+Pro" rel="stylesheet">"#;
        let output = rewrite_markup(input);

        assert!(output.contains("<!-- external font stylesheet"));
        assert!(output.contains("Source+Sans+Pro"));
        assert!(!output.contains("<link"));
    }

    #[test]
    fn strips_injected_width_override_block() {
        let input = "<style>\n/* axure width override */\nhtml { width: auto; }\n</style>\n<p>x</p>";
        assert_eq!(rewrite_markup(input), "<p>x</p>");
    }

    #[test]
    fn rewriting_is_idempotent() {
        let input = format!(
            "{}\n{}",
            AXURE_HEAD,
            r#"<link href="https://fonts.googleapis.com/css?family=Roboto" rel="stylesheet">"#,
        );
        let first = rewrite_markup(&input);
        let second = rewrite_markup(&first);
        assert_eq!(first, second);
    }

    #[test]
    fn rewrite_tree_counts_only_changed_files() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("page.html"), AXURE_HEAD).unwrap();
        fs::write(root.path().join("plain.html"), "<html></html>").unwrap();
        fs::write(root.path().join("notes.txt"), AXURE_HEAD).unwrap();
        fs::create_dir_all(root.path().join("__MACOSX")).unwrap();
        fs::write(root.path().join("__MACOSX/page.html"), AXURE_HEAD).unwrap();

        let report = rewrite_tree(root.path());
        assert_eq!(report.rewritten, 1);
        assert!(report.warnings.is_empty());

        // Second pass finds nothing left to change.
        let second = rewrite_tree(root.path());
        assert_eq!(second.rewritten, 0);
    }

    #[test]
    fn css_files_are_rewritten_too() {
        let root = tempfile::tempdir().unwrap();
        let css = r#"@import url("https://fonts.googleapis.com/css2?family=Inter");"#;
        fs::write(root.path().join("styles.CSS"), css).unwrap();

        // @import is not a link tag; content is untouched but still visited.
        let report = rewrite_tree(root.path());
        assert_eq!(report.rewritten, 0);
    }
}
