// src/checker/internal.rs
// =============================================================================
// Checks links that point at files inside the scanned tree.
//
// Resolution rules:
// - "/docs/a.md"  -> <root>/docs/a.md          (root-relative)
// - "./a.md"      -> <dir of referencing file>/a.md
// - "../img.png"  -> <dir of referencing file>/../img.png
//
// A trailing #fragment or ?query is not part of the file name and is cut off
// first. Percent-encoded names (%2F...) are NOT decoded: a file literally
// named "%2Fpath" almost never exists, so such links show up as broken.
//
// Module imports get a little extra help, the way bundlers resolve them:
// './Button' also matches Button.tsx, Button.js, Button/index.ts, ...
// =============================================================================

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::link::{LinkOccurrence, ValidationResult};

// Tried in this order for extension-less imports
const MODULE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".json"];

// Validates one internal link by checking the filesystem
//
// Any filesystem error (not found, permission denied, ...) makes the link
// invalid, with the error as the message.
pub async fn validate_internal(link: &LinkOccurrence, root_dir: &Path) -> ValidationResult {
    if link.url.is_empty() {
        return ValidationResult::invalid("Empty URL");
    }

    let target = resolve_path(root_dir, &link.location.file_path, &link.url);

    let error = match tokio::fs::metadata(&target).await {
        Ok(_) => return ValidationResult::valid(),
        Err(e) => e,
    };

    if link.source.is_module() {
        for candidate in module_candidates(&target) {
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return ValidationResult::valid();
            }
        }
    }

    match error.kind() {
        ErrorKind::NotFound => ValidationResult::invalid(format!("File not found: {}", link.url)),
        _ => ValidationResult::invalid(error.to_string()),
    }
}

// Turns a link into the filesystem path it refers to
//
// Parameters:
//   root_dir: the scan root
//   file_path: the referencing file, relative to root_dir
//   url: the link as written
pub fn resolve_path(root_dir: &Path, file_path: &str, url: &str) -> PathBuf {
    let target = strip_fragment_and_query(url);

    // "/a" and "//a" both mean "from the scan root", never the filesystem root
    match target.strip_prefix('/') {
        Some(from_root) => root_dir.join(from_root.trim_start_matches('/')),
        None => {
            let dir = Path::new(file_path).parent().unwrap_or(Path::new(""));
            root_dir.join(dir).join(target)
        }
    }
}

// "guide.md#setup" -> "guide.md", "page?tab=2" -> "page"
fn strip_fragment_and_query(url: &str) -> &str {
    let end = url.find(['#', '?']).unwrap_or(url.len());
    &url[..end]
}

// ./Button -> ./Button.ts, ./Button.tsx, ..., ./Button/index.ts, ...
fn module_candidates(base: &Path) -> Vec<PathBuf> {
    let with_extensions = MODULE_EXTENSIONS.iter().map(|ext| {
        let mut name = OsString::from(base.as_os_str());
        name.push(ext);
        PathBuf::from(name)
    });
    let index_files = MODULE_EXTENSIONS
        .iter()
        .map(|ext| base.join(format!("index{}", ext)));

    with_extensions.chain(index_files).collect()
}
