//! Utility functions for string manipulation and file system checks.
//!
//! - String truncation for logging
//! - Slugs for report file names
//! - Relative links between output directories
//! - File system validation for output directories

use std::error::Error;
use std::fs as stdfs;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number
/// of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Turn a page URL into a file-name-safe slug.
///
/// Uses host and path, lower-cased, with every run of non-alphanumeric
/// characters replaced by a single hyphen.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(report_slug("https://www.example.com/2024/05/post/"), "www-example-com-2024-05-post");
/// ```
pub fn report_slug(page_url: &str) -> String {
    let source = match Url::parse(page_url) {
        Ok(u) => format!("{}{}", u.host_str().unwrap_or_default(), u.path()),
        Err(_) => page_url.to_string(),
    };

    let mut slug = String::with_capacity(source.len());
    for c in source.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() { "report".to_string() } else { slug.to_string() }
}

/// Path of `target` as seen from inside `from_dir`, with `/` separators.
///
/// Both paths are resolved against the working directory first; `..` is
/// handled lexically. Falls back to `target` unchanged if the working
/// directory is unavailable.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(relative_link("./reports", "./static/img/plot.svg"), "../static/img/plot.svg");
/// ```
pub fn relative_link(from_dir: &str, target: &str) -> String {
    let (Ok(from), Ok(to)) = (std::path::absolute(from_dir), std::path::absolute(target)) else {
        return target.to_string();
    };
    let (from, to) = (normalize(&from), normalize(&to));

    let common = from
        .components()
        .zip(to.components())
        .take_while(|(a, b)| a == b)
        .count();

    let ups = from.components().count() - common;
    let parts: Vec<String> = std::iter::repeat_n("..".to_string(), ups)
        .chain(
            to.components()
                .skip(common)
                .map(|c| c.as_os_str().to_string_lossy().into_owned()),
        )
        .collect();

    if parts.is_empty() { ".".to_string() } else { parts.join("/") }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
