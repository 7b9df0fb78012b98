/*!
 * Utility functions for treepick
 */

use once_cell::sync::Lazy;

/// Separator between path segments in tree paths
pub const SEPARATOR: char = '/';

/// Join a tree path and a child name. The root's path is the empty string.
pub fn join_path(parent: &str, name: &str) -> String {
    format!("{}{}{}", parent, SEPARATOR, name)
}

/// Split a tree path into its non-empty segments
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty() && *s != ".")
}

/// Normalize user input like `docs/`, `./src/main.rs` or `/a//b` into the
/// tree form `/docs`, `/src/main.rs`, `/a/b`. Returns None for the root itself.
pub fn normalize_path(input: &str) -> Option<String> {
    let normalized: String = segments(input.trim())
        .map(|s| format!("{}{}", SEPARATOR, s))
        .collect();

    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// True when `candidate` is `path` itself or lies below it.
///
/// Matches at a separator boundary only: `/a/b` covers `/a/b/c` but not `/a/bc`.
pub fn is_same_or_descendant(candidate: &str, path: &str) -> bool {
    match candidate.strip_prefix(path) {
        Some("") => true,
        Some(rest) => rest.starts_with(SEPARATOR),
        None => false,
    }
}

/// Last segment of a tree path
pub fn file_name(path: &str) -> &str {
    path.rsplit(SEPARATOR).next().unwrap_or(path)
}

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

/// Default patterns to ignore when listing a local directory
pub static DEFAULT_IGNORE: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // Version Control
        ".git",
        ".svn",
        ".hg",
        // OS Files
        ".DS_Store",
        "Thumbs.db",
        "desktop.ini",
        // Dependencies
        "node_modules",
        "bower_components",
        ".yarn",
        ".pnpm-store",
        // Python
        "__pycache__",
        ".pytest_cache",
        ".venv",
        "*.pyc",
        // Rust
        "target",
        // IDEs & Editors
        ".idea",
        ".vscode",
        "*.swp",
        // Caches
        ".cache",
        ".next",
        ".terraform",
    ]
});
