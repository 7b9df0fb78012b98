/*!
 * Directory capabilities
 *
 * A capability is an opaque, revocable handle that can list and resolve the
 * entries of one directory. The engine never sees a global path namespace:
 * every file it reads is reached by walking names down from the root handle.
 */

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use glob_match::glob_match;
use tracing::debug;

use crate::error::{CapabilityError, EngineError};
use crate::types::NodeKind;
use crate::utils::{segments, DEFAULT_IGNORE, SEPARATOR};

/// A named entry yielded by [`DirectoryCapability::entries`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: NodeKind,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Handle to one directory
#[async_trait]
pub trait DirectoryCapability: Send + Sync {
    /// Name of the directory this handle points at
    fn name(&self) -> &str;

    /// List entries. Order is defined by the implementation and must be
    /// stable for an unchanged directory.
    async fn entries(&self) -> Result<Vec<DirEntry>, CapabilityError>;

    /// Resolve a named child as a directory
    async fn directory(&self, name: &str) -> Result<Arc<dyn DirectoryCapability>, CapabilityError>;

    /// Resolve a named child as a file
    async fn file(&self, name: &str) -> Result<Arc<dyn FileCapability>, CapabilityError>;
}

/// Handle to one file
#[async_trait]
pub trait FileCapability: Send + Sync {
    fn name(&self) -> &str;

    /// Read the full contents as text
    async fn read_text(&self) -> Result<String, CapabilityError>;
}

/// Supplies the root capability, typically by asking the user
#[async_trait]
pub trait DirectoryHandleProvider: Send + Sync {
    /// Acquire a root handle. A dismissed prompt yields
    /// [`EngineError::UserCancelled`].
    async fn acquire(&self) -> Result<Arc<dyn DirectoryCapability>, EngineError>;
}

/// Walk `path` down from `root`, resolving every segment as a directory
pub async fn resolve_directory(
    root: &Arc<dyn DirectoryCapability>,
    path: &str,
) -> Result<Arc<dyn DirectoryCapability>, CapabilityError> {
    let mut current = Arc::clone(root);
    for segment in segments(path) {
        current = current.directory(segment).await?;
    }
    Ok(current)
}

/// Walk `path` down from `root`, resolving the last segment as a file
pub async fn resolve_file(
    root: &Arc<dyn DirectoryCapability>,
    path: &str,
) -> Result<Arc<dyn FileCapability>, CapabilityError> {
    let (parent, name) = split_last(path).ok_or_else(|| CapabilityError::NotAFile(path.to_string()))?;
    let dir = resolve_directory(root, parent).await?;
    dir.file(name).await
}

/// Check that `path` still resolves, as `kind` when one is given
pub async fn resolves_as(
    root: &Arc<dyn DirectoryCapability>,
    path: &str,
    kind: Option<NodeKind>,
) -> Result<NodeKind, CapabilityError> {
    let (parent, name) =
        split_last(path).ok_or_else(|| CapabilityError::NotFound(path.to_string()))?;
    let dir = resolve_directory(root, parent).await?;

    match kind {
        Some(NodeKind::Directory) => dir.directory(name).await.map(|_| NodeKind::Directory),
        Some(NodeKind::File) => dir.file(name).await.map(|_| NodeKind::File),
        None => match dir.file(name).await {
            Ok(_) => Ok(NodeKind::File),
            Err(CapabilityError::NotAFile(_)) => {
                dir.directory(name).await.map(|_| NodeKind::Directory)
            }
            Err(e) => Err(e),
        },
    }
}

fn split_last(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.trim_end_matches(SEPARATOR);
    let (parent, name) = trimmed.rsplit_once(SEPARATOR).unwrap_or(("", trimmed));
    if name.is_empty() {
        None
    } else {
        Some((parent, name))
    }
}

/// Name-based filter applied by [`LocalDirectory`] listings
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Glob patterns matched against entry names
    pub ignore_patterns: Vec<String>,
    /// Also apply [`DEFAULT_IGNORE`]
    pub use_defaults: bool,
}

impl EntryFilter {
    pub fn new(ignore_patterns: Vec<String>, use_defaults: bool) -> Self {
        Self {
            ignore_patterns,
            use_defaults,
        }
    }

    /// Check if an entry should be hidden from listings
    pub fn is_ignored(&self, name: &str) -> bool {
        if self.ignore_patterns.iter().any(|p| glob_match(p, name)) {
            return true;
        }

        self.use_defaults && DEFAULT_IGNORE.iter().any(|p| *p == name || glob_match(p, name))
    }
}

/// Capability over a directory of the local filesystem.
///
/// Listings are sorted by name so repeated builds see the same order. Every
/// handle derived from one root shares its revocation flag.
#[derive(Clone)]
pub struct LocalDirectory {
    path: PathBuf,
    name: String,
    filter: Arc<EntryFilter>,
    revoked: Arc<AtomicBool>,
}

impl LocalDirectory {
    /// Open `path` as a root capability
    pub async fn open(path: impl AsRef<Path>, filter: EntryFilter) -> Result<Self, CapabilityError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let abs_path = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| CapabilityError::from_io(&display, e))?;
        let metadata = tokio::fs::metadata(&abs_path)
            .await
            .map_err(|e| CapabilityError::from_io(&display, e))?;
        if !metadata.is_dir() {
            return Err(CapabilityError::NotADirectory(display));
        }

        let name = abs_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        Ok(Self {
            path: abs_path,
            name,
            filter: Arc::new(filter),
            revoked: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Absolute path of this directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Revoke this handle and every handle derived from the same root
    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CapabilityError> {
        if self.revoked.load(Ordering::SeqCst) {
            Err(CapabilityError::Revoked)
        } else {
            Ok(())
        }
    }

    /// Path of a direct child. Names that would escape this directory, or
    /// that the filter hides, do not resolve.
    fn child(&self, name: &str) -> Result<PathBuf, CapabilityError> {
        self.check()?;
        if name.is_empty() || name == "." || name == ".." || name.contains(SEPARATOR) {
            return Err(CapabilityError::NotFound(name.to_string()));
        }
        if self.filter.is_ignored(name) {
            return Err(CapabilityError::NotFound(name.to_string()));
        }
        Ok(self.path.join(name))
    }
}

impl fmt::Debug for LocalDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalDirectory")
            .field("path", &self.path)
            .field("revoked", &self.revoked.load(Ordering::SeqCst))
            .finish()
    }
}

#[async_trait]
impl DirectoryCapability for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn entries(&self) -> Result<Vec<DirEntry>, CapabilityError> {
        self.check()?;
        let mut reader = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| CapabilityError::from_io(&self.name, e))?;

        let mut names = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| CapabilityError::from_io(&self.name, e))?
        {
            // A lossy name would never resolve through `child`
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    debug!("skipping non UTF-8 entry {:?} in {}", raw, self.path.display());
                    continue;
                }
            };
            if !self.filter.is_ignored(&name) {
                names.push(name);
            }
        }
        // Release the directory handle before the per-entry lookups
        drop(reader);

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let path = self.path.join(&name);
            // Follow symlinks so a link to a directory lists as one
            let file_type = match tokio::fs::metadata(&path).await {
                Ok(metadata) => metadata.file_type(),
                Err(e) => {
                    debug!("skipping unreadable entry {}: {}", path.display(), e);
                    continue;
                }
            };

            if file_type.is_dir() {
                entries.push(DirEntry::new(name, NodeKind::Directory));
            } else if file_type.is_file() {
                entries.push(DirEntry::new(name, NodeKind::File));
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn directory(&self, name: &str) -> Result<Arc<dyn DirectoryCapability>, CapabilityError> {
        let path = self.child(name)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| CapabilityError::from_io(name, e))?;
        if !metadata.is_dir() {
            return Err(CapabilityError::NotADirectory(name.to_string()));
        }

        Ok(Arc::new(LocalDirectory {
            path,
            name: name.to_string(),
            filter: Arc::clone(&self.filter),
            revoked: Arc::clone(&self.revoked),
        }))
    }

    async fn file(&self, name: &str) -> Result<Arc<dyn FileCapability>, CapabilityError> {
        let path = self.child(name)?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| CapabilityError::from_io(name, e))?;
        if !metadata.is_file() {
            return Err(CapabilityError::NotAFile(name.to_string()));
        }

        Ok(Arc::new(LocalFile {
            path,
            name: name.to_string(),
            revoked: Arc::clone(&self.revoked),
        }))
    }
}

/// File handle derived from a [`LocalDirectory`]
#[derive(Debug)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    revoked: Arc<AtomicBool>,
}

#[async_trait]
impl FileCapability for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_text(&self) -> Result<String, CapabilityError> {
        if self.revoked.load(Ordering::SeqCst) {
            return Err(CapabilityError::Revoked);
        }
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| CapabilityError::from_io(&self.name, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Provider that opens a fixed local path
#[derive(Debug, Clone)]
pub struct PathProvider {
    path: PathBuf,
    filter: EntryFilter,
}

impl PathProvider {
    pub fn new(path: impl Into<PathBuf>, filter: EntryFilter) -> Self {
        Self {
            path: path.into(),
            filter,
        }
    }
}

#[async_trait]
impl DirectoryHandleProvider for PathProvider {
    async fn acquire(&self) -> Result<Arc<dyn DirectoryCapability>, EngineError> {
        let dir = LocalDirectory::open(&self.path, self.filter.clone())
            .await
            .map_err(|source| EngineError::Resolution {
                path: self.path.display().to_string(),
                source,
            })?;
        Ok(Arc::new(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn fixture() -> std::io::Result<tempfile::TempDir> {
        let temp_dir = tempdir()?;
        fs::create_dir_all(temp_dir.path().join("docs").join("nested"))?;
        fs::write(temp_dir.path().join("docs").join("readme.txt"), "hello")?;
        fs::write(temp_dir.path().join("b.txt"), "bee")?;
        fs::write(temp_dir.path().join("a.txt"), "ay")?;
        fs::create_dir(temp_dir.path().join("node_modules"))?;
        Ok(temp_dir)
    }

    #[tokio::test]
    async fn test_entries_sorted_and_filtered() {
        let temp_dir = fixture().unwrap();
        let dir = LocalDirectory::open(temp_dir.path(), EntryFilter::new(vec![], true))
            .await
            .unwrap();

        let entries = dir.entries().await.unwrap();
        assert_eq!(
            entries,
            vec![
                DirEntry::new("a.txt", NodeKind::File),
                DirEntry::new("b.txt", NodeKind::File),
                DirEntry::new("docs", NodeKind::Directory),
            ]
        );
    }

    #[tokio::test]
    async fn test_resolve_kind_mismatch() {
        let temp_dir = fixture().unwrap();
        let root: Arc<dyn DirectoryCapability> = Arc::new(
            LocalDirectory::open(temp_dir.path(), EntryFilter::default())
                .await
                .unwrap(),
        );

        let file = resolve_file(&root, "/docs/readme.txt").await.unwrap();
        assert_eq!(file.read_text().await.unwrap(), "hello");

        assert!(matches!(
            resolve_file(&root, "/docs").await,
            Err(CapabilityError::NotAFile(_))
        ));
        assert!(matches!(
            resolve_directory(&root, "/a.txt").await,
            Err(CapabilityError::NotADirectory(_))
        ));
        assert!(matches!(
            resolve_file(&root, "/gone/readme.txt").await,
            Err(CapabilityError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_resolves_as() {
        let temp_dir = fixture().unwrap();
        let root: Arc<dyn DirectoryCapability> = Arc::new(
            LocalDirectory::open(temp_dir.path(), EntryFilter::default())
                .await
                .unwrap(),
        );

        assert_eq!(resolves_as(&root, "/docs", None).await.unwrap(), NodeKind::Directory);
        assert_eq!(resolves_as(&root, "/a.txt", None).await.unwrap(), NodeKind::File);
        assert!(resolves_as(&root, "/docs", Some(NodeKind::File)).await.is_err());
        assert!(resolves_as(&root, "/missing", None).await.is_err());
    }

    #[tokio::test]
    async fn test_escape_names_rejected() {
        let temp_dir = fixture().unwrap();
        let dir = LocalDirectory::open(temp_dir.path().join("docs"), EntryFilter::default())
            .await
            .unwrap();
        assert!(matches!(
            dir.file("..").await,
            Err(CapabilityError::NotFound(_))
        ));
        assert!(dir.directory("../docs").await.is_err());
    }

    #[tokio::test]
    async fn test_revoke_propagates() {
        let temp_dir = fixture().unwrap();
        let dir = LocalDirectory::open(temp_dir.path(), EntryFilter::default())
            .await
            .unwrap();
        let docs = dir.directory("docs").await.unwrap();
        let readme = docs.file("readme.txt").await.unwrap();

        dir.revoke();

        assert!(matches!(docs.entries().await, Err(CapabilityError::Revoked)));
        assert!(matches!(readme.read_text().await, Err(CapabilityError::Revoked)));
    }

    #[tokio::test]
    async fn test_open_rejects_file() {
        let temp_dir = fixture().unwrap();
        let result = LocalDirectory::open(temp_dir.path().join("a.txt"), EntryFilter::default()).await;
        assert!(matches!(result, Err(CapabilityError::NotADirectory(_))));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_non_utf8_names_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = fixture().unwrap();
        let raw = OsStr::from_bytes(b"bad\xffname.txt");
        fs::write(temp_dir.path().join(raw), "unreachable").unwrap();

        let dir = LocalDirectory::open(temp_dir.path(), EntryFilter::new(vec![], true))
            .await
            .unwrap();
        let names: Vec<String> = dir.entries().await.unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "docs"]);
    }

    #[tokio::test]
    async fn test_wide_directory_lists_every_entry() {
        let temp_dir = tempdir().unwrap();
        for i in 0..500 {
            fs::write(temp_dir.path().join(format!("f{:03}.txt", i)), "x").unwrap();
        }

        let dir = LocalDirectory::open(temp_dir.path(), EntryFilter::default())
            .await
            .unwrap();
        let entries = dir.entries().await.unwrap();
        assert_eq!(entries.len(), 500);
        assert_eq!(entries[0].name, "f000.txt");
        assert_eq!(entries[499].name, "f499.txt");
    }

    #[test]
    fn test_entry_filter() {
        let filter = EntryFilter::new(vec!["*.log".to_string()], true);
        assert!(filter.is_ignored("debug.log"));
        assert!(filter.is_ignored(".git"));
        assert!(filter.is_ignored("module.pyc"));
        assert!(!filter.is_ignored("main.rs"));

        let filter = EntryFilter::new(vec![], false);
        assert!(!filter.is_ignored(".git"));
    }
}
