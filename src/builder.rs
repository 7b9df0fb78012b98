/*!
 * Tree building
 *
 * Walks a directory capability into a fresh [`Tree`] snapshot. Sibling
 * entries are processed concurrently and reassembled in listing order, so the
 * result does not depend on I/O timing. At most `listing_limit` directories
 * are being listed at any moment. Failures never escape `build`: an
 * unreadable subtree becomes an empty directory and the error is returned as
 * a diagnostic.
 */

use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::capability::{resolves_as, DirEntry, DirectoryCapability};
use crate::error::EngineError;
use crate::types::{NodeKind, SelectionSet, Tree, TreeNode};
use crate::utils::join_path;

/// Directory listings allowed in flight at once during a build
pub const DEFAULT_LISTING_LIMIT: usize = 64;

/// Result of a build
#[derive(Debug, Default)]
pub struct BuildOutput {
    /// The new snapshot
    pub tree: Tree,
    /// Subtrees that could not be enumerated, in tree order
    pub diagnostics: Vec<EngineError>,
    /// Seeded paths discarded by validity filtering
    pub dropped: Vec<String>,
}

/// Builds tree snapshots from a root capability
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    validate_selection: bool,
    listing_limit: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    /// Create a builder that validates seeded selections
    pub fn new() -> Self {
        Self {
            validate_selection: true,
            listing_limit: DEFAULT_LISTING_LIMIT,
        }
    }

    /// Enable or disable validity filtering of the seed
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate_selection = validate;
        self
    }

    /// Cap the number of directories listed concurrently. Each listing may
    /// hold an open handle, so wide trees would otherwise exhaust them.
    pub fn with_listing_limit(mut self, limit: usize) -> Self {
        self.listing_limit = limit.max(1);
        self
    }

    /// Build a snapshot of `root`, marking nodes whose path is in `seed` as
    /// selected. No file content is read.
    pub async fn build(&self, root: &Arc<dyn DirectoryCapability>, seed: &SelectionSet) -> BuildOutput {
        let (effective, dropped) = if self.validate_selection && !seed.is_empty() {
            self.filter_valid(root, seed).await
        } else {
            (seed.clone(), Vec::new())
        };

        let permits = Semaphore::new(self.listing_limit);
        let level = build_level(Arc::clone(root), String::new(), &effective, &permits).await;
        debug!(
            "built tree for {}: {} top-level entries, {} diagnostics",
            root.name(),
            level.nodes.len(),
            level.diagnostics.len()
        );

        BuildOutput {
            tree: Tree::new(level.nodes),
            diagnostics: level.diagnostics,
            dropped,
        }
    }

    /// Keep only the seeded paths that still resolve through the capability
    /// chain, as the kind they were recorded with. Returns the surviving set
    /// and the dropped paths.
    pub async fn filter_valid(
        &self,
        root: &Arc<dyn DirectoryCapability>,
        seed: &SelectionSet,
    ) -> (SelectionSet, Vec<String>) {
        let checks = seed.entries().map(|(path, kind)| async move {
            let outcome = resolves_as(root, path, kind).await;
            (path, outcome)
        });

        let mut valid = SelectionSet::new();
        let mut dropped = Vec::new();
        for (path, outcome) in join_all(checks).await {
            match outcome {
                Ok(kind) => valid.insert(path.to_string(), Some(kind)),
                Err(e) => {
                    debug!("dropping selection {}: {}", path, e);
                    dropped.push(path.to_string());
                }
            }
        }

        (valid, dropped)
    }
}

/// Nodes of one directory level plus the diagnostics gathered below it
struct Level {
    nodes: Vec<TreeNode>,
    diagnostics: Vec<EngineError>,
}

fn build_level<'a>(
    dir: Arc<dyn DirectoryCapability>,
    prefix: String,
    seed: &'a SelectionSet,
    permits: &'a Semaphore,
) -> BoxFuture<'a, Level> {
    async move {
        let listed = {
            // Never closed, so acquiring only waits
            let _permit = permits.acquire().await.ok();
            dir.entries().await
        };

        let entries = match listed {
            Ok(entries) => entries,
            Err(source) => {
                let path = display_path(&prefix);
                warn!("cannot list {}: {}", path, source);
                return Level {
                    nodes: Vec::new(),
                    diagnostics: vec![EngineError::Enumeration { path, source }],
                };
            }
        };

        let built = join_all(
            entries
                .into_iter()
                .map(|entry| build_entry(Arc::clone(&dir), &prefix, entry, seed, permits)),
        )
        .await;

        let mut level = Level {
            nodes: Vec::with_capacity(built.len()),
            diagnostics: Vec::new(),
        };
        for (node, diagnostics) in built {
            level.nodes.push(node);
            level.diagnostics.extend(diagnostics);
        }
        level
    }
    .boxed()
}

async fn build_entry(
    dir: Arc<dyn DirectoryCapability>,
    prefix: &str,
    entry: DirEntry,
    seed: &SelectionSet,
    permits: &Semaphore,
) -> (TreeNode, Vec<EngineError>) {
    let path = join_path(prefix, &entry.name);
    let selected = seed.contains(&path);

    match entry.kind {
        NodeKind::File => (TreeNode::file(path, entry.name, selected), Vec::new()),
        NodeKind::Directory => match dir.directory(&entry.name).await {
            Ok(child) => {
                let level = build_level(child, path.clone(), seed, permits).await;
                (
                    TreeNode::directory(path, entry.name, level.nodes, selected),
                    level.diagnostics,
                )
            }
            Err(source) => {
                warn!("cannot open {}: {}", path, source);
                let diagnostic = EngineError::Enumeration {
                    path: path.clone(),
                    source,
                };
                (
                    TreeNode::directory(path, entry.name, Vec::new(), selected),
                    vec![diagnostic],
                )
            }
        },
    }
}

fn display_path(prefix: &str) -> String {
    if prefix.is_empty() {
        "/".to_string()
    } else {
        prefix.to_string()
    }
}
