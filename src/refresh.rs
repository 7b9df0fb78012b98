/*!
 * Refresh reconciliation
 *
 * A refresh never patches the previous tree. It decides which seed the next
 * build gets, runs a fresh build against the same root, and carries the
 * expansion state over by path.
 */

use std::sync::Arc;

use clap::ValueEnum;
use serde::Serialize;
use tracing::debug;

use crate::builder::TreeBuilder;
use crate::capability::{resolve_file, DirectoryCapability};
use crate::error::{EngineError, Result};
use crate::expansion::ExpansionState;
use crate::types::{SelectionSet, Tree};

/// What happens to the selection when the tree is refreshed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshPolicy {
    /// Reseed with the previous selection, dropping paths that no longer resolve
    #[value(name = "preserve")]
    PreserveAndRevalidate,
    /// Clear the selection before rebuilding
    #[value(name = "discard")]
    DiscardOnRefresh,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self::PreserveAndRevalidate
    }
}

/// Outcome of [`Reconciler::refresh`]
#[derive(Debug, Default)]
pub struct RefreshOutput {
    pub tree: Tree,
    pub selection: SelectionSet,
    pub expansion: ExpansionState,
    /// Subtrees that could not be enumerated
    pub diagnostics: Vec<EngineError>,
    /// Previously selected paths that did not survive
    pub dropped: Vec<String>,
}

/// Rebuilds a tree and reconciles selection and expansion state
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    policy: RefreshPolicy,
    builder: TreeBuilder,
}

impl Reconciler {
    pub fn new(policy: RefreshPolicy) -> Self {
        Self {
            policy,
            builder: TreeBuilder::new(),
        }
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// The seed the next build gets under this policy
    pub fn seed_for(&self, previous: &SelectionSet) -> SelectionSet {
        match self.policy {
            RefreshPolicy::PreserveAndRevalidate => previous.clone(),
            RefreshPolicy::DiscardOnRefresh => SelectionSet::new(),
        }
    }

    /// Rebuild the tree under `root`
    pub async fn refresh(
        &self,
        root: &Arc<dyn DirectoryCapability>,
        previous_selection: &SelectionSet,
        previous_expansion: &ExpansionState,
    ) -> RefreshOutput {
        let seed = self.seed_for(previous_selection);
        let output = self.builder.build(root, &seed).await;

        let selection = SelectionSet::from_tree(&output.tree);
        // Discarded selections count as dropped too
        let dropped: Vec<String> = previous_selection
            .paths()
            .filter(|p| !selection.contains(p))
            .map(str::to_string)
            .collect();

        debug!(
            "refreshed {} with {:?}: {} selected, {} dropped",
            root.name(),
            self.policy,
            selection.len(),
            dropped.len()
        );

        RefreshOutput {
            tree: output.tree,
            selection,
            expansion: previous_expansion.clone(),
            diagnostics: output.diagnostics,
            dropped,
        }
    }
}

/// Re-read a single file through a fresh handle. The tree and selection are
/// not involved.
pub async fn refresh_file(root: &Arc<dyn DirectoryCapability>, path: &str) -> Result<String> {
    let file = resolve_file(root, path)
        .await
        .map_err(|source| EngineError::Resolution {
            path: path.to_string(),
            source,
        })?;

    file.read_text().await.map_err(|source| EngineError::Read {
        path: path.to_string(),
        source,
    })
}
