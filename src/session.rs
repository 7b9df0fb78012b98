/*!
 * The engine surface a front end talks to
 *
 * A `Session` owns the root capability and the current snapshot state. Every
 * mutation replaces the tree and selection with new values; front ends read
 * snapshots through the query methods and dispatch intents through the rest.
 */

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::aggregator::{aggregate, ExportDocument, Instruction};
use crate::builder::TreeBuilder;
use crate::capability::{DirectoryCapability, DirectoryHandleProvider};
use crate::clipboard::PublishSink;
use crate::error::{EngineError, Result};
use crate::expansion::ExpansionState;
use crate::refresh::{refresh_file, Reconciler, RefreshPolicy};
use crate::selection;
use crate::types::{SelectionSet, Tree};

/// What happened to an export after it was computed
#[derive(Debug)]
pub enum PublishStatus {
    /// No sink was given
    NotRequested,
    /// Nothing to publish
    Empty,
    /// The sink accepted the text
    Published,
    /// The sink failed; the export itself is still valid
    Failed(EngineError),
}

/// Result of [`Session::export`]
#[derive(Debug)]
pub struct ExportOutcome {
    pub document: ExportDocument,
    /// Rendered export text
    pub text: String,
    pub publish: PublishStatus,
}

impl ExportOutcome {
    /// True when there was no content to export
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// What a refresh changed
#[derive(Debug, Default)]
pub struct RefreshSummary {
    /// Previously selected paths that are no longer selected
    pub dropped: Vec<String>,
    /// Whether the active file was cleared because it no longer exists
    pub active_file_cleared: bool,
}

/// In-memory engine state for one directory
pub struct Session {
    root: Option<Arc<dyn DirectoryCapability>>,
    tree: Tree,
    selection: SelectionSet,
    expansion: ExpansionState,
    active_file: Option<String>,
    instruction: Option<Instruction>,
    builder: TreeBuilder,
    reconciler: Reconciler,
    diagnostics: Vec<EngineError>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(RefreshPolicy::default())
    }
}

impl Session {
    pub fn new(policy: RefreshPolicy) -> Self {
        Self {
            root: None,
            tree: Tree::default(),
            selection: SelectionSet::new(),
            expansion: ExpansionState::new(),
            active_file: None,
            instruction: None,
            builder: TreeBuilder::new(),
            reconciler: Reconciler::new(policy),
            diagnostics: Vec::new(),
        }
    }

    /// Ask `provider` for a root and build it. Returns `false` when the user
    /// dismissed the prompt; the session is then unchanged.
    pub async fn open(&mut self, provider: &dyn DirectoryHandleProvider) -> Result<bool> {
        match provider.acquire().await {
            Ok(root) => {
                self.open_root(root, &SelectionSet::new()).await;
                Ok(true)
            }
            Err(EngineError::UserCancelled) => {
                debug!("directory selection cancelled");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the root and build it with `seed`. Expansion and the active
    /// file start over.
    pub async fn open_root(&mut self, root: Arc<dyn DirectoryCapability>, seed: &SelectionSet) {
        let output = self.builder.build(&root, seed).await;
        info!("opened {} ({} entries)", root.name(), output.tree.len());

        self.selection = SelectionSet::from_tree(&output.tree);
        self.tree = output.tree;
        self.diagnostics = output.diagnostics;
        self.expansion = ExpansionState::new();
        self.active_file = None;
        self.root = Some(root);
    }

    /// Forget the directory and everything derived from it
    pub fn clear(&mut self) {
        self.root = None;
        self.tree = Tree::default();
        self.selection = SelectionSet::new();
        self.expansion = ExpansionState::new();
        self.active_file = None;
        self.instruction = None;
        self.diagnostics.clear();
    }

    /// Select or deselect `path` and everything below it
    pub fn toggle(&mut self, path: &str, selected: bool) -> Result<()> {
        self.require_root()?;
        crate::ensure!(
            self.tree.find(path).is_some(),
            InvalidArgument,
            "no entry at {}",
            path
        );

        let (tree, selection) = selection::toggle(&self.tree, path, selected);
        self.tree = tree;
        self.selection = selection;
        Ok(())
    }

    /// Rebuild the tree from the root under the configured policy
    pub async fn refresh(&mut self) -> Result<RefreshSummary> {
        let root = Arc::clone(self.require_root()?);
        let output = self
            .reconciler
            .refresh(&root, &self.selection, &self.expansion)
            .await;

        self.tree = output.tree;
        self.selection = output.selection;
        self.expansion = output.expansion;
        self.diagnostics = output.diagnostics;

        let mut summary = RefreshSummary {
            dropped: output.dropped,
            active_file_cleared: false,
        };
        let active_gone = self
            .active_file
            .as_deref()
            .map_or(false, |active| !selection::is_file(&self.tree, active));
        if active_gone {
            debug!("active file {:?} is gone", self.active_file);
            self.active_file = None;
            summary.active_file_cleared = true;
        }
        Ok(summary)
    }

    /// Aggregate the selected files
    pub async fn aggregate(&self) -> Result<ExportDocument> {
        let root = self.require_root()?;
        Ok(aggregate(&self.tree, root, self.instruction.as_ref()).await)
    }

    /// Aggregate, render, and hand the text to `sink` when one is given.
    ///
    /// A sink failure lands in [`ExportOutcome::publish`]; the export is
    /// still returned.
    pub async fn export(&self, sink: Option<&dyn PublishSink>) -> Result<ExportOutcome> {
        let document = self.aggregate().await?;
        let text = document.render();

        let publish = match sink {
            None => PublishStatus::NotRequested,
            Some(_) if text.is_empty() => PublishStatus::Empty,
            Some(sink) => match sink.publish(&text) {
                Ok(()) => PublishStatus::Published,
                Err(e) => {
                    warn!("publish failed: {}", e);
                    PublishStatus::Failed(EngineError::Publish(e))
                }
            },
        };

        Ok(ExportOutcome {
            document,
            text,
            publish,
        })
    }

    /// Mark a file for targeted refresh, or clear the mark with `None`
    pub fn set_active_file(&mut self, path: Option<&str>) -> Result<()> {
        match path {
            None => self.active_file = None,
            Some(path) => {
                crate::ensure!(selection::is_file(&self.tree, path), NotAFile, "{}", path);
                self.active_file = Some(path.to_string());
            }
        }
        Ok(())
    }

    /// Re-read the active file's content. Tree and selection are untouched.
    pub async fn refresh_active_file(&self) -> Result<Option<String>> {
        let root = self.require_root()?;
        match &self.active_file {
            None => Ok(None),
            Some(path) => refresh_file(root, path).await.map(Some),
        }
    }

    pub fn set_instruction(&mut self, instruction: Instruction) {
        self.instruction = Some(instruction);
    }

    pub fn clear_instruction(&mut self) {
        self.instruction = None;
    }

    pub fn instruction(&self) -> Option<&Instruction> {
        self.instruction.as_ref()
    }

    pub fn is_file(&self, path: &str) -> bool {
        selection::is_file(&self.tree, path)
    }

    pub fn selected_paths(&self) -> Vec<&str> {
        self.selection.paths().collect()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expansion.is_expanded(path)
    }

    pub fn set_expanded(&mut self, path: &str, expanded: bool) {
        self.expansion.set_expanded(path, expanded);
    }

    pub fn toggle_expanded(&mut self, path: &str) -> bool {
        self.expansion.toggle(path)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn active_file(&self) -> Option<&str> {
        self.active_file.as_deref()
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.reconciler.policy()
    }

    /// Diagnostics from the last build or refresh
    pub fn diagnostics(&self) -> &[EngineError] {
        &self.diagnostics
    }

    pub fn root_name(&self) -> Option<&str> {
        self.root.as_ref().map(|r| r.name())
    }

    pub fn is_open(&self) -> bool {
        self.root.is_some()
    }

    fn require_root(&self) -> Result<&Arc<dyn DirectoryCapability>> {
        self.root.as_ref().ok_or(EngineError::NoRoot)
    }
}
