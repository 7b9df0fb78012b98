/*!
 * treepick - Select files from a directory tree and export their contents
 *
 * This library walks a directory into an in-memory tree, keeps a cascading
 * selection over it, reconciles both against the live filesystem on refresh,
 * and aggregates the selected files into one text export for use as context
 * for Large Language Models.
 */

pub mod aggregator;
pub mod builder;
pub mod capability;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod expansion;
pub mod refresh;
pub mod report;
pub mod selection;
pub mod session;
pub mod shell;
pub mod types;
pub mod utils;
pub mod writer;


// Re-export main components for easier access
pub use aggregator::{aggregate, ExportDocument, ExportRecord, Instruction, RecordKind};
pub use builder::{BuildOutput, TreeBuilder};
pub use capability::{
    DirEntry, DirectoryCapability, DirectoryHandleProvider, EntryFilter, FileCapability,
    LocalDirectory, PathProvider,
};
pub use clipboard::{PublishSink, SystemClipboard};
pub use config::Config;
pub use error::{CapabilityError, EngineError, Result};
pub use expansion::ExpansionState;
pub use refresh::{Reconciler, RefreshOutput, RefreshPolicy};
pub use report::{ExportReport, ReportFormat, Reporter};
pub use session::{ExportOutcome, PublishStatus, Session};
pub use types::{NodeKind, SelectionSet, Tree, TreeNode};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
