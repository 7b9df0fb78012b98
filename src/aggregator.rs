/*!
 * Content aggregation
 *
 * Turns the selected files of a tree into an ordered export document. Every
 * file is read through a handle resolved fresh from the root, so the export
 * reflects the disk at export time rather than at build time.
 */

use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::capability::{resolve_file, DirectoryCapability};
use crate::error::{CapabilityError, EngineError, Result};
use crate::types::Tree;
use crate::writer;

/// File reads allowed in flight at once during an export
pub const MAX_CONCURRENT_READS: usize = 64;

/// Instruction document placed ahead of the file records
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    /// Label shown in the record header, usually the source file name
    pub name: String,
    pub content: String,
}

impl Instruction {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Load an instruction document from a local file
    pub async fn from_file(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| EngineError::Read {
                source: CapabilityError::from_io(&display, e),
                path: display.clone(),
            })?;
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Ok(Self::new(name, content))
    }
}

/// What a record holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Instruction,
    File,
}

/// One labelled block of the export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRecord {
    pub kind: RecordKind,
    /// Tree path for files, source name for the instruction
    pub label: String,
    pub content: String,
}

/// The aggregation result
#[derive(Debug, Default)]
pub struct ExportDocument {
    pub instruction: Option<ExportRecord>,
    /// File records in tree order
    pub files: Vec<ExportRecord>,
    /// Files that were selected but could not be exported
    pub failures: Vec<EngineError>,
}

impl ExportDocument {
    /// All records, instruction first
    pub fn records(&self) -> impl Iterator<Item = &ExportRecord> {
        self.instruction.iter().chain(self.files.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.instruction.is_none() && self.files.is_empty()
    }

    /// Render to the export text
    pub fn render(&self) -> String {
        writer::render(self)
    }
}

/// Collect every selected file of `tree` in depth-first pre-order.
///
/// A file that cannot be resolved or read is recorded in
/// [`ExportDocument::failures`] and skipped; the rest of the export proceeds.
/// An empty instruction is treated as absent.
pub async fn aggregate(
    tree: &Tree,
    root: &Arc<dyn DirectoryCapability>,
    instruction: Option<&Instruction>,
) -> ExportDocument {
    let selected: Vec<&str> = tree
        .walk()
        .filter(|n| n.selected && n.is_file())
        .map(|n| n.path.as_str())
        .collect();

    // `buffered` yields in input order, whatever order the reads finish in
    let reads: Vec<Result<ExportRecord>> = stream::iter(selected)
        .map(|path| read_record(root, path))
        .buffered(MAX_CONCURRENT_READS)
        .collect()
        .await;

    let mut document = ExportDocument {
        instruction: instruction
            .filter(|i| !i.content.is_empty())
            .map(|i| ExportRecord {
                kind: RecordKind::Instruction,
                label: i.name.clone(),
                content: i.content.clone(),
            }),
        ..Default::default()
    };

    for read in reads {
        match read {
            Ok(record) => document.files.push(record),
            Err(e) => {
                warn!("skipping file in export: {}", e);
                document.failures.push(e);
            }
        }
    }

    debug!(
        "aggregated {} files ({} failed)",
        document.files.len(),
        document.failures.len()
    );
    document
}

async fn read_record(root: &Arc<dyn DirectoryCapability>, path: &str) -> Result<ExportRecord> {
    let file = resolve_file(root, path)
        .await
        .map_err(|source| EngineError::Resolution {
            path: path.to_string(),
            source,
        })?;
    let content = file.read_text().await.map_err(|source| EngineError::Read {
        path: path.to_string(),
        source,
    })?;

    Ok(ExportRecord {
        kind: RecordKind::File,
        label: path.to_string(),
        content,
    })
}
