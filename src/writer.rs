/*!
 * Export rendering and output for treepick
 *
 * Each record is preceded by a blank line and a header line:
 *
 * ```text
 *
 * --- Prompt Instruction: prompt.md ---
 * Be concise
 *
 *
 *
 * --- /src/main.rs ---
 * fn main() {}
 * ```
 *
 * Rendering depends only on the records, so identical inputs give
 * byte-identical output.
 */

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::aggregator::{ExportDocument, ExportRecord, RecordKind};

/// Header prefix for the instruction record
pub const INSTRUCTION_HEADER: &str = "Prompt Instruction";

/// Render a document to its export text
pub fn render(document: &ExportDocument) -> String {
    let mut out = String::new();
    for record in document.records() {
        render_record(record, &mut out);
    }
    out
}

fn render_record(record: &ExportRecord, out: &mut String) {
    // Writing into a String cannot fail
    let _ = match record.kind {
        RecordKind::Instruction => write!(
            out,
            "\n--- {}: {} ---\n{}\n\n",
            INSTRUCTION_HEADER, record.label, record.content
        ),
        RecordKind::File => write!(out, "\n\n--- {} ---\n{}", record.label, record.content),
    };
}

/// Writes rendered exports to a file
pub struct ExportWriter {
    output_file: PathBuf,
}

impl ExportWriter {
    pub fn new(output_file: impl Into<PathBuf>) -> Self {
        Self {
            output_file: output_file.into(),
        }
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// Write the export text, replacing any existing file
    pub fn write(&self, text: &str) -> io::Result<()> {
        let file = File::create(&self.output_file)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(text.as_bytes())?;
        writer.flush()
    }
}
