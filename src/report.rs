/*!
 * Reporting functionality for treepick
 *
 * Summarizes an export as console tables (via tabled) or as JSON.
 */

use std::time::Duration;

use clap::ValueEnum;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::aggregator::ExportDocument;
use crate::session::{ExportOutcome, PublishStatus};
use crate::utils::format_file_size;

/// Information about one exported file
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileReportInfo {
    pub path: String,
    pub lines: usize,
    pub chars: usize,
}

/// Statistics for one export
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    /// Name of the exported directory
    pub root: String,
    /// Where the export went (file path, clipboard, stdout)
    pub destination: String,
    /// Time taken to build and export
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
    /// Label of the instruction document, if one was included
    pub instruction: Option<String>,
    /// Size of the rendered export in bytes
    pub export_bytes: usize,
    pub total_lines: usize,
    pub total_chars: usize,
    /// Exported files in export order
    pub files: Vec<FileReportInfo>,
    /// Files that could not be exported, with the reason
    pub failures: Vec<(String, String)>,
    /// Publish result, when publishing was requested
    pub publish: Option<String>,
    /// Local time the export finished
    pub finished_at: String,
}

fn serialize_duration<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl ExportReport {
    /// Collect statistics from a finished export
    pub fn from_outcome(
        root: &str,
        destination: &str,
        duration: Duration,
        outcome: &ExportOutcome,
    ) -> Self {
        let document: &ExportDocument = &outcome.document;
        let files: Vec<FileReportInfo> = document
            .files
            .iter()
            .map(|record| FileReportInfo {
                path: record.label.clone(),
                lines: record.content.lines().count(),
                chars: record.content.chars().count(),
            })
            .collect();

        let failures = document
            .failures
            .iter()
            .map(|e| (e.path().unwrap_or("?").to_string(), e.to_string()))
            .collect();

        let publish = match &outcome.publish {
            PublishStatus::NotRequested => None,
            PublishStatus::Empty => Some("nothing to publish".to_string()),
            PublishStatus::Published => Some("published".to_string()),
            PublishStatus::Failed(e) => Some(e.to_string()),
        };

        Self {
            root: root.to_string(),
            destination: destination.to_string(),
            duration,
            instruction: document.instruction.as_ref().map(|r| r.label.clone()),
            export_bytes: outcome.text.len(),
            total_lines: files.iter().map(|f| f.lines).sum(),
            total_chars: files.iter().map(|f| f.chars).sum(),
            files,
            failures,
            publish,
            finished_at: chrono::Local::now().to_rfc3339(),
        }
    }
}

/// Format of the report output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    /// Console table output
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Report generator for exports
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    fn format_number(&self, num: usize) -> String {
        if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }

    /// Generate a report string
    pub fn generate_report(&self, report: &ExportReport) -> String {
        match self.format {
            ReportFormat::Table => self.generate_console_report(report),
            ReportFormat::Json => serde_json::to_string_pretty(report)
                .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e)),
        }
    }

    /// Print the report to stderr, keeping stdout for the export itself
    pub fn print_report(&self, report: &ExportReport) {
        eprintln!("\n{}", self.generate_report(report));
    }

    fn style(table: &mut Table) {
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));
    }

    fn create_summary_table(&self, report: &ExportReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let mut rows = vec![
            SummaryRow {
                key: "📂 Directory".to_string(),
                value: report.root.clone(),
            },
            SummaryRow {
                key: "📤 Destination".to_string(),
                value: report.destination.clone(),
            },
            SummaryRow {
                key: "⏱️ Process Time".to_string(),
                value: format!("{:.4?}", report.duration),
            },
            SummaryRow {
                key: "📄 Files Exported".to_string(),
                value: self.format_number(report.files.len()),
            },
            SummaryRow {
                key: "📝 Total Lines".to_string(),
                value: self.format_number(report.total_lines),
            },
            SummaryRow {
                key: "📦 Export Size".to_string(),
                value: format_file_size(report.export_bytes as u64),
            },
            SummaryRow {
                key: "🔢 LLM Tokens".to_string(),
                value: format!(
                    "{} tokens (estimated)",
                    self.format_number(report.total_chars / 4)
                ),
            },
        ];

        if let Some(instruction) = &report.instruction {
            rows.push(SummaryRow {
                key: "🧭 Instruction".to_string(),
                value: instruction.clone(),
            });
        }

        if let Some(publish) = &report.publish {
            rows.push(SummaryRow {
                key: "📋 Clipboard".to_string(),
                value: publish.clone(),
            });
        }

        let mut table = Table::new(rows);
        Self::style(&mut table);
        table.to_string()
    }

    fn create_files_table(&self, report: &ExportReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Lines")]
            lines: String,

            #[tabled(rename = "Est. Tokens")]
            tokens: String,
        }

        let rows: Vec<FileRow> = report
            .files
            .iter()
            .map(|info| FileRow {
                path: info.path.clone(),
                lines: self.format_number(info.lines),
                tokens: self.format_number(info.chars / 4),
            })
            .collect();

        let mut table = Table::new(rows);
        Self::style(&mut table);
        table.to_string()
    }

    fn create_failures_table(&self, report: &ExportReport) -> String {
        #[derive(Tabled)]
        struct FailureRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Reason")]
            reason: String,
        }

        let rows: Vec<FailureRow> = report
            .failures
            .iter()
            .map(|(path, reason)| FailureRow {
                path: path.clone(),
                reason: reason.clone(),
            })
            .collect();

        let mut table = Table::new(rows);
        Self::style(&mut table);
        table.to_string()
    }

    fn generate_console_report(&self, report: &ExportReport) -> String {
        let mut out = format!(
            "📋  EXPORTED FILES\n{}\n\n✅  EXPORT COMPLETE\n{}",
            self.create_files_table(report),
            self.create_summary_table(report)
        );

        if !report.failures.is_empty() {
            out.push_str(&format!(
                "\n\n⚠️  SKIPPED FILES\n{}",
                self.create_failures_table(report)
            ));
        }

        out
    }
}
