/*!
 * Configuration handling for treepick
 */

use std::io;
use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::capability::EntryFilter;
use crate::refresh::RefreshPolicy;
use crate::report::ReportFormat;
use crate::utils::normalize_path;

/// Command-line arguments for treepick
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "treepick",
    version = env!("CARGO_PKG_VERSION"),
    about = "Select files from a directory tree and export their contents for LLM context",
    long_about = "Builds a tree of a directory, lets you select files and folders (selecting a folder selects everything below it), and exports the selected files' contents as one text blob, optionally prefixed by an instruction document."
)]
pub struct Args {
    /// Directory to browse
    #[clap(default_value = ".")]
    pub directory_path: String,

    /// Comma-separated list of paths to select, relative to the directory
    #[clap(long, short = 's', value_delimiter = ',')]
    pub select: Vec<String>,

    /// Instruction document placed ahead of the file contents
    #[clap(long, short = 'i')]
    pub instruction: Option<String>,

    /// What happens to the selection when the tree is refreshed
    #[clap(long, value_enum, default_value_t = RefreshPolicy::default())]
    pub refresh_policy: RefreshPolicy,

    /// Comma-separated list of name patterns to hide from the tree
    #[clap(long, value_delimiter = ',')]
    pub ignore_patterns: Vec<String>,

    /// Hide common build, cache and VCS directories
    #[clap(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub default_ignores: bool,

    /// Write the export to this file instead of stdout
    #[clap(long, short = 'o')]
    pub output: Option<String>,

    /// Copy the export to the system clipboard
    #[clap(long, help = "Copy output to system clipboard")]
    pub clip: bool,

    /// Start an interactive session instead of exporting once
    #[clap(long)]
    pub interactive: bool,

    /// Format of the export report
    #[clap(long, value_enum, default_value_t = ReportFormat::default())]
    pub report: ReportFormat,

    /// Log debug output to stderr
    #[clap(long, short = 'v')]
    pub verbose: bool,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory to browse
    pub target_dir: PathBuf,

    /// Initial selection, normalized to tree paths
    pub select: Vec<String>,

    /// Instruction document path
    pub instruction: Option<PathBuf>,

    /// Refresh policy for the session
    pub refresh_policy: RefreshPolicy,

    /// Patterns to hide
    pub ignore_patterns: Vec<String>,

    /// Whether the default ignore list applies
    pub default_ignores: bool,

    /// Output file, stdout when absent
    pub output_file: Option<PathBuf>,

    /// Copy output to clipboard
    pub clip: bool,

    /// Run the interactive shell
    pub interactive: bool,

    /// Report format
    pub report: ReportFormat,

    /// Debug logging
    pub verbose: bool,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Self {
        Self {
            target_dir: PathBuf::from(args.directory_path),
            select: args
                .select
                .iter()
                .filter_map(|p| normalize_path(p))
                .collect(),
            instruction: args.instruction.map(PathBuf::from),
            refresh_policy: args.refresh_policy,
            ignore_patterns: args.ignore_patterns,
            default_ignores: args.default_ignores,
            output_file: args.output.map(PathBuf::from),
            clip: args.clip,
            interactive: args.interactive,
            report: args.report,
            verbose: args.verbose,
        }
    }

    /// Listing filter for the local directory capability
    pub fn entry_filter(&self) -> EntryFilter {
        EntryFilter::new(self.ignore_patterns.clone(), self.default_ignores)
    }

    /// Validate the configuration
    pub fn validate(&self) -> io::Result<()> {
        if !self.target_dir.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Target directory not found: {}", self.target_dir.display()),
            ));
        }

        if let Some(path) = &self.instruction {
            if !path.is_file() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Instruction file not found: {}", path.display()),
                ));
            }
        }

        if let Some(output) = &self.output_file {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("Output directory not found: {}", parent.display()),
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_from_args_normalizes_selection() {
        let args = Args::parse_from([
            "treepick",
            "project",
            "--select",
            "docs/,./src/main.rs,/",
            "--refresh-policy",
            "discard",
        ]);
        let config = Config::from_args(args);

        assert_eq!(config.target_dir, PathBuf::from("project"));
        assert_eq!(config.select, vec!["/docs", "/src/main.rs"]);
        assert_eq!(config.refresh_policy, RefreshPolicy::DiscardOnRefresh);
        assert!(config.default_ignores);
        assert!(config.output_file.is_none());
    }

    #[test]
    fn test_validate() -> io::Result<()> {
        let temp_dir = tempdir()?;
        let dir = temp_dir.path().to_string_lossy().to_string();
        let args = Args::parse_from(["treepick", dir.as_str()]);
        let mut config = Config::from_args(args);
        assert!(config.validate().is_ok());

        config.instruction = Some(temp_dir.path().join("missing.md"));
        assert!(config.validate().is_err());

        config.instruction = None;
        config.output_file = Some(temp_dir.path().join("nope").join("out.txt"));
        assert!(config.validate().is_err());

        config.target_dir = temp_dir.path().join("gone");
        config.output_file = None;
        assert!(config.validate().is_err());
        Ok(())
    }
}
