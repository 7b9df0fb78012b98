/*!
 * Interactive line-oriented front end
 *
 * Reads one command per line, dispatches it to a [`Session`] and prints the
 * resulting snapshot. It holds no state of its own beyond the session.
 */

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::aggregator::Instruction;
use crate::capability::{DirectoryCapability, DirectoryHandleProvider, EntryFilter, PathProvider};
use crate::clipboard::PublishSink;
use crate::error::{EngineError, Result};
use crate::session::{PublishStatus, Session};
use crate::types::TreeNode;
use crate::utils::normalize_path;
use crate::writer::ExportWriter;

const HELP: &str = "\
commands:
  tree                    show the tree (expanded directories only)
  select PATH             select PATH and everything below it
  deselect PATH           deselect PATH and everything below it
  expand PATH | collapse PATH
  selected                list selected paths
  refresh                 rebuild the tree from disk
  active [PATH]           mark a file for targeted refresh (no PATH clears)
  reload                  re-read the active file
  instruction [FILE]      set the instruction document (no FILE clears)
  export [FILE]           print the export, or write it to FILE
  copy                    copy the export to the clipboard
  open [DIR]              open another directory
  clear                   forget the directory and instruction
  help | quit";

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tree,
    Select(String),
    Deselect(String),
    Expand(String),
    Collapse(String),
    Selected,
    Refresh,
    Active(Option<String>),
    Reload,
    Instruction(Option<PathBuf>),
    Export(Option<PathBuf>),
    Copy,
    Open(Option<PathBuf>),
    Clear,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let arg = if rest.is_empty() { None } else { Some(rest) };

        let path = |arg: Option<&str>| -> std::result::Result<String, String> {
            arg.and_then(normalize_path)
                .ok_or_else(|| format!("{} needs a path", word))
        };

        let command = match word {
            "tree" | "ls" => Self::Tree,
            "select" => Self::Select(path(arg)?),
            "deselect" => Self::Deselect(path(arg)?),
            "expand" => Self::Expand(path(arg)?),
            "collapse" => Self::Collapse(path(arg)?),
            "selected" => Self::Selected,
            "refresh" => Self::Refresh,
            "active" => Self::Active(arg.and_then(normalize_path)),
            "reload" => Self::Reload,
            "instruction" => Self::Instruction(arg.map(PathBuf::from)),
            "export" => Self::Export(arg.map(PathBuf::from)),
            "copy" => Self::Copy,
            "open" => Self::Open(arg.map(PathBuf::from)),
            "clear" => Self::Clear,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command: {}", other)),
        };
        Ok(Some(command))
    }
}

/// Provider for `open`: the path typed after the command, or a dismissed
/// prompt when nothing was typed
struct TypedPathProvider {
    answer: Option<PathBuf>,
    filter: EntryFilter,
}

#[async_trait]
impl DirectoryHandleProvider for TypedPathProvider {
    async fn acquire(&self) -> Result<Arc<dyn DirectoryCapability>> {
        match &self.answer {
            None => Err(EngineError::UserCancelled),
            Some(path) => PathProvider::new(path, self.filter.clone()).acquire().await,
        }
    }
}

/// Interactive shell over a session
pub struct Shell<'a> {
    session: &'a mut Session,
    filter: EntryFilter,
    sink: Box<dyn PublishSink>,
}

impl<'a> Shell<'a> {
    pub fn new(session: &'a mut Session, filter: EntryFilter, sink: Box<dyn PublishSink>) -> Self {
        Self {
            session,
            filter,
            sink,
        }
    }

    /// Run until `quit` or end of input
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        write!(out, "> ")?;
        out.flush()?;

        while let Some(line) = lines.next_line().await? {
            match Command::parse(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    if let Err(e) = self.execute(command, out).await {
                        writeln!(out, "error: {}", e)?;
                    }
                }
                Err(message) => writeln!(out, "{}", message)?,
            }
            write!(out, "> ")?;
            out.flush()?;
        }
        writeln!(out)?;
        Ok(())
    }

    /// Apply one command and print its result
    pub async fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<()> {
        match command {
            Command::Tree => self.print_tree(out)?,
            Command::Select(path) => self.session.toggle(&path, true)?,
            Command::Deselect(path) => self.session.toggle(&path, false)?,
            Command::Expand(path) => self.session.set_expanded(&path, true),
            Command::Collapse(path) => self.session.set_expanded(&path, false),
            Command::Selected => {
                for path in self.session.selected_paths() {
                    writeln!(out, "{}", path)?;
                }
            }
            Command::Refresh => {
                let summary = self.session.refresh().await?;
                for path in &summary.dropped {
                    writeln!(out, "deselected {}", path)?;
                }
                if summary.active_file_cleared {
                    writeln!(out, "active file no longer exists")?;
                }
                self.print_diagnostics(out)?;
            }
            Command::Active(path) => self.session.set_active_file(path.as_deref())?,
            Command::Reload => match self.session.refresh_active_file().await? {
                Some(content) => writeln!(out, "{}", content)?,
                None => writeln!(out, "no active file")?,
            },
            Command::Instruction(None) => self.session.clear_instruction(),
            Command::Instruction(Some(path)) => {
                let instruction = Instruction::from_file(&path).await?;
                writeln!(out, "instruction: {}", instruction.name)?;
                self.session.set_instruction(instruction);
            }
            Command::Export(target) => {
                let outcome = self.session.export(None).await?;
                match target {
                    Some(path) => {
                        ExportWriter::new(&path).write(&outcome.text)?;
                        writeln!(out, "wrote {}", path.display())?;
                    }
                    None => writeln!(out, "{}", outcome.text)?,
                }
                for failure in &outcome.document.failures {
                    writeln!(out, "skipped: {}", failure)?;
                }
            }
            Command::Copy => {
                let outcome = self.session.export(Some(self.sink.as_ref())).await?;
                match outcome.publish {
                    PublishStatus::Published => writeln!(out, "copied to clipboard")?,
                    PublishStatus::Empty => writeln!(out, "no file content to copy")?,
                    PublishStatus::Failed(e) => writeln!(out, "failed to copy: {}", e)?,
                    PublishStatus::NotRequested => {}
                }
            }
            Command::Open(answer) => {
                let provider = TypedPathProvider {
                    answer,
                    filter: self.filter.clone(),
                };
                if self.session.open(&provider).await? {
                    self.print_diagnostics(out)?;
                    self.print_tree(out)?;
                }
            }
            Command::Clear => self.session.clear(),
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => {}
        }
        Ok(())
    }

    fn print_diagnostics<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for diagnostic in self.session.diagnostics() {
            writeln!(out, "warning: {}", diagnostic)?;
        }
        Ok(())
    }

    fn print_tree<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        match self.session.root_name() {
            Some(name) => writeln!(out, "{}/", name)?,
            None => return writeln!(out, "no directory is open"),
        }
        for node in &self.session.tree().nodes {
            self.print_node(node, 1, out)?;
        }
        Ok(())
    }

    fn print_node<W: Write>(&self, node: &TreeNode, depth: usize, out: &mut W) -> std::io::Result<()> {
        let check = if node.selected { "[x]" } else { "[ ]" };
        let indent = "  ".repeat(depth);

        if node.is_dir() {
            let expanded = self.session.is_expanded(&node.path);
            let marker = if expanded { "[-]" } else { "[+]" };
            writeln!(out, "{}{} {} {}/", indent, marker, check, node.name)?;
            if expanded {
                for child in node.children() {
                    self.print_node(child, depth + 1, out)?;
                }
            }
        } else {
            writeln!(out, "{}    {} {}", indent, check, node.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  "), Ok(None));
        assert_eq!(
            Command::parse("select docs/"),
            Ok(Some(Command::Select("/docs".to_string())))
        );
        assert_eq!(Command::parse("active"), Ok(Some(Command::Active(None))));
        assert_eq!(
            Command::parse("export out.txt"),
            Ok(Some(Command::Export(Some(PathBuf::from("out.txt")))))
        );
        assert_eq!(Command::parse("open"), Ok(Some(Command::Open(None))));
        assert_eq!(Command::parse("quit"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("select").is_err());
        assert!(Command::parse("frobnicate x").is_err());
    }
}
