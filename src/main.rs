/*!
 * Command-line interface for treepick
 */

use std::io::{self, Write};
use std::time::Instant;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::BufReader;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use treepick::aggregator::Instruction;
use treepick::capability::{DirectoryHandleProvider, PathProvider};
use treepick::clipboard::{PublishSink, SystemClipboard};
use treepick::config::{Args, Config};
use treepick::report::{ExportReport, Reporter};
use treepick::session::{PublishStatus, Session};
use treepick::shell::Shell;
use treepick::types::SelectionSet;
use treepick::writer::ExportWriter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.generate {
        let mut command = Args::command();
        clap_complete::generate(shell, &mut command, "treepick", &mut io::stdout());
        return Ok(());
    }

    let config = Config::from_args(args);
    init_tracing(config.verbose);
    config.validate()?;

    let mut session = Session::new(config.refresh_policy);

    if let Some(path) = &config.instruction {
        session.set_instruction(Instruction::from_file(path).await?);
    }

    if config.interactive {
        let provider = PathProvider::new(&config.target_dir, config.entry_filter());
        session.open(&provider).await?;
        for diagnostic in session.diagnostics() {
            eprintln!("warning: {}", diagnostic);
        }

        let mut shell = Shell::new(&mut session, config.entry_filter(), Box::new(SystemClipboard::new()));
        let mut stdout = io::stdout();
        return shell.run(BufReader::new(tokio::io::stdin()), &mut stdout).await;
    }

    run_export(&config, &mut session).await
}

/// Build the tree, apply the requested selection and export once
async fn run_export(config: &Config, session: &mut Session) -> io::Result<()> {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} ⏱️  {elapsed_precise}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.enable_steady_tick(std::time::Duration::from_millis(100));
    progress.set_prefix("📊 Building");
    progress.set_message(format!("📂 {}", config.target_dir.display()));

    let start_time = Instant::now();

    let provider = PathProvider::new(&config.target_dir, config.entry_filter());
    let root = provider.acquire().await?;
    session.open_root(root, &SelectionSet::new()).await;

    for diagnostic in session.diagnostics() {
        progress.suspend(|| warn!("{}", diagnostic));
    }

    for path in &config.select {
        if let Err(e) = session.toggle(path, true) {
            progress.suspend(|| eprintln!("⚠️ Warning: {}", e));
        }
    }

    progress.set_prefix("📊 Exporting");
    progress.set_message(format!("{} selected paths", session.selected_paths().len()));

    let clipboard = SystemClipboard::new();
    let sink: Option<&dyn PublishSink> = if config.clip {
        Some(&clipboard as &dyn PublishSink)
    } else {
        None
    };
    let outcome = session.export(sink).await?;

    progress.finish_and_clear();

    let destination = match &config.output_file {
        Some(path) => {
            ExportWriter::new(path).write(&outcome.text)?;
            path.display().to_string()
        }
        None if config.clip => "clipboard".to_string(),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(outcome.text.as_bytes())?;
            stdout.flush()?;
            "stdout".to_string()
        }
    };

    match &outcome.publish {
        PublishStatus::Failed(e) => eprintln!("⚠️ Failed to copy to clipboard: {}", e),
        PublishStatus::Empty => eprintln!("No file content to copy."),
        PublishStatus::Published | PublishStatus::NotRequested => {}
    }

    let report = ExportReport::from_outcome(
        session.root_name().unwrap_or_default(),
        &destination,
        start_time.elapsed(),
        &outcome,
    );
    Reporter::new(config.report).print_report(&report);

    Ok(())
}
