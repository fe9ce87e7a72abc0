/*!
 * Command-line interface for codeigest
 */

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use codeigest::config::{Args, Config};
use codeigest::error::{Result, ResultExt};
use codeigest::report::{DigestReport, Reporter};
use codeigest::settings::{JsonFileSettings, MemorySettings, SettingsStore};
use codeigest::traversal::collect_entries;
use codeigest::writer::DigestWriter;
use codeigest::{NotebookOptions, Session};

#[tokio::main(flavor = "current_thread")]
async fn main() -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let config = Config::from_args(Args::parse());
    config.validate()?;

    run(config).await?;
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} ⏱️  {elapsed_precise}")
            .with_context(|| "Invalid progress template")?,
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress.set_prefix("⚙️ Setup");

    let start_time = Instant::now();
    let mut session = Session::open(open_settings(&config)?);

    for ext in &config.add_extensions {
        if session.add_extension(ext).await.is_none() {
            warn!(extension = %ext, "Extension not added");
        }
    }
    for ext in &config.remove_extensions {
        if session.remove_extension(ext).is_none() {
            warn!(extension = %ext, "Extension not removed");
        }
    }
    if config.changes_notebook_options() {
        let current = session.notebook_options();
        session.set_notebook_options(NotebookOptions::new(
            config.include_outputs.unwrap_or(current.include_outputs),
            config.include_images.unwrap_or(current.include_images),
        ));
    }

    progress.set_prefix("📂 Scanning");
    progress.set_message(format!("{} item(s)", config.paths.len()));
    let entries = collect_entries(config.paths.as_slice()).await;

    progress.set_prefix("📊 Reading");
    progress.set_message(format!("{} file(s)", entries.len()));
    if session.ingest(entries).await.is_empty() {
        warn!("No files found under the given paths");
    }

    progress.set_prefix("📝 Writing");
    let writer = DigestWriter::new(config.format);
    let digest = writer.render(&session)?;
    progress.finish_and_clear();

    writer.write(&digest, config.output.as_deref())?;
    let duration = start_time.elapsed();

    if config.show_tree {
        eprintln!("\n{}", session.tree().render());
    }

    if config.report {
        let output = config
            .output
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "stdout".to_string());
        let report = DigestReport::collect(session.repository(), &digest, output, duration);
        Reporter::new().print_report(&report);
    }

    Ok(())
}

/// Open the settings file, falling back to memory when there is no config dir
fn open_settings(config: &Config) -> Result<Arc<dyn SettingsStore>> {
    let path = config
        .settings_path
        .clone()
        .or_else(JsonFileSettings::default_path);

    match path {
        Some(path) => Ok(Arc::new(JsonFileSettings::open(path)?)),
        None => {
            warn!("No config directory, settings will not be saved");
            Ok(Arc::new(MemorySettings::new()))
        }
    }
}
