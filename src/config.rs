/*!
 * Configuration handling for codeigest
 */

use std::path::PathBuf;

use clap::Parser;

use crate::ensure;
use crate::error::Result;
use crate::writer::OutputFormat;

/// Command-line arguments for codeigest
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "codeigest",
    version = env!("CARGO_PKG_VERSION"),
    about = "Flatten project files into one text digest for LLM context",
    long_about = "Reads files and folders, keeps those whose extension is on the allow-list, flattens Jupyter notebooks to plain text and writes everything as a single digest."
)]
pub struct Args {
    /// Files or directories to digest
    #[clap(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Output file (stdout when omitted)
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::default())]
    pub format: OutputFormat,

    /// Comma-separated extensions to add to the saved allow-list
    #[clap(long, value_delimiter = ',')]
    pub add_ext: Vec<String>,

    /// Comma-separated extensions to remove from the saved allow-list
    #[clap(long, value_delimiter = ',')]
    pub remove_ext: Vec<String>,

    /// Include code cell outputs when flattening notebooks (saved)
    #[clap(long)]
    pub outputs: Option<bool>,

    /// Keep images when flattening notebooks (saved)
    #[clap(long)]
    pub images: Option<bool>,

    /// Print the folder tree to stderr
    #[clap(long)]
    pub tree: bool,

    /// Settings file to use instead of the default location
    #[clap(long)]
    pub settings: Option<PathBuf>,

    /// Skip the summary report
    #[clap(long)]
    pub no_report: bool,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Items to traverse
    pub paths: Vec<PathBuf>,

    /// Output file, `None` for stdout
    pub output: Option<PathBuf>,

    /// Output format
    pub format: OutputFormat,

    /// Extensions to allow before ingesting
    pub add_extensions: Vec<String>,

    /// Extensions to disallow before ingesting
    pub remove_extensions: Vec<String>,

    /// New value for the notebook outputs flag
    pub include_outputs: Option<bool>,

    /// New value for the notebook images flag
    pub include_images: Option<bool>,

    /// Print the folder tree
    pub show_tree: bool,

    /// Settings file path, `None` for the default location
    pub settings_path: Option<PathBuf>,

    /// Print the summary report
    pub report: bool,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Self {
        let clean = |exts: Vec<String>| -> Vec<String> {
            exts.into_iter()
                .map(|ext| ext.trim().to_string())
                .filter(|ext| !ext.is_empty())
                .collect()
        };

        Self {
            paths: args.paths,
            output: args.output,
            format: args.format,
            add_extensions: clean(args.add_ext),
            remove_extensions: clean(args.remove_ext),
            include_outputs: args.outputs,
            include_images: args.images,
            show_tree: args.tree,
            settings_path: args.settings,
            report: !args.no_report,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.paths.is_empty(), Config, "No input paths given");

        for path in &self.paths {
            ensure!(
                path.exists(),
                Config,
                "Input path not found: {}",
                path.display()
            );
        }

        if let Some(parent) = self.output.as_ref().and_then(|output| output.parent()) {
            ensure!(
                parent.as_os_str().is_empty() || parent.exists(),
                Config,
                "Output directory not found: {}",
                parent.display()
            );
        }

        if let Some(output) = &self.output {
            ensure!(
                !output.is_dir(),
                Config,
                "Output path is a directory: {}",
                output.display()
            );
        }

        Ok(())
    }

    /// Whether notebook flags should be updated
    pub fn changes_notebook_options(&self) -> bool {
        self.include_outputs.is_some() || self.include_images.is_some()
    }
}
