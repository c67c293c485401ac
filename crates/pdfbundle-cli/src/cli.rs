//! CLI argument parsing for pdfbundle.
//!
//! This module defines the command-line interface structure using `clap`.
//! Each subcommand has its own argument struct that knows how to turn itself
//! into library options.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::Level;

use pdfbundle::config::{
    BuildOptions, BundleConfig, CompressionLevel, DEFAULT_SECTION_TITLE, DateFormat, OverwriteMode,
};

/// Assemble indexed, paginated PDF bundles.
///
/// A bundle configuration lists sections of documents. pdfbundle renders an
/// index, a separator page per section and every document's pages with a
/// running page-number footer.
#[derive(Parser, Debug)]
#[command(name = "pdfbundle")]
#[command(version)]
#[command(about = "Assemble indexed, paginated PDF bundles", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output (-v for details, -vv for debug logging)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output
    ///
    /// Only errors and warnings will be printed.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a bundle PDF from a configuration file
    Build(BuildArgs),

    /// Show the index and page numbers a build would produce
    Plan(PlanArgs),

    /// Create a configuration file from PDF files
    ///
    /// Examples:
    ///   pdfbundle init pleadings/*.pdf -o bundle.json --case-number CV-1
    Init(InitArgs),
}

/// Arguments of `pdfbundle build`.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Bundle configuration (JSON)
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Output PDF file path
    ///
    /// Defaults to Bundle-<case number>.pdf in the current directory.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Force overwrite of existing output file without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite existing output file
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Do not link index rows to their documents
    #[arg(long)]
    pub no_links: bool,

    /// Do not write case metadata into the document information
    #[arg(long)]
    pub no_metadata: bool,

    /// Number pages as found when a document's recorded page count is wrong
    ///
    /// By default a mismatch between the recorded page count and the pages
    /// in the file fails the build, since every later page number would be
    /// off.
    #[arg(long)]
    pub allow_page_count_mismatch: bool,

    /// Compression level for output PDF
    ///
    /// - none: No compression
    /// - standard: Compress content streams (default)
    /// - maximum: Also drop unreferenced objects
    #[arg(short, long, value_name = "LEVEL", default_value = "standard")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: String,

    /// Override the configuration's date display format
    #[arg(long, value_name = "FORMAT")]
    #[arg(value_parser = ["DD-MM-YYYY", "MM-DD-YYYY", "YYYY-MM-DD"])]
    pub date_format: Option<String>,

    /// Treat configuration warnings as errors
    #[arg(long)]
    pub strict: bool,
}

impl BuildArgs {
    /// Library build options selected by the flags.
    pub fn build_options(&self) -> anyhow::Result<BuildOptions> {
        Ok(BuildOptions {
            links: !self.no_links,
            verify_page_counts: !self.allow_page_count_mismatch,
            compression: CompressionLevel::from_str(&self.compression)?,
            metadata: !self.no_metadata,
        })
    }

    /// Overwrite behaviour selected by the flags.
    pub fn overwrite_mode(&self) -> OverwriteMode {
        overwrite_mode(self.force, self.no_clobber)
    }

    /// Apply command-line overrides to a loaded configuration.
    pub fn apply_overrides(&self, config: &mut BundleConfig) -> anyhow::Result<()> {
        apply_date_format(self.date_format.as_deref(), config)
    }

    /// Where the bundle is written.
    pub fn output_path(&self, config: &BundleConfig) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(config.bundle_file_name()))
    }
}

/// Arguments of `pdfbundle plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Bundle configuration (JSON)
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override the configuration's date display format
    #[arg(long, value_name = "FORMAT")]
    #[arg(value_parser = ["DD-MM-YYYY", "MM-DD-YYYY", "YYYY-MM-DD"])]
    pub date_format: Option<String>,
}

impl PlanArgs {
    /// Apply command-line overrides to a loaded configuration.
    pub fn apply_overrides(&self, config: &mut BundleConfig) -> anyhow::Result<()> {
        apply_date_format(self.date_format.as_deref(), config)
    }
}

/// Arguments of `pdfbundle init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// PDF files or glob patterns, in bundle order
    #[arg(required = true, value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Configuration file to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Title of the section holding the documents
    #[arg(long, value_name = "TITLE", default_value = DEFAULT_SECTION_TITLE)]
    pub section: String,

    /// Case name
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub case_name: String,

    /// Case number
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub case_number: String,

    /// Court name
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub court_name: String,

    /// Number of files probed concurrently
    ///
    /// Default is number of CPU cores.
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Force overwrite of an existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

impl InitArgs {
    /// Check argument combinations clap cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jobs == Some(0) {
            bail!("Number of jobs must be at least 1");
        }
        if self.section.trim().is_empty() {
            bail!("Section title must not be empty");
        }
        Ok(())
    }

    /// Concurrent probes to run.
    pub fn workers(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    /// Overwrite behaviour selected by the flags.
    pub fn overwrite_mode(&self) -> OverwriteMode {
        overwrite_mode(self.force, false)
    }

    /// An empty configuration carrying the case details.
    pub fn base_config(&self) -> BundleConfig {
        BundleConfig::for_case(&self.case_number, &self.case_name, &self.court_name)
    }

    /// Expand the patterns into files, in argument order.
    ///
    /// Matches of one pattern are sorted by path. A pattern that matches
    /// nothing is an error.
    pub fn expand_inputs(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut inputs = Vec::new();

        for pattern in &self.patterns {
            let mut matches = glob::glob(pattern)
                .with_context(|| format!("Invalid pattern: {pattern}"))?
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to expand {pattern}"))?;

            if matches.is_empty() {
                bail!("No files match {pattern}");
            }

            matches.sort();
            for path in matches {
                if !inputs.contains(&path) {
                    inputs.push(path);
                }
            }
        }

        Ok(inputs)
    }
}

impl Cli {
    /// Maximum level of diagnostic log events.
    pub fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn overwrite_mode(force: bool, no_clobber: bool) -> OverwriteMode {
    if force {
        OverwriteMode::Force
    } else if no_clobber {
        OverwriteMode::NoClobber
    } else {
        OverwriteMode::Prompt
    }
}

fn apply_date_format(format: Option<&str>, config: &mut BundleConfig) -> anyhow::Result<()> {
    if let Some(format) = format {
        config.date_format = DateFormat::from_str(format)?;
    }
    Ok(())
}

/// Whether `path` names a JSON file.
pub fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pdfbundle").chain(args.iter().copied())).unwrap()
    }

    fn build_args(args: &[&str]) -> BuildArgs {
        match parse(args).command {
            Command::Build(build) => build,
            other => panic!("expected build, got {other:?}"),
        }
    }

    #[test]
    fn test_build_defaults() {
        let args = build_args(&["build", "bundle.json"]);
        let options = args.build_options().unwrap();

        assert_eq!(options, BuildOptions::default());
        assert_eq!(args.overwrite_mode(), OverwriteMode::Prompt);

        let config = BundleConfig::for_case("CV-1", "", "");
        assert_eq!(args.output_path(&config), PathBuf::from("Bundle-CV-1.pdf"));
    }

    #[test]
    fn test_build_flags() {
        let args = build_args(&[
            "build",
            "bundle.json",
            "-o",
            "out.pdf",
            "--no-links",
            "--allow-page-count-mismatch",
            "--compression",
            "maximum",
            "--force",
        ]);
        let options = args.build_options().unwrap();

        assert!(!options.links);
        assert!(!options.verify_page_counts);
        assert_eq!(options.compression, CompressionLevel::Maximum);
        assert_eq!(args.overwrite_mode(), OverwriteMode::Force);
        assert_eq!(
            args.output_path(&BundleConfig::default()),
            PathBuf::from("out.pdf")
        );
    }

    #[test]
    fn test_force_conflicts_with_no_clobber() {
        let result = Cli::try_parse_from(["pdfbundle", "build", "b.json", "--force", "--no-clobber"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_date_format_override() {
        let args = build_args(&["build", "b.json", "--date-format", "YYYY-MM-DD"]);
        let mut config = BundleConfig::default();
        args.apply_overrides(&mut config).unwrap();
        assert_eq!(config.date_format, DateFormat::Iso);
    }

    #[rstest]
    #[case(&["plan", "b.json"], Level::WARN)]
    #[case(&["plan", "b.json", "-v"], Level::INFO)]
    #[case(&["plan", "b.json", "-vv"], Level::DEBUG)]
    #[case(&["-vvv", "plan", "b.json"], Level::TRACE)]
    #[case(&["plan", "b.json", "-q"], Level::ERROR)]
    fn test_log_level(#[case] args: &[&str], #[case] expected: Level) {
        assert_eq!(parse(args).log_level(), expected);
    }

    #[test]
    fn test_init_validate() {
        let Command::Init(mut init) = parse(&["init", "a.pdf", "-o", "b.json"]).command else {
            panic!("expected init");
        };
        assert!(init.validate().is_ok());
        assert_eq!(init.section, DEFAULT_SECTION_TITLE);

        init.jobs = Some(0);
        assert!(init.validate().is_err());
    }

    #[test]
    fn test_expand_inputs() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["b.pdf", "a.pdf", "notes.txt"] {
            std::fs::write(temp_dir.path().join(name), b"").unwrap();
        }
        let dir = temp_dir.path().display();

        let Command::Init(init) = parse(&[
            "init",
            &format!("{dir}/*.pdf"),
            &format!("{dir}/a.pdf"),
            "-o",
            "b.json",
        ])
        .command
        else {
            panic!("expected init");
        };

        let inputs = init.expand_inputs().unwrap();
        assert_eq!(
            inputs,
            vec![temp_dir.path().join("a.pdf"), temp_dir.path().join("b.pdf")]
        );
    }

    #[test]
    fn test_expand_inputs_no_match() {
        let temp_dir = TempDir::new().unwrap();
        let pattern = format!("{}/*.pdf", temp_dir.path().display());

        let Command::Init(init) = parse(&["init", &pattern, "-o", "b.json"]).command else {
            panic!("expected init");
        };
        assert!(init.expand_inputs().is_err());
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(Path::new("bundle.JSON")));
        assert!(!is_json(Path::new("bundle.pdf")));
    }
}
