//! pdfbundle - Assemble indexed, paginated PDF bundles.

mod cli;

use std::path::Path;
use std::process;

use anyhow::Context;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::{BuildArgs, Cli, Command, InitArgs, PlanArgs, is_json};
use pdfbundle::bundle::{BundleBuilder, BundlePlan};
use pdfbundle::config::OverwriteMode;
use pdfbundle::error::BundleError;
use pdfbundle::io::{PdfWriter, load_config_file, probe_all, save_config_file};
use pdfbundle::output::{
    OutputFormatter, display_build_statistics, display_plan, display_validation_summary,
};
use pdfbundle::validation::Validator;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Run the application and handle errors
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        process::exit(exit_code(&err));
    }
}

/// Main application logic.
async fn run(cli: Cli) -> anyhow::Result<()> {
    init_tracing(cli.log_level())?;

    let formatter = OutputFormatter::new(cli.quiet, cli.verbose > 0);

    match cli.command {
        Command::Build(args) => build(args, &formatter).await,
        Command::Plan(args) => plan(args, &formatter).await,
        Command::Init(args) => init(args, &formatter).await,
    }
}

fn init_tracing(level: Level) -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

async fn build(args: BuildArgs, formatter: &OutputFormatter) -> anyhow::Result<()> {
    formatter.section(&format!("{} v{}", pdfbundle::NAME, pdfbundle::VERSION));
    formatter.blank_line();

    formatter.info(&format!("Reading configuration: {}", args.config.display()));
    let mut config = load_config_file(&args.config)
        .await
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    args.apply_overrides(&mut config)?;

    let validator = if args.strict {
        Validator::strict()
    } else {
        Validator::new()
    };
    let summary = validator.validate_config(&config)?;
    display_validation_summary(formatter, &summary);

    let output = args.output_path(&config);
    validator
        .validate_output(&output, args.overwrite_mode())
        .await?;
    handle_output_overwrite(&output, args.overwrite_mode(), formatter).await?;

    formatter.info("Building bundle...");
    let mut bundle = BundleBuilder::with_options(args.build_options()?)
        .build(&config)
        .await?;

    formatter.info(&format!("Writing to: {}", output.display()));
    let bytes = bundle.to_bytes()?;
    let write_stats = PdfWriter::new().save_bytes(bytes, &output).await?;

    formatter.blank_line();
    formatter.success(&format!(
        "Successfully created {} ({})",
        output.display(),
        write_stats.format_file_size()
    ));

    if formatter.is_verbose() {
        formatter.section("Statistics");
    }
    display_build_statistics(formatter, &bundle.statistics, Some(&write_stats));

    Ok(())
}

async fn plan(args: PlanArgs, formatter: &OutputFormatter) -> anyhow::Result<()> {
    let mut config = load_config_file(&args.config)
        .await
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    args.apply_overrides(&mut config)?;

    let summary = Validator::new().validate_config(&config)?;
    display_validation_summary(formatter, &summary);

    let plan = BundlePlan::estimate(&config)?;
    display_plan(formatter, &config, &plan);
    Ok(())
}

async fn init(args: InitArgs, formatter: &OutputFormatter) -> anyhow::Result<()> {
    args.validate()?;

    if !is_json(&args.output) {
        formatter.warning(&format!(
            "{} does not have a .json extension",
            args.output.display()
        ));
    }
    handle_output_overwrite(&args.output, args.overwrite_mode(), formatter).await?;

    let inputs = args.expand_inputs()?;
    formatter.info(&format!("Reading {} PDF file(s)...", inputs.len()));

    let mut config = args.base_config();
    let section = config.add_section(&args.section);

    for (path, probed) in inputs.iter().zip(probe_all(&inputs, args.workers()).await) {
        let probed = probed.with_context(|| format!("Failed to read {}", path.display()))?;
        formatter.debug(&format!("{}: {} page(s)", path.display(), probed.page_count));
        section.push_document(probed.into_document());
    }

    save_config_file(&config, &args.output).await?;

    formatter.success(&format!(
        "Wrote {} document(s) to {}",
        config.document_count(),
        args.output.display()
    ));
    Ok(())
}

/// Handle output file overwrite scenarios.
async fn handle_output_overwrite(
    output: &Path,
    mode: OverwriteMode,
    formatter: &OutputFormatter,
) -> Result<(), BundleError> {
    if !tokio::fs::try_exists(output).await.unwrap_or(false) {
        return Ok(());
    }

    match mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(BundleError::output_exists(output.to_path_buf())),
        OverwriteMode::Prompt => {
            // Nobody to ask in quiet mode
            if formatter.is_quiet() {
                return Err(BundleError::output_exists(output.to_path_buf()));
            }

            formatter.warning(&format!("Output file already exists: {}", output.display()));

            use std::io::{self, Write};
            print!("Overwrite? [y/N]: ");
            io::stdout().flush().ok();

            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .map_err(|err| BundleError::other(format!("Failed to read input: {err}")))?;

            let response = response.trim().to_lowercase();
            if response == "y" || response == "yes" {
                Ok(())
            } else {
                Err(BundleError::Cancelled)
            }
        }
    }
}

/// Exit code for an error, looking through any added context.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<BundleError>()
        .map_or(1, BundleError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_handle_output_overwrite_nonexistent() {
        let formatter = OutputFormatter::quiet();
        let result =
            handle_output_overwrite(Path::new("does-not-exist.pdf"), OverwriteMode::Prompt, &formatter)
                .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_handle_output_overwrite_modes() {
        let temp_file = NamedTempFile::new().unwrap();
        let formatter = OutputFormatter::quiet();

        assert!(
            handle_output_overwrite(temp_file.path(), OverwriteMode::Force, &formatter)
                .await
                .is_ok()
        );
        assert!(matches!(
            handle_output_overwrite(temp_file.path(), OverwriteMode::NoClobber, &formatter).await,
            Err(BundleError::OutputExists { .. })
        ));
        // quiet mode cannot prompt
        assert!(matches!(
            handle_output_overwrite(temp_file.path(), OverwriteMode::Prompt, &formatter).await,
            Err(BundleError::OutputExists { .. })
        ));
    }

    #[test]
    fn test_exit_code_through_context() {
        let err = anyhow::Error::from(BundleError::page_count_mismatch("A", 3, 2))
            .context("Failed to build");
        assert_eq!(exit_code(&err), 3);

        let plain = anyhow::anyhow!("something else");
        assert_eq!(exit_code(&plain), 1);
    }
}
