//! Command-line interface module for smartfile.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Building an [`Organizer`] from patterns given on the command line or in a file
//! - Progress and summary output
//! - JSON reporting

use crate::config::PatternConfig;
use crate::file_organizer::{
    OrganizeEvent, OrganizeOptions, OrganizeReport, Organizer, TransferMode,
};
use crate::output::OutputFormatter;
use clap::{ArgAction, Parser};
use serde_json::{Value, json};
use std::path::PathBuf;

/// Rename files sequentially by extension into a target directory.
#[derive(Debug, Parser)]
#[command(name = "smartfile", version, about, long_about = None)]
pub struct Cli {
    /// Target directory where renamed files will be placed
    #[arg(short, long)]
    pub target: PathBuf,

    /// Source directory containing files to organize
    #[arg(short, long)]
    pub source: PathBuf,

    /// Naming pattern for an extension (e.g. -p jpg 'image_{:02d}'); repeatable
    #[arg(
        short,
        long = "pattern",
        num_args = 2,
        value_names = ["EXT", "PATTERN"],
        action = ArgAction::Append
    )]
    pub patterns: Vec<String>,

    /// Default naming pattern [default: file_{:02d}]
    #[arg(short, long = "default", value_name = "PATTERN")]
    pub default_pattern: Option<String>,

    /// Move files instead of copying them
    #[arg(short = 'm', long = "move")]
    pub move_files: bool,

    /// Process subdirectories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Show what would be done without touching any file
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// TOML file with naming patterns; command-line patterns take precedence
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Extension/pattern pairs in the order they were given.
    pub fn pattern_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.patterns
            .chunks_exact(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }

    pub fn options(&self) -> OrganizeOptions {
        OrganizeOptions {
            recursive: self.recursive,
            mode: TransferMode::from_move_flag(self.move_files),
            dry_run: self.dry_run,
        }
    }

    /// Builds the organizer: config file first, then command-line patterns.
    pub fn build_organizer(&self) -> Result<Organizer, String> {
        let mut organizer = Organizer::new(&self.target);

        if let Some(path) = &self.config {
            let config = PatternConfig::load(path)
                .map_err(|e| format!("Error loading configuration: {}", e))?;
            config.apply_to(&mut organizer);
        }

        if let Some(default) = &self.default_pattern {
            organizer.set_default_pattern(default.clone());
        }

        for (extension, pattern) in self.pattern_pairs() {
            organizer.set_naming_pattern(extension, pattern);
        }

        Ok(organizer)
    }
}

/// Runs the CLI application with parsed arguments.
///
/// Returns an error only for directory-level failures (missing source,
/// uncreatable target, unreadable configuration). Individual files that fail
/// are reported in the output and the returned report.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use smartfile::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["smartfile", "-t", "renamed", "-s", "downloads"]);
/// match run_cli(&cli) {
///     Ok(report) => println!("Organized {} files", report.succeeded()),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<OrganizeReport, String> {
    let organizer = cli.build_organizer()?;
    let options = cli.options();
    let quiet = cli.json;

    if !quiet {
        if options.dry_run {
            OutputFormatter::dry_run_notice(&format!(
                "Analyzing contents of: {}",
                cli.source.display()
            ));
        } else {
            OutputFormatter::info(&format!(
                "Organizing {} into {}",
                cli.source.display(),
                cli.target.display()
            ));
        }
    }

    let progress = if quiet {
        indicatif::ProgressBar::hidden()
    } else {
        OutputFormatter::create_progress_bar(0)
    };

    let verb = if options.dry_run {
        "Would place"
    } else {
        options.mode.verb()
    };

    let report = organizer
        .organize_with_progress(&cli.source, &options, |event| match event {
            OrganizeEvent::Scanned { files } => progress.set_length(files as u64),
            OrganizeEvent::Transferred(transfer) => {
                if !quiet {
                    progress.suspend(|| {
                        OutputFormatter::success(&format!(
                            "{} {} → {}",
                            verb,
                            transfer.source.display(),
                            transfer.destination.display()
                        ))
                    });
                }
                progress.inc(1);
            }
            OrganizeEvent::Failed(failure) => {
                if !quiet {
                    progress.suspend(|| OutputFormatter::error(&failure.error.to_string()));
                }
                progress.inc(1);
            }
            OrganizeEvent::GroupSkipped(group) => {
                if !quiet {
                    progress.suspend(|| {
                        OutputFormatter::error(&format!(
                            "Skipping {} {} file(s): {}",
                            group.files.len(),
                            OutputFormatter::extension_label(&group.extension),
                            group.error
                        ))
                    });
                }
                progress.inc(group.files.len() as u64);
            }
        })
        .map_err(|e| format!("Error: {}", e))?;

    progress.finish_and_clear();

    if quiet {
        let rendered = serde_json::to_string_pretty(&report_to_json(&report))
            .map_err(|e| format!("Error: JSON serialization failed: {}", e))?;
        println!("{}", rendered);
        return Ok(report);
    }

    if report.attempted() == 0 {
        OutputFormatter::info("No files found to organize.");
    }

    OutputFormatter::summary_table(&report.counts, report.attempted());

    if !report.is_complete_success() {
        OutputFormatter::warning(&format!(
            "{} of {} files could not be organized. Please review errors above.",
            report.failed(),
            report.attempted()
        ));
    }

    if options.dry_run {
        OutputFormatter::dry_run_notice("No files were modified.");
    }

    Ok(report)
}

/// Renders a report as JSON.
pub fn report_to_json(report: &OrganizeReport) -> Value {
    let mode = match report.mode {
        TransferMode::Copy => "copy",
        TransferMode::Move => "move",
    };

    let transfers: Vec<Value> = report
        .transfers
        .iter()
        .map(|t| {
            json!({
                "source": t.source.to_string_lossy(),
                "destination": t.destination.to_string_lossy(),
                "extension": t.extension,
                "index": t.index,
            })
        })
        .collect();

    let failures: Vec<Value> = report
        .failures
        .iter()
        .map(|f| {
            json!({
                "source": f.source.to_string_lossy(),
                "destination": f.destination.to_string_lossy(),
                "extension": f.extension,
                "error": f.error.to_string(),
            })
        })
        .collect();

    let skipped_groups: Vec<Value> = report
        .skipped_groups
        .iter()
        .map(|g| {
            let files: Vec<_> = g.files.iter().map(|p| p.to_string_lossy()).collect();
            json!({
                "extension": g.extension,
                "pattern": g.pattern,
                "files": files,
                "error": g.error.to_string(),
            })
        })
        .collect();

    json!({
        "dry_run": report.dry_run,
        "mode": mode,
        "counts": report.counts,
        "attempted": report.attempted(),
        "succeeded": report.succeeded(),
        "failed": report.failed(),
        "transfers": transfers,
        "failures": failures,
        "skipped_groups": skipped_groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_arguments() {
        let cli = Cli::try_parse_from(["smartfile", "-t", "out", "-s", "in"]).unwrap();

        assert_eq!(cli.target, PathBuf::from("out"));
        assert_eq!(cli.source, PathBuf::from("in"));
        assert!(!cli.move_files);
        assert!(!cli.recursive);
        assert!(cli.default_pattern.is_none());
        assert_eq!(cli.pattern_pairs().count(), 0);
    }

    #[test]
    fn test_target_and_source_are_required() {
        assert!(Cli::try_parse_from(["smartfile", "-t", "out"]).is_err());
        assert!(Cli::try_parse_from(["smartfile", "-s", "in"]).is_err());
    }

    #[test]
    fn test_parse_repeated_patterns() {
        let cli = Cli::try_parse_from([
            "smartfile",
            "--target",
            "out",
            "--source",
            "in",
            "-p",
            "jpg",
            "image_{:02d}",
            "--pattern",
            "TXT",
            "ann_{:02d}",
            "-d",
            "item_{:03d}",
            "-m",
            "-r",
        ])
        .unwrap();

        assert_eq!(
            cli.pattern_pairs().collect::<Vec<_>>(),
            vec![("jpg", "image_{:02d}"), ("TXT", "ann_{:02d}")]
        );
        assert!(cli.move_files);
        assert!(cli.recursive);

        let options = cli.options();
        assert_eq!(options.mode, TransferMode::Move);
        assert!(options.recursive);
        assert!(!options.dry_run);

        let organizer = cli.build_organizer().unwrap();
        assert_eq!(organizer.patterns().resolve("jpg"), "image_{:02d}");
        assert_eq!(organizer.patterns().resolve("txt"), "ann_{:02d}");
        assert_eq!(organizer.patterns().resolve("pdf"), "item_{:03d}");
    }

    #[test]
    fn test_pattern_needs_two_values() {
        assert!(Cli::try_parse_from(["smartfile", "-t", "out", "-s", "in", "-p", "jpg"]).is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from([
            "smartfile",
            "-t",
            "out",
            "-s",
            "in",
            "-c",
            "/non/existent/patterns.toml",
        ])
        .unwrap();

        assert!(cli.build_organizer().is_err());
    }

    #[test]
    fn test_report_to_json_shape() {
        let report = OrganizeReport::default();
        let value = report_to_json(&report);

        assert_eq!(value["mode"], "copy");
        assert_eq!(value["attempted"], 0);
        assert!(value["counts"].as_object().unwrap().is_empty());
        assert!(value["transfers"].as_array().unwrap().is_empty());
    }
}
