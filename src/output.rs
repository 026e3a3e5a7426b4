//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored messages,
//! progress tracking and the per-extension summary table.

use crate::file_organizer::ExtensionCounts;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Label shown for files without an extension.
pub const NO_EXTENSION_LABEL: &str = "(none)";

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use smartfile::output::OutputFormatter;
    /// OutputFormatter::success("Copied photo.jpg to photo_01.jpg");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for file transfers.
    ///
    /// Pass `0` when the total is not known yet and call `set_length` later.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Display label for a normalized extension.
    pub fn extension_label(extension: &str) -> &str {
        if extension.is_empty() {
            NO_EXTENSION_LABEL
        } else {
            extension
        }
    }

    /// Prints a summary table with file counts by extension.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use smartfile::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("jpg".to_string(), 15);
    /// counts.insert("txt".to_string(), 8);
    /// OutputFormatter::summary_table(&counts, 24);
    /// ```
    pub fn summary_table(counts: &ExtensionCounts, attempted: usize) {
        Self::header("SUMMARY");

        let total: usize = counts.values().sum();

        let label_width = counts
            .keys()
            .map(|ext| Self::extension_label(ext).len())
            .max()
            .unwrap_or(0)
            .max(9); // At least "Extension" width

        println!(
            "{:<width$} | {}",
            "Extension".bold(),
            "Files".bold(),
            width = label_width
        );
        println!("{}", "-".repeat(label_width + 10));

        // BTreeMap keeps rows in extension order
        for (extension, count) in counts {
            let file_word = if *count == 1 { "file" } else { "files" };
            println!(
                "{:<width$} | {} {}",
                Self::extension_label(extension),
                count.to_string().green(),
                file_word,
                width = label_width
            );
        }

        println!("{}", "-".repeat(label_width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            if total == 1 { "file" } else { "files" },
            width = label_width
        );

        if attempted > total {
            println!(
                "{:<width$} | {} of {} attempted",
                "Failed".bold(),
                (attempted - total).to_string().red().bold(),
                attempted,
                width = label_width
            );
        }
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
