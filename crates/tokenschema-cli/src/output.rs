//! Output formatting and writing utilities
//!
//! Validation results are written as indented error trees for people or as
//! JSON/YAML for tools. Machine formats serialize every report of a run as
//! one document.
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};
use tokenschema_core::ValidationError;
use tracing::trace;

/// Outcome of validating one document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub document: String,
    pub valid: bool,
    /// Top-level errors plus all nested causes
    pub error_count: usize,
    pub errors: Vec<ValidationError>,
}

impl DocumentReport {
    pub fn new(document: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        Self {
            document: document.into(),
            valid: errors.is_empty(),
            error_count: errors.iter().map(ValidationError::count).sum(),
            errors,
        }
    }
}

/// What `check` learned about a schema
#[derive(Debug, Clone, Serialize)]
pub struct SchemaSummary {
    pub schema: String,
    pub nodes: usize,
    pub identified_schemas: usize,
    pub tracks_unevaluated: bool,
    /// Keywords outside the vocabulary, kept for custom validators
    pub extension_keywords: Vec<String>,
}

/// Formatting for the report types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format the reports of one run
    fn format_reports(&self, reports: &[DocumentReport]) -> Result<String>;

    /// Format a schema summary
    fn format_summary(&self, summary: &SchemaSummary) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    fn format_reports(&self, reports: &[DocumentReport]) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(reports
                .iter()
                .map(format_report_human)
                .collect::<Vec<_>>()
                .join("\n")),
            _ => self.format(&reports),
        }
    }

    fn format_summary(&self, summary: &SchemaSummary) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_summary_human(summary)),
            _ => self.format(summary),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self::with_writer(format, use_color, quiet, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.dimmed().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write the reports of a run
    pub fn reports(&mut self, reports: &[DocumentReport]) -> Result<()> {
        trace!(count = reports.len(), "writing reports");
        if self.format != OutputFormat::Human {
            let formatted = self.format.format_reports(reports)?;
            return self.writeln(formatted.trim_end());
        }

        for report in reports {
            if report.valid && self.quiet {
                continue;
            }
            if self.use_color {
                let header = report_header(report);
                let header = if report.valid {
                    header.green().to_string()
                } else {
                    header.red().bold().to_string()
                };
                self.writeln(&header)?;
                let tree = format_error_tree(&report.errors, 1);
                if !tree.is_empty() {
                    self.writeln(tree.trim_end())?;
                }
            } else {
                self.writeln(format_report_human(report).trim_end())?;
            }
        }
        Ok(())
    }

    /// Write a schema summary
    pub fn summary(&mut self, summary: &SchemaSummary) -> Result<()> {
        if self.quiet && self.format == OutputFormat::Human {
            return Ok(());
        }
        let formatted = self.format.format_summary(summary)?;
        self.writeln(formatted.trim_end())
    }
}

fn report_header(report: &DocumentReport) -> String {
    if report.valid {
        format!("✓ {} is valid", report.document)
    } else {
        format!(
            "✗ {}: {} error(s)",
            report.document, report.error_count
        )
    }
}

/// Format one report as a header line followed by its error tree
fn format_report_human(report: &DocumentReport) -> String {
    let mut output = report_header(report);
    output.push('\n');
    output.push_str(&format_error_tree(&report.errors, 1));
    output
}

/// Render errors one per line, children indented under their parent
pub fn format_error_tree(errors: &[ValidationError], level: usize) -> String {
    let mut output = String::new();
    for error in errors {
        output.push_str(&"  ".repeat(level));
        output.push_str("- ");
        output.push_str(&error.to_string());
        if let Some(uri) = error.schema_uri() {
            output.push_str(&format!(" [{}]", uri));
        }
        output.push('\n');
        output.push_str(&format_error_tree(error.children(), level + 1));
    }
    output
}

fn format_summary_human(summary: &SchemaSummary) -> String {
    let mut output = format!("✓ {} compiled\n", summary.schema);
    output.push_str(&format!("  Nodes: {}\n", summary.nodes));
    output.push_str(&format!("  Identified schemas: {}\n", summary.identified_schemas));
    output.push_str(&format!(
        "  Unevaluated keywords: {}\n",
        if summary.tracks_unevaluated { "yes" } else { "no" }
    ));
    if !summary.extension_keywords.is_empty() {
        output.push_str(&format!(
            "  Extension keywords: {}\n",
            summary.extension_keywords.join(", ")
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    include!("output/tests.rs");
}
