//
//  pampu
//  output/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Output Module
//!
//! This module renders command results in one of two formats:
//!
//! - **Table format**: Human-readable lines and tables for interactive terminal use
//! - **JSON format**: Machine-readable JSON output for scripting and automation
//!
//! ## Core Components
//!
//! - [`OutputFormat`]: Enum representing the available output formats
//! - [`OutputWriter`]: Main entry point for writing formatted output
//! - [`TableOutput`]: Trait for types that can be rendered for the terminal
//! - [`table`]: Table building and status styling using `comfy_table`
//!
//! ## Example
//!
//! ```rust,ignore
//! use pampu::output::{OutputWriter, OutputFormat};
//!
//! let writer = OutputWriter::new(OutputFormat::Json);
//! writer.write_list(&projects)?;
//!
//! writer.write_success("Created version: master-42");
//! writer.write_warning("Unknown environment(s); available: DEV, QA");
//! ```
//!
//! ## Notes
//!
//! Status messages go to stderr (errors, warnings) or stdout (info, success)
//! regardless of the format, so JSON on stdout stays parseable as long as
//! commands only print data through [`OutputWriter::write`] and
//! [`OutputWriter::write_list`] in JSON mode.

pub mod table;

pub use table::*;

use serde::Serialize;

/// Represents the available output formats for CLI output.
///
/// # Variants
///
/// * `Table` - Human-readable format, best for interactive terminal sessions
/// * `Json` - Machine-readable JSON format, ideal for scripting and piping to other tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable output with optional color support.
    #[default]
    Table,
    /// Pretty-printed JSON for scripting and automation.
    Json,
}

/// A unified output writer that handles both output formats.
///
/// # Example
///
/// ```rust,ignore
/// use pampu::output::OutputWriter;
///
/// let writer = OutputWriter::table();
/// writer.write(&build)?;
/// writer.write_warning("No builds found for PROJ-API");
/// ```
///
/// # Notes
///
/// Color output is automatically detected based on terminal capabilities.
/// Colors are disabled when output is piped or redirected.
pub struct OutputWriter {
    format: OutputFormat,
    color: bool,
}

impl OutputWriter {
    /// Creates a new output writer with the specified format.
    ///
    /// # Parameters
    ///
    /// * `format` - The [`OutputFormat`] to use for rendering output
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            color: console::colors_enabled(),
        }
    }

    /// Creates a new output writer configured for JSON output.
    pub fn json() -> Self {
        Self::new(OutputFormat::Json)
    }

    /// Creates a new output writer configured for table output.
    pub fn table() -> Self {
        Self::new(OutputFormat::Table)
    }

    /// Checks if color output is enabled.
    ///
    /// # Notes
    ///
    /// Colors are typically disabled when:
    /// - Output is piped to another program
    /// - The `NO_COLOR` environment variable is set
    /// - The terminal does not support ANSI colors
    pub fn color_enabled(&self) -> bool {
        self.color
    }

    /// Returns the output format configured for this writer.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Returns `true` when writing JSON.
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Writes a value to stdout using the configured output format.
    ///
    /// # Parameters
    ///
    /// * `value` - The value to write, must implement `Serialize` and `TableOutput`
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails (only applicable for JSON format).
    pub fn write<T: Serialize + TableOutput>(&self, value: &T) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(value)?;
                println!("{}", json);
            }
            OutputFormat::Table => {
                value.print_table(self.color);
            }
        }
        Ok(())
    }

    /// Writes a list of values to stdout using the configured output format.
    ///
    /// For JSON format, the entire list is serialized as a JSON array.
    /// For table format, each value is rendered individually.
    ///
    /// # Parameters
    ///
    /// * `values` - A slice of values to write
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails (only applicable for JSON format).
    pub fn write_list<T: Serialize + TableOutput>(&self, values: &[T]) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(values)?;
                println!("{}", json);
            }
            OutputFormat::Table => {
                for value in values {
                    value.print_table(self.color);
                }
            }
        }
        Ok(())
    }

    /// Writes any serializable value as JSON, ignoring the format.
    ///
    /// Used by commands whose table rendering is not per item, such as the
    /// deployment dashboard.
    pub fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        println!("{}", json);
        Ok(())
    }

    /// Writes a warning message to stderr.
    ///
    /// The message is prefixed with "warning:" and styled in yellow when
    /// color output is enabled.
    pub fn write_warning(&self, msg: &str) {
        use console::style;
        if self.color {
            eprintln!("{} {}", style("warning:").yellow().bold(), msg);
        } else {
            eprintln!("warning: {}", msg);
        }
    }

    /// Writes an informational message.
    ///
    /// Goes to stdout for table output and to stderr for JSON output.
    pub fn write_info(&self, msg: &str) {
        match self.format {
            OutputFormat::Table => println!("{}", msg),
            OutputFormat::Json => eprintln!("{}", msg),
        }
    }

    /// Writes a success message.
    ///
    /// The message is prefixed with a green checkmark when color output
    /// is enabled. Like [`write_info`](Self::write_info) it moves to stderr
    /// for JSON output.
    pub fn write_success(&self, msg: &str) {
        use console::style;
        let line = if self.color {
            format!("{} {}", style("✓").green().bold(), msg)
        } else {
            format!("✓ {}", msg)
        };
        match self.format {
            OutputFormat::Table => println!("{}", line),
            OutputFormat::Json => eprintln!("{}", line),
        }
    }
}

/// A trait for types that can be rendered for the terminal.
///
/// Types implementing this trait can be written through an [`OutputWriter`].
/// For JSON output, types must also implement [`Serialize`].
///
/// # Example
///
/// ```rust,ignore
/// use pampu::output::{TableOutput, print_field, print_header};
///
/// impl TableOutput for BuildSummary {
///     fn print_table(&self, color: bool) {
///         print_header(&self.key);
///         print_field("State", &format_status(&self.state, color), color);
///     }
/// }
/// ```
pub trait TableOutput {
    /// Renders the type as a line or section.
    ///
    /// # Parameters
    ///
    /// * `color` - Whether color output is enabled
    fn print_table(&self, color: bool);
}

/// Prints a styled header with an underline.
///
/// # Example
///
/// ```rust,ignore
/// use pampu::output::print_header;
///
/// print_header("API Deploy");
/// // Output:
/// // API Deploy
/// // ----------
/// ```
pub fn print_header(text: &str) {
    use console::style;
    println!("{}", style(text).bold());
    println!("{}", "-".repeat(text.chars().count()));
}

/// Prints a key-value pair with optional styling.
///
/// The key is dimmed when color is enabled to provide visual separation
/// from the value.
pub fn print_field(key: &str, value: &str, color: bool) {
    use console::style;
    if color {
        println!("{}: {}", style(key).dim(), value);
    } else {
        println!("{}: {}", key, value);
    }
}
