//
//  pampu
//  output/table.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Table Output Formatting
//!
//! Utilities for tabular terminal output built on `comfy_table`, plus
//! semantic coloring of Bamboo build and deployment states.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pampu::output::table::TableBuilder;
//!
//! TableBuilder::new()
//!     .headers(["Environment", "Result"])
//!     .row(["DEV", "succeeded"])
//!     .row(["PROD", "refused: production environment"])
//!     .print();
//! ```

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

/// Creates a new styled table with default settings.
///
/// The table is configured with:
/// - UTF-8 full border preset
/// - Dynamic content arrangement to fit terminal width
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// A builder for constructing formatted tables with a fluent API.
///
/// # Notes
///
/// The builder automatically detects terminal color support on creation.
/// Use the [`color`](TableBuilder::color) method to override this detection.
pub struct TableBuilder {
    table: Table,
    headers: Vec<String>,
    color: bool,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self {
            table: create_table(),
            headers: Vec::new(),
            color: console::colors_enabled(),
        }
    }

    /// Sets whether color output is enabled.
    pub fn color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    /// Sets the table headers.
    ///
    /// Headers are displayed in cyan when color is enabled.
    pub fn headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = headers.into_iter().map(|s| s.into()).collect();
        if self.color {
            let header_cells: Vec<Cell> = self
                .headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect();
            self.table.set_header(header_cells);
        } else {
            self.table.set_header(&self.headers);
        }
        self
    }

    /// Adds a single row to the table.
    ///
    /// # Notes
    ///
    /// The number of cells should match the number of headers for
    /// proper table alignment.
    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = cells.into_iter().map(|s| s.into()).collect();
        self.table.add_row(row);
        self
    }

    /// Builds and prints the table to stdout.
    pub fn print(self) {
        println!("{}", self.table);
    }

    /// Builds and returns the underlying table.
    pub fn build(self) -> Table {
        self.table
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats a Bamboo state with semantic colors.
///
/// - **Green**: Successful, SUCCESS, succeeded
/// - **Red**: Failed, FAILED, refused
/// - **Yellow**: InProgress, IN_PROGRESS, Queued, QUEUED, PENDING
///
/// Matching ignores case and underscores. Unknown states are returned
/// without color.
pub fn format_status(status: &str, color: bool) -> String {
    if !color {
        return status.to_string();
    }

    use console::style;
    match status.to_lowercase().replace('_', "").as_str() {
        "successful" | "success" | "succeeded" => style(status).green().to_string(),
        "failed" | "error" | "refused" => style(status).red().to_string(),
        "inprogress" | "queued" | "pending" | "running" => style(status).yellow().to_string(),
        _ => status.to_string(),
    }
}

/// Truncates a string to a maximum number of characters with ellipsis.
///
/// # Example
///
/// ```rust
/// use pampu::output::truncate;
///
/// assert_eq!(truncate("hello", 10), "hello");
/// assert_eq!(truncate("hello world", 8), "hello...");
/// assert_eq!(truncate("hello", 3), "hel");
/// ```
///
/// # Notes
///
/// If `max_len <= 3`, no ellipsis is added.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    } else {
        s.chars().take(max_len).collect()
    }
}
