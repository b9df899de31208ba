//! Generic table formatting for consistent CLI output
//!
//! Column widths are derived from the widest cell so comparison tables stay
//! aligned regardless of content.

use colored::Colorize;

/// A generic column-aligned table builder
pub struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableBuilder {
    /// Create a new table builder
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Set the table headers
    pub fn headers(mut self, headers: Vec<String>) -> Self {
        self.headers = headers;
        self
    }

    /// Add a row to the table
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.rows.push(row);
        self
    }

    fn column_widths(&self) -> Vec<usize> {
        let columns = self
            .headers
            .len()
            .max(self.rows.iter().map(|row| row.len()).max().unwrap_or(0));

        let mut widths = vec![0usize; columns];
        for (i, header) in self.headers.iter().enumerate() {
            widths[i] = widths[i].max(header.len());
        }
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }
        widths
    }

    fn format_row(cells: &[String], widths: &[usize], bold: bool) -> String {
        let mut line = String::new();
        for (i, &width) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let padded = format!("{:<width$}", cell, width = width);
            let rendered = if bold {
                padded.bold().to_string()
            } else {
                padded
            };
            line.push(' ');
            line.push_str(&rendered);
            line.push(' ');
        }
        line.trim_end().to_string()
    }

    /// Build and format the table
    pub fn build(&self, use_colour: bool) -> String {
        if self.headers.is_empty() && self.rows.is_empty() {
            return String::new();
        }

        let widths = self.column_widths();
        let mut output = String::new();

        if !self.headers.is_empty() {
            output.push_str(&Self::format_row(&self.headers, &widths, use_colour));
            output.push('\n');

            let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            output.push_str(&Self::format_row(&separator, &widths, false));
            output.push('\n');
        }

        for row in &self.rows {
            output.push_str(&Self::format_row(row, &widths, false));
            output.push('\n');
        }

        output
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}
