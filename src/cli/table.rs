//! Table formatting for record lists
//!
//! Rows are built from any [`Record`] through the catalog's column specs and
//! rendered as aligned TSV, CSV, markdown or bare ids.
//!
//! # Text Wrapping
//!
//! `TableConfig::with_wrap(width)` word-wraps text cells into multi-line
//! rows. CSV and ID output always stay single-line for piping.

use console::style;
use serde_json::Value;
use std::collections::HashMap;

use crate::cli::helpers::{escape_csv, escape_md, format_id, truncate_str};
use crate::cli::OutputFormat;
use crate::core::record::{value_text, Record};
use crate::resources::ColumnSpec;

const DEFAULT_COLUMN_WIDTH: usize = 30;

/// Configuration for table output
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Maximum width for text columns before wrapping (None = truncate instead)
    pub wrap_width: Option<usize>,
    /// Show summary line after the table
    pub show_summary: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            wrap_width: None,
            show_summary: true,
        }
    }
}

impl TableConfig {
    pub fn with_wrap(width: usize) -> Self {
        Self {
            wrap_width: Some(width),
            show_summary: true,
        }
    }

    /// No wrapping, no summary
    pub fn for_pipe() -> Self {
        Self {
            wrap_width: None,
            show_summary: false,
        }
    }
}

/// Word-wrap `text` into lines of at most `max_width` characters
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if text.chars().count() <= max_width || max_width < 5 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        let needed = if current.is_empty() { word.len() } else { current.chars().count() + 1 + word.len() };
        if needed > max_width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        while word.len() > max_width {
            let rest = word.split_off(max_width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// A typed cell value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Record identifier (cyan)
    Id(String),
    Text(String),
    /// Numbers are right-aligned
    Number(String),
    /// Booleans shown as yes/no
    Flag(bool),
    Empty,
}

impl CellValue {
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => CellValue::Empty,
            Some(Value::Bool(b)) => CellValue::Flag(*b),
            Some(Value::Number(n)) => CellValue::Number(n.to_string()),
            Some(other) => value_text(other).map(CellValue::Text).unwrap_or(CellValue::Empty),
        }
    }

    /// Plain text without styling
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) | CellValue::Number(s) => s.clone(),
            CellValue::Flag(b) => if *b { "yes" } else { "no" }.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Id(s) => format_id(s).chars().count(),
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }

    /// Padded (and styled, when on a terminal) cell for aligned output
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => format!("{:<width$}", style(format_id(id)).cyan(), width = width),
            CellValue::Text(s) => {
                format!("{:<width$}", truncate_str(s, width.saturating_sub(2)), width = width)
            }
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            CellValue::Flag(true) => format!("{:<width$}", style("yes").green(), width = width),
            CellValue::Flag(false) => format!("{:<width$}", style("no").dim(), width = width),
            CellValue::Empty => format!("{:<width$}", style("-").dim(), width = width),
        }
    }
}

/// A column to render
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub key: String,
    pub header: String,
    /// Maximum width; narrower content shrinks the column
    pub width: usize,
}

impl From<&ColumnSpec> for ColumnDef {
    fn from(spec: &ColumnSpec) -> Self {
        Self {
            key: spec.key.clone(),
            header: spec.title.to_uppercase(),
            width: spec.width.unwrap_or(DEFAULT_COLUMN_WIDTH),
        }
    }
}

/// One rendered row: the record id plus cells by column key
#[derive(Debug, Clone)]
pub struct TableRow {
    pub id: String,
    cells: HashMap<String, CellValue>,
}

impl TableRow {
    pub fn from_record<R: Record>(record: &R, columns: &[ColumnDef]) -> Self {
        let cells = columns
            .iter()
            .map(|col| (col.key.clone(), CellValue::from_json(record.column(&col.key).as_ref())))
            .collect();
        Self {
            id: record.id().to_string(),
            cells,
        }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.get(key)
    }
}

/// Renders rows of one resource
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'a str,
    config: TableConfig,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'a str) -> Self {
        Self {
            columns,
            entity_name,
            config: TableConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Render to a string in the given format (json/yaml are the caller's job)
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => self.render_md(rows),
            OutputFormat::Id => rows.iter().map(|r| format!("{}\n", r.id)).collect(),
            _ => self.render_tsv(rows),
        }
    }

    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        print!("{}", self.render(rows, format));
    }

    fn widths(&self, rows: &[TableRow]) -> Vec<usize> {
        let id_width = rows
            .iter()
            .map(|r| CellValue::Id(r.id.clone()).display_width())
            .max()
            .unwrap_or(0)
            .max(2);

        std::iter::once(id_width)
            .chain(self.columns.iter().map(|col| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(&col.key))
                    .map(CellValue::display_width)
                    .max()
                    .unwrap_or(0);
                col.header.len().max(content.saturating_add(2)).min(col.width)
            }))
            .collect()
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let widths = self.widths(rows);
        let mut out = String::new();

        let mut header = vec![format!("{:<width$}", style("ID").bold().dim(), width = widths[0])];
        for (col, width) in self.columns.iter().zip(&widths[1..]) {
            header.push(format!("{:<width$}", style(&col.header).bold(), width = *width));
        }
        out.push_str(&header.join(" "));
        out.push('\n');
        let total: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total));
        out.push('\n');

        for row in rows {
            match self.config.wrap_width {
                Some(wrap) => self.push_wrapped_row(&mut out, row, &widths, wrap),
                None => {
                    let mut parts = vec![CellValue::Id(row.id.clone()).format_tsv(widths[0])];
                    for (col, width) in self.columns.iter().zip(&widths[1..]) {
                        let cell = row.get(&col.key).cloned().unwrap_or(CellValue::Empty);
                        parts.push(cell.format_tsv(*width));
                    }
                    out.push_str(parts.join(" ").trim_end());
                    out.push('\n');
                }
            }
        }

        if self.config.show_summary {
            out.push('\n');
            out.push_str(&format!("{} {}(s) shown\n", style(rows.len()).cyan(), self.entity_name));
        }
        out
    }

    fn push_wrapped_row(&self, out: &mut String, row: &TableRow, widths: &[usize], wrap: usize) {
        let mut cells: Vec<Vec<String>> = vec![vec![format_id(&row.id)]];
        for col in self.columns {
            let lines = match row.get(&col.key) {
                Some(CellValue::Text(s)) => wrap_text(s, wrap),
                Some(cell) => vec![cell.raw()],
                None => vec!["-".to_string()],
            };
            cells.push(lines);
        }

        let height = cells.iter().map(Vec::len).max().unwrap_or(1);
        for line in 0..height {
            let parts: Vec<String> = cells
                .iter()
                .zip(widths)
                .map(|(lines, width)| {
                    let text = lines.get(line).map(String::as_str).unwrap_or("");
                    format!("{:<width$}", text, width = *width)
                })
                .collect();
            out.push_str(parts.join(" ").trim_end());
            out.push('\n');
        }
        if height > 1 {
            out.push('\n');
        }
    }

    fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let header: Vec<String> = std::iter::once("id".to_string())
            .chain(self.columns.iter().map(|c| escape_csv(&c.key)))
            .collect();
        out.push_str(&header.join(","));
        out.push('\n');
        for row in rows {
            let values: Vec<String> = std::iter::once(escape_csv(&row.id))
                .chain(
                    self.columns
                        .iter()
                        .map(|c| escape_csv(&row.get(&c.key).map(CellValue::raw).unwrap_or_default())),
                )
                .collect();
            out.push_str(&values.join(","));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let header: Vec<String> = std::iter::once("ID".to_string())
            .chain(self.columns.iter().map(|c| escape_md(&c.header)))
            .collect();
        out.push_str(&format!("| {} |\n", header.join(" | ")));
        out.push_str(&format!("|{}\n", "---|".repeat(header.len())));
        for row in rows {
            let values: Vec<String> = std::iter::once(escape_md(&row.id))
                .chain(
                    self.columns
                        .iter()
                        .map(|c| escape_md(&row.get(&c.key).map(CellValue::raw).unwrap_or_default())),
                )
                .collect();
            out.push_str(&format!("| {} |\n", values.join(" | ")));
        }
        out
    }
}
