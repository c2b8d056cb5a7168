//! # Report Formatter
//!
//! Renders the result set in the format picked on the command line. An
//! empty result set always renders as the empty string.

use comfy_table::{CellAlignment, Table, presets};
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use certinfo_common::certificate::{COLUMNS, ProbeResults};
use certinfo_common::config::OutputFormat;

use crate::error::ReportError;

pub fn format_results(results: &ProbeResults, format: OutputFormat) -> Result<String, ReportError> {
    if results.is_empty() {
        return Ok(String::new());
    }

    match format {
        OutputFormat::Table => Ok(to_table(results)),
        OutputFormat::Json => to_json(results),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(results)?),
        OutputFormat::Csv => to_csv(results),
        OutputFormat::Raw => Ok(to_raw(results)),
    }
}

fn rows(results: &ProbeResults) -> impl Iterator<Item = Vec<String>> + '_ {
    results.iter().map(|(target, info)| {
        let mut row = Vec::with_capacity(COLUMNS.len());
        row.push(target.clone());
        row.extend(info.to_row());
        row
    })
}

fn to_table(results: &ProbeResults) -> String {
    let mut table = Table::new();
    table.load_preset(presets::ASCII_FULL_CONDENSED).set_header(COLUMNS);
    for row in rows(results) {
        table.add_row(row);
    }
    for column in table.column_iter_mut() {
        column.set_cell_alignment(CellAlignment::Center);
    }
    table.to_string()
}

/// JSON object keyed by target, indented by four spaces.
fn to_json(results: &ProbeResults) -> Result<String, ReportError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    results.serialize(&mut serializer)?;
    Ok(String::from_utf8(buf)?)
}

fn to_csv(results: &ProbeResults) -> Result<String, ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(COLUMNS)?;
    for row in rows(results) {
        writer.write_record(&row)?;
    }

    let buf = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(buf)?)
}

/// Plain whitespace aligned columns. The target column is left aligned, the
/// others right aligned.
fn to_raw(results: &ProbeResults) -> String {
    let header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
    let body: Vec<Vec<String>> = rows(results).collect();

    let mut widths: Vec<usize> = header.iter().map(|c| c.width()).collect();
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    std::iter::once(&header)
        .chain(body.iter())
        .map(|row| {
            row.iter()
                .zip(&widths)
                .enumerate()
                .map(|(idx, (cell, &width))| {
                    let pad = " ".repeat(width - cell.width());
                    if idx == 0 { format!("{cell}{pad}") } else { format!("{pad}{cell}") }
                })
                .collect::<Vec<String>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<String>>()
        .join("\n")
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
