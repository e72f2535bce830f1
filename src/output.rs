use crate::error::{CustomError, Result};
use crate::metrics::{SectionReport, ranking_command};
use crate::model::{Columns, Layout};
use itertools::Itertools;
use serde_json::json;
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::Builder;

pub struct Report<'a> {
    pub input: &'a str,
    pub layout: Layout,
    pub columns: Columns,
    pub top: usize,
    pub sections: Vec<SectionReport>,
}

// Pipes inside a table cell would split it, even within a code span.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Backtick fence one longer than the longest backtick run in `text`, at least `min` long.
fn fence(text: &str, min: usize) -> String {
    let longest = text
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(min.max(longest + 1))
}

fn code_span(text: &str) -> String {
    let ticks = fence(text, 1);
    if text.starts_with('`') || text.ends_with('`') {
        format!("{ticks} {text} {ticks}")
    } else {
        format!("{ticks}{text}{ticks}")
    }
}

pub fn render_markdown(report: &Report) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "# VDJdb summary statistics")?;
    writeln!(out)?;
    writeln!(out, "Input: {}", code_span(report.input))?;

    for section in &report.sections {
        writeln!(out)?;
        writeln!(out, "## {}", section.scope.title())?;
        writeln!(out)?;
        writeln!(out, "| Metric | Count | Command |")?;
        writeln!(out, "| --- | ---: | --- |")?;
        for value in &section.values {
            let command = value
                .metric
                .command(&report.columns, section.scope, report.input);
            writeln!(
                out,
                "| {} | {} | {} |",
                value.metric.label(),
                value.value,
                escape_cell(&code_span(&command))
            )?;
        }

        if let Some(ranking) = &section.ranking {
            let command =
                ranking_command(&report.columns, section.scope, report.input, report.top);
            let ticks = fence(&command, 3);
            writeln!(out)?;
            writeln!(
                out,
                "Top {} epitopes by number of unique CDR3-epitope pairs:",
                report.top
            )?;
            writeln!(out)?;
            writeln!(out, "{ticks}sh")?;
            writeln!(out, "{command}")?;
            writeln!(out, "{ticks}")?;
            writeln!(out)?;
            writeln!(out, "```text")?;
            for entry in ranking {
                writeln!(out, "{} {}", entry.count, entry.epitope_lossy())?;
            }
            writeln!(out, "```")?;
        }
    }
    Ok(out)
}

pub fn render_json(report: &Report) -> Result<String> {
    let sections = report
        .sections
        .iter()
        .map(|section| {
            let metrics = section
                .values
                .iter()
                .map(|value| {
                    json!({
                        "metric": value.metric.label(),
                        "count": value.value,
                        "command": value.metric.command(&report.columns, section.scope, report.input),
                    })
                })
                .collect_vec();
            let top_epitopes = section.ranking.as_ref().map(|ranking| {
                ranking
                    .iter()
                    .map(|entry| json!({ "epitope": entry.epitope_lossy(), "count": entry.count }))
                    .collect_vec()
            });
            json!({
                "title": section.scope.title(),
                "metrics": metrics,
                "top_epitopes": top_epitopes,
            })
        })
        .collect_vec();

    let document = json!({
        "input": report.input,
        "layout": report.layout.name(),
        "columns": {
            "chain": report.columns.chain,
            "cdr3": report.columns.cdr3,
            "species": report.columns.species,
            "epitope": report.columns.epitope,
        },
        "sections": sections,
    });
    let mut text = serde_json::to_string_pretty(&document)?;
    text.push('\n');
    Ok(text)
}

/// Replaces `path` with `contents` through a temporary file in the same directory.
///
/// The replacement keeps the permissions of an existing `path`; a new file gets
/// the same mode a plain `File::create` would give it.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let write_err = |e: std::io::Error| CustomError::Write {
        source: e,
        path: path.to_path_buf(),
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let existing = fs::metadata(path).ok().map(|m| m.permissions());

    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Masked by the umask at creation, like `File::create`.
        builder.permissions(
            existing
                .clone()
                .unwrap_or_else(|| fs::Permissions::from_mode(0o666)),
        );
    }
    let mut tmp = builder.tempfile_in(parent).map_err(write_err)?;
    if let Some(permissions) = existing {
        tmp.as_file().set_permissions(permissions).map_err(write_err)?;
    }
    tmp.write_all(contents).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
