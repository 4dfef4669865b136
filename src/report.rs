//! Report rendering for resolver and consolidation output.
//!
//! Text output is meant for build logs; JSON output mirrors the same data for
//! tooling.
use crate::aggregate::Resolution;
use crate::analyse::AnalysisReport;
use crate::consolidate::{
    render_lines, Consolidator, MessageKind, OutputLine, TierMessages, TierSection,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Per-tier messages for both streams, as read by `rml consolidate`.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MessagesFile {
    #[serde(default)]
    pub errors: TierMessages,
    #[serde(default)]
    pub warnings: TierMessages,
}

pub fn load_messages(path: &Path) -> Result<MessagesFile> {
    let bytes = fs::read(path).with_context(|| format!("read messages {}", path.display()))?;
    let messages: MessagesFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse messages JSON {}", path.display()))?;
    Ok(messages)
}

/// Consolidated errors and warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidatedReport {
    pub errors: Vec<TierSection>,
    pub warnings: Vec<TierSection>,
}

impl ConsolidatedReport {
    /// Consolidate both streams independently.
    pub fn build(consolidator: &Consolidator, messages: MessagesFile) -> Self {
        Self {
            errors: consolidator.consolidate_sections(messages.errors),
            warnings: consolidator.consolidate_sections(messages.warnings),
        }
    }
}

impl From<&AnalysisReport> for ConsolidatedReport {
    fn from(report: &AnalysisReport) -> Self {
        Self {
            errors: report.errors.clone(),
            warnings: report.warnings.clone(),
        }
    }
}

/// One `key: member, member` line per aggregate, in key order.
pub fn resolution_lines(resolution: &Resolution) -> Vec<String> {
    resolution
        .aggregates
        .iter()
        .map(|(key, members)| {
            let members: Vec<&str> = members.iter().map(String::as_str).collect();
            format!("{key}: {}", members.join(", "))
        })
        .collect()
}

pub fn write_resolution_text(out: &mut dyn Write, resolution: &Resolution) -> Result<()> {
    for line in resolution_lines(resolution) {
        writeln!(out, "{line}").context("write resolution")?;
    }
    Ok(())
}

pub fn write_consolidated_text(out: &mut dyn Write, report: &ConsolidatedReport) -> Result<()> {
    write_lines(out, &render_lines(&report.errors, MessageKind::Error))?;
    write_lines(out, &render_lines(&report.warnings, MessageKind::Warning))?;
    Ok(())
}

pub fn write_lines(out: &mut dyn Write, lines: &[OutputLine]) -> Result<()> {
    for line in lines {
        writeln!(out, "{line}").context("write report line")?;
    }
    Ok(())
}

pub fn write_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize report JSON")?;
    writeln!(out, "{text}").context("write report JSON")?;
    Ok(())
}
