//! Run-mode mapping file parsing.
//!
//! The mapping is a Properties-style flat file: each line maps a run-mode
//! name to a comma-separated list of item identifiers, e.g.
//! ```text
//! (default)=base.json
//! author=author-config.json,author-content.json
//! author.prod=prod-tuning.json
//! ```
use crate::aggregate::RunModeItems;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

/// Read and parse a mapping file.
pub fn load_mapping(path: &Path) -> Result<RunModeItems> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read mapping {}", path.display()))?;
    parse_mapping(&text).with_context(|| format!("parse mapping {}", path.display()))
}

/// Parse mapping text. Repeated keys merge their items.
pub fn parse_mapping(text: &str) -> Result<RunModeItems> {
    let mut items = RunModeItems::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some(split) = line.find(['=', ':']) else {
            return Err(anyhow!(
                "line {}: expected `run-mode=item[,item...]`",
                index + 1
            ));
        };
        let run_mode = line[..split].trim();
        if run_mode.is_empty() {
            return Err(anyhow!("line {}: run mode must not be empty", index + 1));
        }
        let ids = line[split + 1..]
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        items.entry(run_mode.to_string()).or_default().extend(ids);
    }
    Ok(items)
}
