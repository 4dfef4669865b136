//! Analysis run: feed each resolved aggregate to an analyser and consolidate
//! the findings per message kind.
use crate::aggregate::{Resolution, RunModeNotice};
use crate::consolidate::{
    render_lines, Consolidator, MessageKind, OutputLine, TierMessages, TierSection,
};
use crate::runmode::AggregateKey;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Messages an analyser reported for one aggregate, in report order.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AnalyserFindings {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Validation engine run against each aggregate's members.
pub trait AggregateAnalyser {
    fn analyse(&self, key: &AggregateKey, members: &BTreeSet<String>)
        -> Result<AnalyserFindings>;
}

/// Analyser that replays findings recorded per aggregate key.
///
/// Keys with no recorded findings analyse clean.
#[derive(Debug, Default, Clone)]
pub struct RecordedAnalyser {
    findings: BTreeMap<AggregateKey, AnalyserFindings>,
}

impl RecordedAnalyser {
    pub fn new(findings: BTreeMap<AggregateKey, AnalyserFindings>) -> Self {
        Self { findings }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read findings {}", path.display()))?;
        let findings: BTreeMap<AggregateKey, AnalyserFindings> = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse findings JSON {}", path.display()))?;
        Ok(Self::new(findings))
    }
}

impl AggregateAnalyser for RecordedAnalyser {
    fn analyse(
        &self,
        key: &AggregateKey,
        _members: &BTreeSet<String>,
    ) -> Result<AnalyserFindings> {
        Ok(self.findings.get(key).cloned().unwrap_or_default())
    }
}

/// Consolidated result of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub errors: Vec<TierSection>,
    pub warnings: Vec<TierSection>,
    pub notices: Vec<RunModeNotice>,
}

impl AnalysisReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn error_lines(&self) -> Vec<OutputLine> {
        render_lines(&self.errors, MessageKind::Error)
    }

    pub fn warning_lines(&self) -> Vec<OutputLine> {
        render_lines(&self.warnings, MessageKind::Warning)
    }
}

/// Analyse every aggregate in `resolution` and consolidate the findings.
///
/// Errors and warnings are bucketed into separate tier maps so neither stream
/// can promote messages from the other. `consolidator` should cover the same
/// roles and stages the resolution was computed for.
pub fn run_analysis(
    resolution: &Resolution,
    analyser: &dyn AggregateAnalyser,
    consolidator: &Consolidator,
) -> Result<AnalysisReport> {
    let mut errors = TierMessages::new();
    let mut warnings = TierMessages::new();
    for (key, members) in &resolution.aggregates {
        let findings = analyser
            .analyse(key, members)
            .with_context(|| format!("analyse aggregate {key}"))?;
        tracing::debug!(
            key = %key,
            members = members.len(),
            errors = findings.errors.len(),
            warnings = findings.warnings.len(),
            "analysed aggregate"
        );
        errors.insert(key.tier_name(), findings.errors);
        warnings.insert(key.tier_name(), findings.warnings);
    }

    Ok(AnalysisReport {
        errors: consolidator.consolidate_sections(errors),
        warnings: consolidator.consolidate_sections(warnings),
        notices: resolution.notices.clone(),
    })
}
