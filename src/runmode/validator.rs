//! Run-mode name validation and axis-order correction.
//!
//! Known names come from the role scope plus every declared stage; the
//! correction table is the full stage × role cross product so new roles or
//! stages extend it without hand-maintained entries.
use super::{qualified_name, DeploymentStage, PseudoStage, ServiceRole, DEFAULT_RUN_MODE};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of checking a single run-mode name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunModeCheck {
    Known,
    /// Recognized token written stage-first; `corrected` is the canonical name.
    Misordered { corrected: String },
    Unknown,
}

/// Lookup tables for run-mode names, built for one role scope.
#[derive(Debug, Clone)]
pub struct RunModeValidator {
    known: BTreeSet<String>,
    local_only: BTreeSet<String>,
    reversed: BTreeMap<String, String>,
}

impl RunModeValidator {
    /// Build the tables for `roles`; stages are never scoped.
    pub fn new(roles: &[ServiceRole]) -> Self {
        let mut known = BTreeSet::new();
        for role in roles {
            known.insert(role.as_str().to_string());
            for stage in DeploymentStage::ALL {
                known.insert(qualified_name(*role, stage.as_str()));
            }
        }
        for stage in DeploymentStage::ALL {
            known.insert(stage.as_str().to_string());
        }

        Self {
            known,
            local_only: local_only_tokens(),
            reversed: reversed_tokens(),
        }
    }

    /// Whether `name` is a valid run mode. Absence means "applies everywhere".
    pub fn is_known(&self, name: Option<&str>) -> bool {
        let Some(name) = name else {
            return true;
        };
        name == DEFAULT_RUN_MODE || self.known.contains(name) || self.local_only.contains(name)
    }

    /// Canonical name for a recognized stage-first token.
    pub fn corrected_form(&self, name: &str) -> Option<&str> {
        self.reversed.get(name).map(String::as_str)
    }

    pub fn classify(&self, name: &str) -> RunModeCheck {
        if self.is_known(Some(name)) {
            return RunModeCheck::Known;
        }
        match self.corrected_form(name) {
            Some(corrected) => RunModeCheck::Misordered {
                corrected: corrected.to_string(),
            },
            None => RunModeCheck::Unknown,
        }
    }
}

// SDK/RDE tokens validate regardless of the role scope.
fn local_only_tokens() -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    for stage in PseudoStage::ALL {
        tokens.insert(stage.as_str().to_string());
        for role in ServiceRole::ALL {
            tokens.insert(qualified_name(role, stage.as_str()));
        }
    }
    tokens
}

fn reversed_tokens() -> BTreeMap<String, String> {
    let stages = DeploymentStage::ALL
        .iter()
        .map(DeploymentStage::as_str)
        .chain(PseudoStage::ALL.iter().map(PseudoStage::as_str));
    let mut table = BTreeMap::new();
    for stage in stages {
        for role in ServiceRole::ALL {
            table.insert(
                format!("{stage}.{}", role.as_str()),
                qualified_name(role, stage),
            );
        }
    }
    table
}
