//! Aggregate resolution over the role × stage lattice.
//!
//! Items tagged with run modes are fanned out into one member set per
//! aggregate key, then keys that add no information are pruned:
//! - a stage key whose members equal its bare-role parent is dropped;
//! - a bare-role key whose every stage key survived is dropped, since each
//!   concrete stage lookup resolves to a more specific tier.
use crate::error::AggregateError;
use crate::runmode::{
    AggregateKey, DeploymentStage, RunModeValidator, ServiceRole, DEFAULT_RUN_MODE,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Raw run-mode name to item identifiers, as supplied by the input provider.
pub type RunModeItems = BTreeMap<String, BTreeSet<String>>;

/// Resolved aggregate key to member identifiers.
pub type AggregateMap = BTreeMap<AggregateKey, BTreeSet<String>>;

/// Why a run-mode entry was left out of aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Valid name that maps to no aggregate in scope (a bare stage, an SDK
    /// token, or a role outside the scope).
    Unused,
    /// Name that is neither known nor correctable.
    Unknown,
}

/// Non-fatal diagnostic about a dropped run-mode entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunModeNotice {
    pub run_mode: String,
    pub kind: NoticeKind,
    pub items: Vec<String>,
}

impl RunModeNotice {
    pub fn message(&self) -> String {
        match self.kind {
            NoticeKind::Unused => format!(
                "run mode {:?} is not used by any aggregate in scope; ignoring {} item(s)",
                self.run_mode,
                self.items.len()
            ),
            NoticeKind::Unknown => format!(
                "unknown run mode {:?}; ignoring {} item(s)",
                self.run_mode,
                self.items.len()
            ),
        }
    }
}

/// Pruned aggregates plus notices for entries that were dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub aggregates: AggregateMap,
    pub notices: Vec<RunModeNotice>,
}

/// Resolver for one role scope. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct Resolver {
    roles: Vec<ServiceRole>,
    stages: Vec<DeploymentStage>,
    validator: RunModeValidator,
}

impl Resolver {
    /// Build a resolver for `roles` over every declared stage.
    pub fn new(roles: &[ServiceRole]) -> Result<Self, AggregateError> {
        let mut roles = roles.to_vec();
        roles.sort();
        roles.dedup();
        if roles.is_empty() {
            return Err(AggregateError::InvalidScope);
        }
        let validator = RunModeValidator::new(&roles);
        Ok(Self {
            roles,
            stages: DeploymentStage::ALL.to_vec(),
            validator,
        })
    }

    /// Set the stages a role must be specialized for before its bare key is
    /// pruned. Keys for every declared stage are still computed, so items
    /// tagged with a stage outside this set are kept.
    pub fn with_stages(mut self, stages: &[DeploymentStage]) -> Self {
        self.stages.clear();
        for stage in stages {
            if !self.stages.contains(stage) {
                self.stages.push(*stage);
            }
        }
        self
    }

    pub fn roles(&self) -> &[ServiceRole] {
        &self.roles
    }

    pub fn stages(&self) -> &[DeploymentStage] {
        &self.stages
    }

    /// Compute the pruned aggregate map for `items`.
    ///
    /// Fails before touching any member set if a misordered run mode is
    /// present, so callers never see a partial result.
    pub fn resolve(&self, items: &RunModeItems) -> Result<Resolution, AggregateError> {
        self.check_ordering(items)?;

        let mut aggregates: AggregateMap =
            AggregateKey::universe(&self.roles, &DeploymentStage::ALL)
                .into_iter()
                .map(|key| (key, BTreeSet::new()))
                .collect();

        if let Some(defaults) = items.get(DEFAULT_RUN_MODE) {
            for members in aggregates.values_mut() {
                members.extend(defaults.iter().cloned());
            }
        }

        let mut notices = Vec::new();
        for (run_mode, ids) in items {
            if run_mode == DEFAULT_RUN_MODE {
                continue;
            }
            let key = AggregateKey::parse(run_mode).filter(|key| aggregates.contains_key(key));
            let Some(key) = key else {
                notices.push(self.notice_for(run_mode, ids));
                continue;
            };
            match key.stage {
                Some(_) => add_members(&mut aggregates, key, ids),
                None => {
                    add_members(&mut aggregates, key, ids);
                    for stage in DeploymentStage::ALL {
                        let staged = AggregateKey::staged(key.role, stage);
                        add_members(&mut aggregates, staged, ids);
                    }
                }
            }
        }

        self.prune(&mut aggregates);
        tracing::debug!(
            aggregates = aggregates.len(),
            notices = notices.len(),
            "resolved run-mode aggregates"
        );
        Ok(Resolution {
            aggregates,
            notices,
        })
    }

    fn check_ordering(&self, items: &RunModeItems) -> Result<(), AggregateError> {
        for run_mode in items.keys() {
            if run_mode == DEFAULT_RUN_MODE || self.validator.is_known(Some(run_mode)) {
                continue;
            }
            if let Some(corrected) = self.validator.corrected_form(run_mode) {
                return Err(AggregateError::MisorderedRunMode {
                    run_mode: run_mode.clone(),
                    corrected: corrected.to_string(),
                });
            }
        }
        Ok(())
    }

    fn notice_for(&self, run_mode: &str, ids: &BTreeSet<String>) -> RunModeNotice {
        // Well-formed names for roles outside the scope are unused, not unknown.
        let well_formed = AggregateKey::parse(run_mode).is_some();
        let kind = if well_formed || self.validator.is_known(Some(run_mode)) {
            NoticeKind::Unused
        } else {
            NoticeKind::Unknown
        };
        RunModeNotice {
            run_mode: run_mode.to_string(),
            kind,
            items: ids.iter().cloned().collect(),
        }
    }

    fn prune(&self, aggregates: &mut AggregateMap) {
        let redundant: Vec<AggregateKey> = aggregates
            .iter()
            .filter_map(|(key, members)| {
                let parent = key.parent()?;
                (aggregates.get(&parent) == Some(members)).then_some(*key)
            })
            .collect();
        for key in redundant {
            tracing::debug!(key = %key, "pruning stage aggregate equal to its role");
            aggregates.remove(&key);
        }

        if self.stages.is_empty() {
            return;
        }
        for role in &self.roles {
            let fully_specialized = self
                .stages
                .iter()
                .all(|stage| aggregates.contains_key(&AggregateKey::staged(*role, *stage)));
            if fully_specialized {
                tracing::debug!(role = %role, "pruning role aggregate shadowed by every stage");
                aggregates.remove(&AggregateKey::role(*role));
            }
        }
    }
}

fn add_members(aggregates: &mut AggregateMap, key: AggregateKey, ids: &BTreeSet<String>) {
    if let Some(members) = aggregates.get_mut(&key) {
        members.extend(ids.iter().cloned());
    }
}

/// Resolve `items` for `roles` over every declared stage.
pub fn resolve(
    items: &RunModeItems,
    roles: &[ServiceRole],
) -> Result<Resolution, AggregateError> {
    Resolver::new(roles)?.resolve(items)
}

#[cfg(test)]
#[path = "aggregate_tests.rs"]
mod tests;
