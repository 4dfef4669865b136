//! Tiered consolidation of analyser messages.
//!
//! Each aggregate is analysed on its own, so a problem shared by several
//! aggregates would otherwise be reported once per tier. Consolidation walks
//! the lattice upwards:
//! 1. a missing role bucket is synthesized as the intersection of its stage
//!    buckets;
//! 2. stage buckets drop messages already reported for their role;
//! 3. messages common to every role move into a cross-role bucket.
//!
//! Messages are compared by text. Insertion order inside a bucket is kept.
use crate::aggregate::Resolver;
use crate::runmode::{AggregateKey, DeploymentStage, ServiceRole};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Tier label to ordered message texts, as produced by analysing aggregates.
pub type TierMessages = BTreeMap<String, Vec<String>>;

/// Which message stream a consolidation run covers.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Error,
    Warning,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Error => "error",
            MessageKind::Warning => "warning",
        }
    }

    /// Plural label used in report headers.
    pub fn plural(&self) -> &'static str {
        match self {
            MessageKind::Error => "errors",
            MessageKind::Warning => "warnings",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One non-empty output bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierSection {
    pub tier: String,
    pub messages: Vec<String>,
}

/// One line of consolidated output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "line", rename_all = "snake_case")]
pub enum OutputLine {
    Header { tier: String, kind: MessageKind },
    Message { text: String },
}

impl fmt::Display for OutputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputLine::Header { tier, kind } => write!(
                f,
                "The analyser found the following {} for {tier}:",
                kind.plural()
            ),
            OutputLine::Message { text } => f.write_str(text),
        }
    }
}

/// Flatten sections into header + message lines.
pub fn render_lines(sections: &[TierSection], kind: MessageKind) -> Vec<OutputLine> {
    let mut lines = Vec::new();
    for section in sections {
        lines.push(OutputLine::Header {
            tier: section.tier.clone(),
            kind,
        });
        lines.extend(section.messages.iter().map(|text| OutputLine::Message {
            text: text.clone(),
        }));
    }
    lines
}

/// Consolidator for one role scope. Build a fresh one per analysis run.
#[derive(Debug, Clone)]
pub struct Consolidator {
    roles: Vec<ServiceRole>,
    stages: Vec<DeploymentStage>,
}

impl Consolidator {
    pub fn new(roles: &[ServiceRole]) -> Self {
        let mut roles = roles.to_vec();
        roles.sort();
        roles.dedup();
        Self {
            roles,
            stages: DeploymentStage::ALL.to_vec(),
        }
    }

    /// Set the stage buckets a missing role bucket is synthesized from, in
    /// output order. Buckets for other declared stages are still reduced
    /// against their role and printed after the configured ones.
    pub fn with_stages(mut self, stages: &[DeploymentStage]) -> Self {
        self.stages.clear();
        for stage in stages {
            if !self.stages.contains(stage) {
                self.stages.push(*stage);
            }
        }
        self
    }

    /// Consolidator over the same roles and stage axis as `resolver`.
    pub fn for_resolver(resolver: &Resolver) -> Self {
        Self::new(resolver.roles()).with_stages(resolver.stages())
    }

    /// Label of the bucket shared by every role, e.g. `author and publish`.
    pub fn cross_role_tier(&self) -> Option<String> {
        if self.roles.len() < 2 {
            return None;
        }
        let names: Vec<&str> = self.roles.iter().map(ServiceRole::as_str).collect();
        Some(names.join(" and "))
    }

    /// Consolidate one message stream into rendered output lines.
    pub fn consolidate(&self, messages: TierMessages, kind: MessageKind) -> Vec<OutputLine> {
        render_lines(&self.consolidate_sections(messages), kind)
    }

    /// Consolidate one message stream into ordered, non-empty buckets.
    pub fn consolidate_sections(&self, messages: TierMessages) -> Vec<TierSection> {
        let mut work: TierMessages = messages
            .into_iter()
            .map(|(tier, texts)| (tier, dedupe(texts)))
            .collect();

        for role in &self.roles {
            let role_tier = AggregateKey::role(*role).tier_name();
            if !work.contains_key(&role_tier) {
                let buckets: Vec<&[String]> = self
                    .stage_tiers(*role)
                    .iter()
                    .map(|tier| work.get(tier).map(Vec::as_slice).unwrap_or_default())
                    .collect();
                let shared = intersect(&buckets);
                if !shared.is_empty() {
                    tracing::debug!(
                        tier = %role_tier,
                        count = shared.len(),
                        "synthesized role bucket from stage buckets"
                    );
                }
                work.insert(role_tier.clone(), shared);
            }

            let role_messages: BTreeSet<String> = work
                .get(&role_tier)
                .map(|texts| texts.iter().cloned().collect())
                .unwrap_or_default();
            for tier in self.declared_stage_tiers(*role) {
                if let Some(texts) = work.get_mut(&tier) {
                    texts.retain(|text| !role_messages.contains(text));
                }
            }
        }

        if let Some(cross_tier) = self.cross_role_tier() {
            let role_tiers: Vec<String> = self
                .roles
                .iter()
                .map(|role| AggregateKey::role(*role).tier_name())
                .collect();
            let buckets: Vec<&[String]> = role_tiers
                .iter()
                .map(|tier| work.get(tier).map(Vec::as_slice).unwrap_or_default())
                .collect();
            let shared = intersect(&buckets);
            if !shared.is_empty() {
                tracing::debug!(
                    tier = %cross_tier,
                    count = shared.len(),
                    "promoted messages shared by every role"
                );
                let promoted: BTreeSet<&String> = shared.iter().collect();
                for tier in &role_tiers {
                    if let Some(texts) = work.get_mut(tier) {
                        texts.retain(|text| !promoted.contains(text));
                    }
                }
                let bucket = work.entry(cross_tier).or_default();
                let existing: BTreeSet<String> = bucket.iter().cloned().collect();
                bucket.extend(shared.into_iter().filter(|text| !existing.contains(text)));
            }
        }

        self.ordered_sections(work)
    }

    fn stage_tiers(&self, role: ServiceRole) -> Vec<String> {
        self.stages
            .iter()
            .map(|stage| AggregateKey::staged(role, *stage).tier_name())
            .collect()
    }

    // Configured stages first, then any other declared stage.
    fn declared_stage_tiers(&self, role: ServiceRole) -> Vec<String> {
        let mut tiers = self.stage_tiers(role);
        tiers.extend(
            DeploymentStage::ALL
                .iter()
                .filter(|stage| !self.stages.contains(stage))
                .map(|stage| AggregateKey::staged(role, *stage).tier_name()),
        );
        tiers
    }

    fn tier_order(&self) -> Vec<String> {
        let mut order = Vec::new();
        order.extend(self.cross_role_tier());
        for role in &self.roles {
            order.push(AggregateKey::role(*role).tier_name());
            order.extend(self.declared_stage_tiers(*role));
        }
        order
    }

    fn ordered_sections(&self, mut work: TierMessages) -> Vec<TierSection> {
        let mut sections = Vec::new();
        for tier in self.tier_order() {
            if let Some(messages) = work.remove(&tier) {
                sections.push(TierSection { tier, messages });
            }
        }
        sections.extend(
            work.into_iter()
                .map(|(tier, messages)| TierSection { tier, messages }),
        );
        sections.retain(|section| !section.messages.is_empty());
        sections
    }
}

fn dedupe(texts: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    texts
        .into_iter()
        .filter(|text| seen.insert(text.clone()))
        .collect()
}

// Keeps the order of the first bucket. No buckets means nothing is shared.
fn intersect(buckets: &[&[String]]) -> Vec<String> {
    let Some((first, rest)) = buckets.split_first() else {
        return Vec::new();
    };
    let rest: Vec<BTreeSet<&String>> = rest
        .iter()
        .map(|bucket| bucket.iter().collect())
        .collect();
    first
        .iter()
        .filter(|text| rest.iter().all(|bucket| bucket.contains(text)))
        .cloned()
        .collect()
}

#[cfg(test)]
#[path = "consolidate_tests.rs"]
mod tests;
