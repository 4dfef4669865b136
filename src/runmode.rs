//! Run-mode vocabulary: service roles, deployment stages, and aggregate keys.
//!
//! A run mode names a combination of the two orthogonal axes. The canonical
//! grammar is `role`, `stage`, or `role.stage` (role first), plus the reserved
//! `(default)` token for items that apply everywhere.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod validator;

pub use validator::{RunModeCheck, RunModeValidator};

/// Reserved run-mode token for items that apply to every aggregate.
pub const DEFAULT_RUN_MODE: &str = "(default)";

/// Separator between the role and stage parts of a qualified run mode.
pub const RUN_MODE_SEPARATOR: char = '.';

/// Runtime role an item applies to.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ServiceRole {
    Author,
    Publish,
}

impl ServiceRole {
    /// All roles in declaration order.
    pub const ALL: [ServiceRole; 2] = [ServiceRole::Author, ServiceRole::Publish];

    /// Return the stable run-mode token for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceRole::Author => "author",
            ServiceRole::Publish => "publish",
        }
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ServiceRole::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| format!("unknown service role {value:?}"))
    }
}

/// Environment tier an item applies to.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStage {
    Dev,
    Stage,
    Prod,
}

impl DeploymentStage {
    /// All stages in declaration order.
    pub const ALL: [DeploymentStage; 3] = [
        DeploymentStage::Dev,
        DeploymentStage::Stage,
        DeploymentStage::Prod,
    ];

    /// Return the stable run-mode token for this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStage::Dev => "dev",
            DeploymentStage::Stage => "stage",
            DeploymentStage::Prod => "prod",
        }
    }
}

impl fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentStage {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        DeploymentStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == value)
            .ok_or_else(|| format!("unknown deployment stage {value:?}"))
    }
}

/// Local-development stages that are valid run modes but never aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PseudoStage {
    Sdk,
    Rde,
}

impl PseudoStage {
    pub const ALL: [PseudoStage; 2] = [PseudoStage::Sdk, PseudoStage::Rde];

    pub fn as_str(&self) -> &'static str {
        match self {
            PseudoStage::Sdk => "sdk",
            PseudoStage::Rde => "rde",
        }
    }
}

impl fmt::Display for PseudoStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join a role and a stage-like token into a canonical `role.stage` name.
pub fn qualified_name(role: ServiceRole, stage: &str) -> String {
    format!("{}{RUN_MODE_SEPARATOR}{stage}", role.as_str())
}

/// Identifies one aggregate: a bare role or a role specialized to one stage.
///
/// Ordering puts the bare role before its stage specializations, which keeps
/// resolver output and tier iteration deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregateKey {
    pub role: ServiceRole,
    pub stage: Option<DeploymentStage>,
}

impl AggregateKey {
    pub fn role(role: ServiceRole) -> Self {
        Self { role, stage: None }
    }

    pub fn staged(role: ServiceRole, stage: DeploymentStage) -> Self {
        Self {
            role,
            stage: Some(stage),
        }
    }

    /// The more general key this one inherits from, if any.
    pub fn parent(&self) -> Option<AggregateKey> {
        self.stage.map(|_| AggregateKey::role(self.role))
    }

    /// Run-mode name matching this key exactly (`author`, `author.dev`).
    pub fn run_mode(&self) -> String {
        match self.stage {
            Some(stage) => qualified_name(self.role, stage.as_str()),
            None => self.role.as_str().to_string(),
        }
    }

    /// Tier label under which analyser messages for this key are bucketed.
    pub fn tier_name(&self) -> String {
        format!("aggregated-{}", self.run_mode())
    }

    /// Parse a canonical run-mode name back into a key.
    pub fn parse(name: &str) -> Option<AggregateKey> {
        match name.split_once(RUN_MODE_SEPARATOR) {
            Some((role, stage)) => Some(AggregateKey::staged(
                role.parse().ok()?,
                stage.parse().ok()?,
            )),
            None => Some(AggregateKey::role(name.parse().ok()?)),
        }
    }

    /// Every key for `roles` × ({none} ∪ `stages`), in key order.
    pub fn universe(roles: &[ServiceRole], stages: &[DeploymentStage]) -> Vec<AggregateKey> {
        let mut keys = Vec::with_capacity(roles.len() * (stages.len() + 1));
        for role in roles {
            keys.push(AggregateKey::role(*role));
            for stage in stages {
                keys.push(AggregateKey::staged(*role, *stage));
            }
        }
        keys.sort();
        keys.dedup();
        keys
    }
}

impl fmt::Display for AggregateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.run_mode())
    }
}

impl Serialize for AggregateKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.run_mode())
    }
}

impl<'de> Deserialize<'de> for AggregateKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        AggregateKey::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid aggregate key {raw:?}")))
    }
}
