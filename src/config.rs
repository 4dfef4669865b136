//! Lattice configuration helpers.
//!
//! The config is an optional JSON file; every field has a default so a run
//! without one behaves like a full author + publish analysis.
use crate::runmode::ServiceRole;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Current schema version for the config file.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    CONFIG_SCHEMA_VERSION
}

fn default_roles() -> Vec<ServiceRole> {
    ServiceRole::ALL.to_vec()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LatticeConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Roles to compute aggregates for.
    #[serde(default = "default_roles")]
    pub roles: Vec<ServiceRole>,
    /// Treat remaining warnings as a failing result.
    #[serde(default)]
    pub fail_on_warnings: bool,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        default_config()
    }
}

pub fn default_config() -> LatticeConfig {
    LatticeConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        roles: default_roles(),
        fail_on_warnings: false,
    }
}

/// Render a pretty JSON config stub.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&default_config()).context("serialize config stub")
}

pub fn load_config(path: &Path) -> Result<LatticeConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: LatticeConfig =
        serde_json::from_slice(&bytes).context("parse lattice config JSON")?;
    Ok(config)
}

/// Load `path` when given, otherwise fall back to defaults.
pub fn load_config_or_default(path: Option<&Path>) -> Result<LatticeConfig> {
    match path {
        Some(path) => {
            let config = load_config(path)?;
            validate_config(&config).with_context(|| format!("validate {}", path.display()))?;
            Ok(config)
        }
        None => Ok(default_config()),
    }
}

pub fn validate_config(config: &LatticeConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    if config.roles.is_empty() {
        return Err(anyhow!("roles must list at least one service role"));
    }
    let mut seen = BTreeSet::new();
    for role in &config.roles {
        if !seen.insert(*role) {
            return Err(anyhow!("duplicate role {role} in roles"));
        }
    }
    Ok(())
}

/// Replace configured roles with CLI overrides, when any were given.
pub fn apply_role_overrides(config: &mut LatticeConfig, overrides: &[ServiceRole]) {
    if overrides.is_empty() {
        return;
    }
    let mut roles = overrides.to_vec();
    roles.sort();
    roles.dedup();
    config.roles = roles;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: LatticeConfig = serde_json::from_str("{}").expect("parse empty config");
        assert_eq!(config, default_config());
        validate_config(&config).expect("default config is valid");
    }

    #[test]
    fn stub_round_trips() {
        let stub = config_stub().expect("render stub");
        let config: LatticeConfig = serde_json::from_str(&stub).expect("parse stub");
        assert_eq!(config, default_config());
    }

    #[test]
    fn rejects_wrong_schema_version() {
        let config = LatticeConfig {
            schema_version: 99,
            ..default_config()
        };
        let err = validate_config(&config).expect_err("bad schema version");
        assert!(err.to_string().contains("schema_version 99"), "{err}");
    }

    #[test]
    fn rejects_empty_and_duplicate_roles() {
        let empty = LatticeConfig {
            roles: Vec::new(),
            ..default_config()
        };
        assert!(validate_config(&empty).is_err());

        let duplicate = LatticeConfig {
            roles: vec![ServiceRole::Author, ServiceRole::Author],
            ..default_config()
        };
        let err = validate_config(&duplicate).expect_err("duplicate roles");
        assert!(err.to_string().contains("duplicate role author"), "{err}");
    }

    #[test]
    fn rejects_unknown_fields_and_roles() {
        assert!(serde_json::from_str::<LatticeConfig>(r#"{"rolez": []}"#).is_err());
        assert!(serde_json::from_str::<LatticeConfig>(r#"{"roles": ["preview"]}"#).is_err());
    }

    #[test]
    fn load_config_or_default_reads_and_validates_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("lattice.json");
        fs::write(&path, r#"{"roles": ["publish"], "fail_on_warnings": true}"#)
            .expect("write config");
        let config = load_config_or_default(Some(&path)).expect("load config");
        assert_eq!(config.roles, vec![ServiceRole::Publish]);
        assert!(config.fail_on_warnings);

        fs::write(&path, r#"{"roles": []}"#).expect("write config");
        assert!(load_config_or_default(Some(&path)).is_err());
        assert_eq!(
            load_config_or_default(None).expect("defaults"),
            default_config()
        );
    }

    #[test]
    fn role_overrides_replace_configured_roles() {
        let mut config = default_config();
        apply_role_overrides(&mut config, &[]);
        assert_eq!(config.roles, ServiceRole::ALL.to_vec());
        apply_role_overrides(&mut config, &[ServiceRole::Publish, ServiceRole::Publish]);
        assert_eq!(config.roles, vec![ServiceRole::Publish]);
    }
}
