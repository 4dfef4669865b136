//! Run-mode aggregate resolution and tiered message consolidation.
//!
//! Items deployed to several environments are tagged with run modes
//! (`author`, `publish.prod`, `(default)`, ...). [`aggregate`] computes the
//! minimal set of aggregates that must be built and validated, and
//! [`consolidate`] folds the per-aggregate analyser messages back together so
//! a problem shared by several tiers is reported once.
pub mod aggregate;
pub mod analyse;
pub mod cli;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod mapping;
pub mod report;
pub mod runmode;

pub use aggregate::{resolve, Resolution, Resolver, RunModeItems};
pub use consolidate::{Consolidator, MessageKind, OutputLine, TierMessages};
pub use error::AggregateError;
pub use runmode::{AggregateKey, DeploymentStage, RunModeValidator, ServiceRole};
