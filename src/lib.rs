pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{DryRunRunner, NonInteractivePrompter, StdinPrompter, SystemRunner};
pub use config::{EntrypointSettings, OpsConfig};
pub use crate::core::{
    backup::BackupStore,
    deploy::{DeployDriver, DeployOptions},
    entrypoint::Entrypoint,
    readiness::ReadinessGate,
    tasks::{Task, TaskRunner},
};
pub use utils::error::{OpsError, Result};
