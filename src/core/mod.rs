pub mod backup;
pub mod compose;
pub mod deploy;
pub mod entrypoint;
pub mod health;
pub mod readiness;
pub mod tasks;

pub use crate::domain::model::{CommandSpec, DeployReport, Endpoint, Environment};
pub use crate::domain::ports::{CommandRunner, Prompter};
pub use crate::utils::error::Result;
