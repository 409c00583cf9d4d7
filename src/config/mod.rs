#[cfg(feature = "cli")]
pub mod cli;
pub mod env;
pub mod env_file;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{DeployArgs, EntrypointArgs, OpsCli, OpsCommand};
pub use env::EntrypointSettings;
pub use toml_config::OpsConfig;
