// Adapters layer: concrete implementations of the domain ports (process spawning, terminal prompts).

pub mod process;
pub mod prompt;

pub use process::{DryRunRunner, SystemRunner};
pub use prompt::{NonInteractivePrompter, StdinPrompter};
