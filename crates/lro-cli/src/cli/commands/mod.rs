//! CLI command handlers.

mod config;
mod drive;
mod execute;
mod preset;

pub use config::run_config;
pub use execute::run_execute;
pub use preset::run_preset;

#[cfg(test)]
pub(crate) use execute::build_request;
#[cfg(test)]
pub(crate) use preset::build_preset;
