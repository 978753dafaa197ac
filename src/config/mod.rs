//! Configuration loading and management for the payroll engine.
//!
//! This module loads the application settings, the seed employee directory
//! and the seed rule sets from a directory of YAML files, then applies
//! `PAYROLL_*` environment overrides.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config")?.with_env_overrides()?;
//! println!("Environment: {:?}", config.settings().server.environment);
//! # Ok::<(), payroll_engine::error::EngineError>(())
//! ```

mod loader;
mod types;

pub use loader::{ConfigLoader, ENV_PREFIX};
pub use types::{
    AppConfig, AppSettings, AuthConfig, DatabaseConfig, EnvOverrides, Environment, LeaveConfig,
    LeaveEntitlements, MailConfig, PayrollConfig, ServerConfig, StorageConfig,
};
