//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the application
//! configuration from a directory of YAML files.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::models::RuleSetDraft;

use super::types::{AppConfig, AppSettings, EmployeesFile, EnvOverrides};

/// Prefix of the environment variables that override `app.yaml`.
pub const ENV_PREFIX: &str = "PAYROLL_";

/// Loads and provides access to the application configuration.
///
/// # Directory Structure
///
/// ```text
/// config/
/// ├── app.yaml            # Server, auth, mail, storage, payroll and leave settings
/// ├── employees.yaml      # Optional directory seed
/// └── rule_sets/
///     └── 2026-01-01.yaml # Optional seed rule sets, one per file
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config")?;
/// println!("Binding to {}", loader.settings().server.bind_address);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: AppConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// `app.yaml` is required. `employees.yaml` and `rule_sets/` are optional.
    ///
    /// # Errors
    ///
    /// - `ConfigNotFound` if `app.yaml` is missing
    /// - `ConfigParseError` if any present file contains invalid YAML
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<AppSettings>(&path.join("app.yaml"))?;

        let employees_path = path.join("employees.yaml");
        let employees = if employees_path.exists() {
            Self::load_yaml::<EmployeesFile>(&employees_path)?.employees
        } else {
            Vec::new()
        };

        let rule_sets = Self::load_rule_sets(&path.join("rule_sets"))?;

        info!(
            path = %path.display(),
            employees = employees.len(),
            rule_sets = rule_sets.len(),
            "Configuration loaded"
        );

        Ok(Self {
            config: AppConfig {
                settings,
                employees,
                rule_sets,
            },
        })
    }

    /// Builds a loader from an already assembled configuration.
    pub fn from_config(config: AppConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads every rule set file, ordered by effective date.
    fn load_rule_sets(dir: &Path) -> EngineResult<Vec<RuleSetDraft>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let dir_str = dir.display().to_string();

        let entries = fs::read_dir(dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut rule_sets = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                debug!(path = %path.display(), "Loading rule set");
                rule_sets.push(Self::load_yaml::<RuleSetDraft>(&path)?);
            }
        }

        rule_sets.sort_by_key(|set| set.effective_from);
        Ok(rule_sets)
    }

    /// Applies `PAYROLL_*` environment variables on top of the file settings.
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParseError` if a variable cannot be parsed.
    pub fn with_env_overrides(mut self) -> EngineResult<Self> {
        dotenv::dotenv().ok();
        let overrides = envy::prefixed(ENV_PREFIX)
            .from_env::<EnvOverrides>()
            .map_err(|e| EngineError::ConfigParseError {
                path: "environment".to_string(),
                message: e.to_string(),
            })?;
        self.apply_overrides(overrides)?;
        Ok(self)
    }

    /// Applies a set of overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParseError` for an unknown environment name.
    pub fn apply_overrides(&mut self, overrides: EnvOverrides) -> EngineResult<()> {
        let settings = &mut self.config.settings;
        if let Some(bind_address) = overrides.bind_address {
            settings.server.bind_address = bind_address;
        }
        if let Some(environment) = overrides.environment {
            settings.server.environment =
                environment
                    .parse()
                    .map_err(|message| EngineError::ConfigParseError {
                        path: format!("{}ENVIRONMENT", ENV_PREFIX),
                        message,
                    })?;
        }
        if let Some(secret) = overrides.token_secret {
            settings.auth.token_secret = secret;
        }
        if let Some(host) = overrides.mail_host {
            settings.mail.host = host;
        }
        if let Some(user) = overrides.mail_user {
            settings.mail.user = user;
        }
        if let Some(password) = overrides.mail_password {
            settings.mail.password = password;
        }
        if let Some(bucket) = overrides.storage_bucket {
            settings.storage.bucket = bucket;
        }
        if let Some(endpoint) = overrides.storage_endpoint {
            settings.storage.endpoint = endpoint;
        }
        if let Some(path) = overrides.snapshot_path {
            settings.database.snapshot_path = Some(path);
        }
        Ok(())
    }

    /// Returns the whole configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the `app.yaml` settings.
    pub fn settings(&self) -> &AppSettings {
        &self.config.settings
    }
}
