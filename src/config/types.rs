//! Configuration types.
//!
//! These types mirror the YAML files of a configuration directory. Every
//! section has defaults so a partial `app.yaml` is valid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calculation::DEFAULT_LEAVE_DIVISOR;
use crate::models::{Employee, LeaveType, RuleSetDraft};

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Local development; error details are returned to clients.
    #[default]
    Development,
    /// Production; error details are withheld.
    Production,
}

impl Environment {
    /// Returns true in production.
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("Invalid environment: {}", other)),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, e.g. `0.0.0.0:8080`.
    pub bind_address: String,
    /// Deployment environment.
    pub environment: Environment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            environment: Environment::Development,
        }
    }
}

/// Token settings shared with the authentication gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret used by the gateway to sign session tokens.
    pub token_secret: String,
}

/// Mail relay settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Relay host.
    pub host: String,
    /// Relay user.
    pub user: String,
    /// Relay password.
    pub password: String,
}

/// Object storage settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Bucket name.
    pub bucket: String,
    /// Endpoint URL.
    pub endpoint: String,
}

/// Document store settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// JSON snapshot file; the store is memory-only when unset.
    pub snapshot_path: Option<String>,
}

/// Payroll settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollConfig {
    /// Divisor applied to basic pay to value one unpaid leave day.
    pub leave_deduction_divisor: u32,
    /// Day of the month the monthly batch runs.
    pub batch_day_of_month: u32,
    /// Seconds between scheduler polls.
    pub scheduler_poll_seconds: u64,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            leave_deduction_divisor: DEFAULT_LEAVE_DIVISOR,
            batch_day_of_month: 5,
            scheduler_poll_seconds: 3600,
        }
    }
}

/// Yearly leave entitlement per leave type, in days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeaveEntitlements(pub BTreeMap<LeaveType, u32>);

impl Default for LeaveEntitlements {
    fn default() -> Self {
        Self(BTreeMap::from([
            (LeaveType::Sick, 15),
            (LeaveType::Annual, 20),
            (LeaveType::Casual, 10),
            (LeaveType::Emergency, 5),
            (LeaveType::Maternity, 180),
            (LeaveType::Paternity, 15),
            (LeaveType::Other, 0),
        ]))
    }
}

impl LeaveEntitlements {
    /// Entitlement for a type; types not listed get zero.
    pub fn days(&self, leave_type: LeaveType) -> u32 {
        self.0.get(&leave_type).copied().unwrap_or(0)
    }
}

/// Leave settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaveConfig {
    /// Yearly entitlements. Listed types override the defaults.
    pub entitlements: BTreeMap<LeaveType, u32>,
}

impl LeaveConfig {
    /// Defaults overlaid with the configured entitlements.
    pub fn effective_entitlements(&self) -> LeaveEntitlements {
        let mut entitlements = LeaveEntitlements::default();
        for (leave_type, days) in &self.entitlements {
            entitlements.0.insert(*leave_type, *days);
        }
        entitlements
    }
}

/// The contents of `app.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// HTTP server.
    pub server: ServerConfig,
    /// Token secret.
    pub auth: AuthConfig,
    /// Mail relay.
    pub mail: MailConfig,
    /// Object storage.
    pub storage: StorageConfig,
    /// Document store.
    pub database: DatabaseConfig,
    /// Payroll.
    pub payroll: PayrollConfig,
    /// Leave.
    pub leave: LeaveConfig,
}

/// The contents of `employees.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct EmployeesFile {
    #[serde(default)]
    pub employees: Vec<Employee>,
}

/// Environment variable overrides, read with the `PAYROLL_` prefix.
///
/// `PAYROLL_BIND_ADDRESS`, `PAYROLL_ENVIRONMENT`, `PAYROLL_TOKEN_SECRET`,
/// `PAYROLL_MAIL_HOST`, `PAYROLL_MAIL_USER`, `PAYROLL_MAIL_PASSWORD`,
/// `PAYROLL_STORAGE_BUCKET`, `PAYROLL_STORAGE_ENDPOINT`,
/// `PAYROLL_SNAPSHOT_PATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvOverrides {
    /// Overrides `server.bind_address`.
    pub bind_address: Option<String>,
    /// Overrides `server.environment`.
    pub environment: Option<String>,
    /// Overrides `auth.token_secret`.
    pub token_secret: Option<String>,
    /// Overrides `mail.host`.
    pub mail_host: Option<String>,
    /// Overrides `mail.user`.
    pub mail_user: Option<String>,
    /// Overrides `mail.password`.
    pub mail_password: Option<String>,
    /// Overrides `storage.bucket`.
    pub storage_bucket: Option<String>,
    /// Overrides `storage.endpoint`.
    pub storage_endpoint: Option<String>,
    /// Overrides `database.snapshot_path`.
    pub snapshot_path: Option<String>,
}

/// The complete application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Settings from `app.yaml` with environment overrides applied.
    pub settings: AppSettings,
    /// Directory seed employees.
    pub employees: Vec<Employee>,
    /// Seed rule sets, ordered by effective date.
    pub rule_sets: Vec<RuleSetDraft>,
}
