use crate::credentials::DEFAULT_PASSWORD_LENGTH;
use crate::error::ProvisionError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment keys read into [`Config`].
const ENV_KEYS: &[&str] = &[
    "SECRET_ARN",
    "REGION",
    "PARAMETER_PREFIX",
    "PASSWORD_LENGTH",
    "DEADLINE_SECS",
    "CONNECT_TIMEOUT_SECS",
    "CONNECT_RETRIES",
    "ROLE_CONFLICT",
    "DATABASE_URL",
    "LOGLEVEL",
];

const MIN_PASSWORD_LENGTH: usize = 8;

/// What to do when a principal's role already exists in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleConflictPolicy {
    /// Surface the conflict as a principal-creation failure.
    #[default]
    Fail,
    /// Replace the existing role's password and re-issue its grants.
    Rotate,
}

/// Deployment configuration, passed explicitly into the provisioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub secret_arn: String,
    pub region: Option<String>,
    pub parameter_prefix: String,
    pub password_length: usize,
    pub deadline_secs: u64,
    pub connect_timeout_secs: u64,
    pub connect_retries: usize,
    pub role_conflict: RoleConflictPolicy,
    pub database_url: Option<String>,
    pub loglevel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret_arn: String::new(),
            region: None,
            parameter_prefix: "/db".to_string(),
            password_length: DEFAULT_PASSWORD_LENGTH,
            deadline_secs: 240,
            connect_timeout_secs: 10,
            connect_retries: 3,
            role_conflict: RoleConflictPolicy::Fail,
            database_url: None,
            loglevel: "info".to_string(),
        }
    }
}

impl Config {
    /// Defaults overlaid with the process environment.
    pub fn load() -> Result<Self, ProvisionError> {
        Self::from_figment(Figment::from(Serialized::defaults(Config::default())).merge(
            Env::raw().filter(|key| ENV_KEYS.iter().any(|k| key.as_str().eq_ignore_ascii_case(k))),
        ))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ProvisionError> {
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ProvisionError> {
        if self.secret_arn.trim().is_empty() && self.database_url.is_none() {
            return Err(ProvisionError::Config(
                "SECRET_ARN must be set to the admin credentials secret".to_string(),
            ));
        }
        if !self.parameter_prefix.starts_with('/') {
            return Err(ProvisionError::Config(format!(
                "PARAMETER_PREFIX must start with '/', got {:?}",
                self.parameter_prefix
            )));
        }
        if self.password_length < MIN_PASSWORD_LENGTH {
            return Err(ProvisionError::Config(format!(
                "PASSWORD_LENGTH must be at least {MIN_PASSWORD_LENGTH}, got {}",
                self.password_length
            )));
        }
        Ok(())
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
