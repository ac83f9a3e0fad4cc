// Configuration module
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "ams.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub users: Vec<UserEntry>,
    /// Feedback notifications are skipped when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<MailSettings>,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub kind: StoreKind,
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Records and searches applicants
    #[default]
    Clerk,
    /// Reads the feedback left by clerks
    Maintainer,
}

/// One account allowed to log in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    /// Argon2 PHC string, see `ams hash-password`
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
}

/// SMTP relay used to notify the maintainer of new feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSettings {
    pub relay: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_store_path() -> String {
    "database/workbook.bin.gz".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load from a TOML file, apply environment overrides, then validate
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let mut config = Self::from_toml(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - AMS_HOST: Override server.host
    /// - AMS_PORT: Override server.port
    /// - AMS_STORE_PATH: Override store.path
    /// - AMS_LOG_LEVEL: Override logging.level
    /// - AMS_SMTP_PASSWORD: Override mail.password
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("AMS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("AMS_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("AMS_PORT is not a port: {}", port)))?;
        }
        if let Some(path) = lookup("AMS_STORE_PATH") {
            self.store.path = path;
        }
        if let Some(level) = lookup("AMS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(password) = lookup("AMS_SMTP_PASSWORD") {
            if let Some(mail) = self.mail.as_mut() {
                mail.password = password;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.users.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[users]] entry is required".to_string(),
            ));
        }
        for user in &self.users {
            if user.username.trim().is_empty() {
                return Err(ConfigError::Invalid("user with empty username".to_string()));
            }
            if argon2::PasswordHash::new(&user.password_hash).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "password_hash for '{}' is not an argon2 PHC string",
                    user.username
                )));
            }
        }
        if self.store.kind == StoreKind::File && self.store.path.trim().is_empty() {
            return Err(ConfigError::Invalid("store.path is empty".to_string()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
