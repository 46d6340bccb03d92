use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::types::Role;

pub const DEFAULT_PORT: u16 = 8470;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_AGE_BUCKET_WIDTH: u32 = 10;
pub const DEFAULT_VISIT_BUCKET_HOURS: u32 = 1;
pub const DEFAULT_SESSION_TTL_MINS: i64 = 12 * 60;
/// One year.
pub const MAX_SESSION_TTL_MINS: i64 = 365 * 24 * 60;
pub const DEFAULT_REPORT_TITLE: &str = "Smart Homecare Scheduler";
/// Password given to seeded accounts when the config names none.
pub const DEFAULT_SEED_PASSWORD: &str = "change-me";

/// Top-level config (homecare.toml + HOMECARE_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HomecareConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Where on-demand copies of the store file are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_backup_dir")]
    pub dir: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: default_backup_dir(),
        }
    }
}

/// Bucket widths for the distribution charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Width of an age bucket in years.
    #[serde(default = "default_age_bucket_width")]
    pub age_bucket_width: u32,
    /// Width of a visit-start bucket in hours of the day.
    #[serde(default = "default_visit_bucket_hours")]
    pub visit_bucket_hours: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            age_bucket_width: DEFAULT_AGE_BUCKET_WIDTH,
            visit_bucket_hours: DEFAULT_VISIT_BUCKET_HOURS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer tokens expire this many minutes after login.
    #[serde(default = "default_session_ttl_mins")]
    pub session_ttl_mins: i64,
    /// Accounts created when the users table is empty.
    #[serde(default = "default_seed_users")]
    pub seed_users: Vec<SeedUser>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_mins: DEFAULT_SESSION_TTL_MINS,
            seed_users: default_seed_users(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedUser {
    pub username: String,
    #[serde(default = "default_seed_password")]
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_title")]
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_report_title(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_age_bucket_width() -> u32 {
    DEFAULT_AGE_BUCKET_WIDTH
}
fn default_visit_bucket_hours() -> u32 {
    DEFAULT_VISIT_BUCKET_HOURS
}
fn default_session_ttl_mins() -> i64 {
    DEFAULT_SESSION_TTL_MINS
}
fn default_seed_password() -> String {
    DEFAULT_SEED_PASSWORD.to_string()
}
fn default_report_title() -> String {
    DEFAULT_REPORT_TITLE.to_string()
}
fn default_seed_users() -> Vec<SeedUser> {
    vec![
        SeedUser {
            username: "admin".to_string(),
            password: default_seed_password(),
            role: Role::Admin,
        },
        SeedUser {
            username: "doctor".to_string(),
            password: default_seed_password(),
            role: Role::Doctor,
        },
    ]
}
fn home_dir() -> String {
    std::env::var("HOME").unwrap_or_else(|_| ".".to_string())
}
fn default_db_path() -> String {
    format!("{}/.homecare/homecare.db", home_dir())
}
fn default_backup_dir() -> String {
    format!("{}/.homecare/backups", home_dir())
}

impl HomecareConfig {
    /// Load config from a TOML file with HOMECARE_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `HOMECARE_ANALYTICS__AGE_BUCKET_WIDTH=5`. A missing file is not an
    /// error; every section has defaults.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: HomecareConfig = Figment::from(Serialized::defaults(HomecareConfig::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed("HOMECARE_").split("__"))
            .extract()
            .map_err(|e| crate::error::HomecareError::Config(e.to_string()))?;

        config.validate()?;
        tracing::debug!(path = %path, "configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.analytics.age_bucket_width == 0 || self.analytics.visit_bucket_hours == 0 {
            return Err(crate::error::HomecareError::Config(
                "analytics bucket widths must be at least 1".to_string(),
            ));
        }
        if self.analytics.visit_bucket_hours > 24 {
            return Err(crate::error::HomecareError::Config(
                "analytics.visit_bucket_hours cannot exceed 24".to_string(),
            ));
        }
        if !(1..=MAX_SESSION_TTL_MINS).contains(&self.auth.session_ttl_mins) {
            return Err(crate::error::HomecareError::Config(format!(
                "auth.session_ttl_mins must be between 1 and {MAX_SESSION_TTL_MINS}"
            )));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    format!("{}/.homecare/homecare.toml", home_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = HomecareConfig::load(Some("does-not-exist.toml"))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.gateway.port, DEFAULT_PORT);
            assert_eq!(config.analytics.age_bucket_width, 10);
            assert_eq!(config.auth.seed_users.len(), 2);
            Ok(())
        });
    }

    #[test]
    fn toml_and_env_are_merged() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "homecare.toml",
                r#"
                [gateway]
                port = 9000

                [database]
                path = "/tmp/care.db"

                [[auth.seed_users]]
                username = "root"
                role = "admin"
                "#,
            )?;
            jail.set_env("HOMECARE_ANALYTICS__AGE_BUCKET_WIDTH", "5");

            let config = HomecareConfig::load(Some("homecare.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.gateway.port, 9000);
            assert_eq!(config.gateway.bind, DEFAULT_BIND);
            assert_eq!(config.database.path, "/tmp/care.db");
            assert_eq!(config.analytics.age_bucket_width, 5);
            assert_eq!(
                config.auth.seed_users,
                vec![SeedUser {
                    username: "root".to_string(),
                    password: DEFAULT_SEED_PASSWORD.to_string(),
                    role: Role::Admin,
                }]
            );
            Ok(())
        });
    }

    #[test]
    fn zero_bucket_width_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("HOMECARE_ANALYTICS__VISIT_BUCKET_HOURS", "0");
            let err = HomecareConfig::load(Some("none.toml")).unwrap_err();
            assert_eq!(err.code(), "CONFIG_ERROR");
            Ok(())
        });
    }

    #[test]
    fn session_ttl_is_bounded() {
        Jail::expect_with(|jail| {
            jail.set_env("HOMECARE_AUTH__SESSION_TTL_MINS", (i64::MAX / 2).to_string());
            assert!(HomecareConfig::load(Some("none.toml")).is_err());

            jail.set_env("HOMECARE_AUTH__SESSION_TTL_MINS", MAX_SESSION_TTL_MINS.to_string());
            let config = HomecareConfig::load(Some("none.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.auth.session_ttl_mins, MAX_SESSION_TTL_MINS);
            Ok(())
        });
    }
}
