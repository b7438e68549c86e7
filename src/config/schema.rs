//! Configuration schema
//!
//! Maps the `furips.toml` file. Two Firebird instances may be configured: the
//! live primary store and the frozen previous snapshot used as a clinical
//! fallback. The MySQL section points at the replicated documental database.

use crate::config::secret::{secret_from, SecretString};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuripsConfig {
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Primary (live) legacy store
    pub firebird: FirebirdConfig,

    /// Frozen previous instance of the legacy schema. Optional; when absent
    /// the clinical fallback chain has a single source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firebird_previous: Option<FirebirdConfig>,

    /// Analytical (replicated) store
    pub mysql: MySqlConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl FuripsConfig {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.firebird.validate("firebird")?;
        if let Some(previous) = &self.firebird_previous {
            previous.validate("firebird_previous")?;
        }
        self.mysql.validate()?;
        self.storage.validate()?;
        Ok(())
    }
}

/// Application-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        ApplicationConfig {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid.join(", ")
            ));
        }
        Ok(())
    }
}

/// One Firebird instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebirdConfig {
    #[serde(default = "default_fb_host")]
    pub host: String,

    #[serde(default = "default_fb_port")]
    pub port: u16,

    /// Absolute path of the database file on the server (the `.GDB`)
    pub path: String,

    #[serde(default = "default_fb_user")]
    pub user: String,

    #[serde(default = "default_fb_password")]
    pub password: SecretString,
}

impl FirebirdConfig {
    fn validate(&self, section: &str) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err(format!("{section}.path must point at the database file"));
        }
        if self.host.trim().is_empty() {
            return Err(format!("{section}.host must not be empty"));
        }
        Ok(())
    }
}

/// The analytical MySQL replica
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MySqlConfig {
    pub host: String,

    #[serde(default = "default_mysql_port")]
    pub port: u16,

    pub database: String,

    pub user: String,

    pub password: SecretString,
}

impl MySqlConfig {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("mysql.host", &self.host),
            ("mysql.database", &self.database),
            ("mysql.user", &self.user),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{name} must not be empty"));
            }
        }
        Ok(())
    }
}

/// Filesystem layout for job artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Shared working directory where output files are generated
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Plan file consumed by the downstream process; defaults to
    /// `<work_dir>/globalsafe.txt`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_file: Option<PathBuf>,

    /// Durable job-state records
    #[serde(default = "default_jobs_dir")]
    pub jobs_dir: PathBuf,

    /// Per-job process logs
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    /// Per-job SQL audit transcripts
    #[serde(default = "default_sql_dir")]
    pub sql_dir: PathBuf,

    /// Job-scoped export copies of the generated files
    #[serde(default = "default_exports_dir")]
    pub exports_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            work_dir: default_work_dir(),
            plan_file: None,
            jobs_dir: default_jobs_dir(),
            logs_dir: default_logs_dir(),
            sql_dir: default_sql_dir(),
            exports_dir: default_exports_dir(),
        }
    }
}

impl StorageConfig {
    /// Effective plan file path
    pub fn plan_file(&self) -> PathBuf {
        self.plan_file
            .clone()
            .unwrap_or_else(|| self.work_dir.join("globalsafe.txt"))
    }

    fn validate(&self) -> Result<(), String> {
        if self.work_dir.as_os_str().is_empty() {
            return Err("storage.work_dir must not be empty".to_string());
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fb_host() -> String {
    "127.0.0.1".to_string()
}

fn default_fb_port() -> u16 {
    3050
}

fn default_fb_user() -> String {
    "SYSDBA".to_string()
}

fn default_fb_password() -> SecretString {
    secret_from("masterkey")
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("storage/furips")
}

fn default_jobs_dir() -> PathBuf {
    PathBuf::from("storage/jobs")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("storage/logs")
}

fn default_sql_dir() -> PathBuf {
    PathBuf::from("storage/sql")
}

fn default_exports_dir() -> PathBuf {
    PathBuf::from("storage/exports")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_toml() -> &'static str {
        r#"
            [firebird]
            path = "/data/gestion.gdb"

            [mysql]
            host = "127.0.0.1"
            database = "gestion_documental"
            user = "reporter"
            password = "pw"
        "#
    }

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let config: FuripsConfig = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(config.firebird.host, "127.0.0.1");
        assert_eq!(config.firebird.port, 3050);
        assert_eq!(config.firebird.user, "SYSDBA");
        assert_eq!(config.mysql.port, 3306);
        assert_eq!(config.application.log_level, "info");
        assert!(config.firebird_previous.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_plan_file_defaults_under_work_dir() {
        let config: FuripsConfig = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(
            config.storage.plan_file(),
            PathBuf::from("storage/furips/globalsafe.txt")
        );
    }

    #[test]
    fn test_previous_instance_is_parsed() {
        let toml = format!(
            "{}\n[firebird_previous]\npath = \"/data/old.gdb\"\n",
            minimal_toml()
        );
        let config: FuripsConfig = toml::from_str(&toml).unwrap();
        assert!(config.firebird_previous.is_some());
    }

    #[test]
    fn test_blank_firebird_path_rejected() {
        let toml = minimal_toml().replace("/data/gestion.gdb", "  ");
        let config: FuripsConfig = toml::from_str(&toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let toml = format!("[application]\nlog_level = \"verbose\"\n{}", minimal_toml());
        let config: FuripsConfig = toml::from_str(&toml).unwrap();
        assert!(config.validate().unwrap_err().contains("log_level"));
    }
}
