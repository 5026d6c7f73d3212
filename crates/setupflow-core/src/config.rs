//! # Installation Configuration
//!
//! The values a user enters in the wizard forms. The simulators only read
//! them to interpolate messages and render generated configuration
//! documents; nothing here is ever provisioned.

use crate::WizardError;
use serde::{Deserialize, Serialize};

/// Database engine selected for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    /// Database deployed by the installer inside the cluster.
    #[default]
    Internal,
    /// Externally managed PostgreSQL.
    Postgres,
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub kind: DatabaseKind,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            kind: DatabaseKind::Internal,
            host: "postgres.internal".to_string(),
            port: 5432,
            name: "enterprise".to_string(),
            user: "enterprise".to_string(),
            password: String::new(),
        }
    }
}

/// A host taking part in a linux-mode installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSpec {
    pub name: String,
    pub address: String,
}

/// Everything the wizard collected before installation starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    pub cluster_name: String,
    pub domain: String,
    pub admin_username: String,
    pub admin_password: String,
    pub storage_class: String,
    pub use_https: bool,
    pub database: DatabaseConfig,
    pub hosts: Vec<HostSpec>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            cluster_name: "enterprise-cluster".to_string(),
            domain: "enterprise.example.com".to_string(),
            admin_username: "admin".to_string(),
            admin_password: String::new(),
            storage_class: "standard".to_string(),
            use_https: true,
            database: DatabaseConfig::default(),
            hosts: vec![HostSpec {
                name: "node-1".to_string(),
                address: "10.0.0.11".to_string(),
            }],
        }
    }
}

impl InstallConfig {
    /// Base URL the application will be reachable at.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        format!("{}://{}", scheme, self.domain)
    }

    /// Reject configurations the installer could not interpolate.
    ///
    /// Hosts are only required in linux mode, so they are checked by
    /// [`InstallConfig::validate_hosts`].
    pub fn validate(&self) -> Result<(), WizardError> {
        if self.cluster_name.trim().is_empty() {
            return Err(WizardError::InvalidConfig(
                "cluster name is required".to_string(),
            ));
        }
        if self.domain.trim().is_empty() || self.domain.contains(char::is_whitespace) {
            return Err(WizardError::InvalidConfig(format!(
                "invalid domain '{}'",
                self.domain
            )));
        }
        if self.admin_username.trim().is_empty() {
            return Err(WizardError::InvalidConfig(
                "admin username is required".to_string(),
            ));
        }
        if self.storage_class.trim().is_empty() {
            return Err(WizardError::InvalidConfig(
                "storage class is required".to_string(),
            ));
        }
        if self.database.kind == DatabaseKind::Postgres && self.database.host.trim().is_empty() {
            return Err(WizardError::InvalidConfig(
                "external database host is required".to_string(),
            ));
        }
        if self.database.port == 0 {
            return Err(WizardError::InvalidConfig(
                "database port must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Require at least one host with a name.
    pub fn validate_hosts(&self) -> Result<(), WizardError> {
        if self.hosts.is_empty() {
            return Err(WizardError::InvalidConfig(
                "at least one host is required".to_string(),
            ));
        }
        if let Some(host) = self.hosts.iter().find(|h| h.name.trim().is_empty()) {
            return Err(WizardError::InvalidConfig(format!(
                "host at {} has no name",
                host.address
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = InstallConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.validate_hosts().is_ok());
    }

    #[test]
    fn empty_cluster_name_rejected() {
        let config = InstallConfig {
            cluster_name: "  ".to_string(),
            ..InstallConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(WizardError::InvalidConfig(_))
        ));
    }

    #[test]
    fn external_database_needs_host() {
        let mut config = InstallConfig::default();
        config.database.kind = DatabaseKind::Postgres;
        config.database.host = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn base_url_follows_https_toggle() {
        let mut config = InstallConfig::default();
        assert_eq!(config.base_url(), "https://enterprise.example.com");
        config.use_https = false;
        assert_eq!(config.base_url(), "http://enterprise.example.com");
    }

    #[test]
    fn hosts_required_for_linux() {
        let config = InstallConfig {
            hosts: Vec::new(),
            ..InstallConfig::default()
        };
        assert!(config.validate_hosts().is_err());
    }
}
