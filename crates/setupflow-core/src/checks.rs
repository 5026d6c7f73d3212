//! # Validation Checks
//!
//! The fixed check sets, their results, and the decision tables that turn
//! policy flags into a fully populated report.
//!
//! ## Strictness
//!
//! Whether a check may ever be reported as strict is a declared property of
//! the check ([`CheckSpec::strictable`]). The strict flags only promote
//! failing checks that declare it; nothing is inferred from check names.
//!
//! ## Decision Table (application preflights)
//!
//! | Flags | Failing checks |
//! |-------|----------------|
//! | none | none |
//! | `fail_preflights` | storage, permissions |
//! | `fail_preflights` + `many_preflight_failures` | helm, storage, networking, permissions (verbose) |
//!
//! Host preflights fail `memory` and `disk_space` on every host when
//! `fail_host_preflights` is set.

use crate::{InstallConfig, PolicyFlags};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// CHECK SPECS
// =============================================================================

/// Declared properties of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSpec {
    /// Report key.
    pub name: &'static str,
    /// Display title.
    pub title: &'static str,
    /// Whether a failure of this check may be marked strict.
    pub strictable: bool,
}

/// Application environment checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnvironmentCheck {
    Kubernetes,
    Helm,
    Storage,
    Networking,
    Permissions,
}

impl EnvironmentCheck {
    /// Every environment check, in display order.
    pub const ALL: [EnvironmentCheck; 5] = [
        EnvironmentCheck::Kubernetes,
        EnvironmentCheck::Helm,
        EnvironmentCheck::Storage,
        EnvironmentCheck::Networking,
        EnvironmentCheck::Permissions,
    ];

    #[must_use]
    pub const fn spec(&self) -> CheckSpec {
        match self {
            EnvironmentCheck::Kubernetes => CheckSpec {
                name: "kubernetes",
                title: "Kubernetes Cluster",
                strictable: false,
            },
            EnvironmentCheck::Helm => CheckSpec {
                name: "helm",
                title: "Helm",
                strictable: false,
            },
            EnvironmentCheck::Storage => CheckSpec {
                name: "storage",
                title: "Storage Class",
                strictable: false,
            },
            EnvironmentCheck::Networking => CheckSpec {
                name: "networking",
                title: "Networking",
                strictable: false,
            },
            EnvironmentCheck::Permissions => CheckSpec {
                name: "permissions",
                title: "RBAC Permissions",
                strictable: true,
            },
        }
    }

    fn success_message(&self, config: &InstallConfig) -> String {
        match self {
            EnvironmentCheck::Kubernetes => format!(
                "Cluster '{}' is reachable and runs a supported Kubernetes version",
                config.cluster_name
            ),
            EnvironmentCheck::Helm => "Helm 3 is available".to_string(),
            EnvironmentCheck::Storage => format!(
                "Storage class '{}' exists and supports dynamic provisioning",
                config.storage_class
            ),
            EnvironmentCheck::Networking => format!(
                "Ingress for {} can be routed to the cluster",
                config.domain
            ),
            EnvironmentCheck::Permissions => {
                "Installer service account has the required permissions".to_string()
            }
        }
    }

    fn failure_message(&self, config: &InstallConfig, verbose: bool) -> String {
        let summary = match self {
            EnvironmentCheck::Kubernetes => format!(
                "Cluster '{}' runs an unsupported Kubernetes version",
                config.cluster_name
            ),
            EnvironmentCheck::Helm => "Helm 3 was not found".to_string(),
            EnvironmentCheck::Storage => format!(
                "Storage class '{}' was not found",
                config.storage_class
            ),
            EnvironmentCheck::Networking => {
                format!("{} does not resolve to the cluster", config.domain)
            }
            EnvironmentCheck::Permissions => {
                "Installer service account lacks cluster-admin permissions".to_string()
            }
        };
        if !verbose {
            return summary;
        }
        let detail = match self {
            EnvironmentCheck::Kubernetes => {
                "Upgrade the cluster to a supported release and retry."
            }
            EnvironmentCheck::Helm => {
                "Install Helm 3.8 or newer on the machine running the installer and make sure it is on PATH."
            }
            EnvironmentCheck::Storage => {
                "Create the storage class or pick an existing one in the configuration step. Volumes for the database cannot be provisioned without it."
            }
            EnvironmentCheck::Networking => {
                "Point a DNS record at the ingress controller's external address. Certificates cannot be issued until the name resolves."
            }
            EnvironmentCheck::Permissions => {
                "Bind the installer service account to the cluster-admin role. Custom resource definitions cannot be created otherwise."
            }
        };
        format!("{}. {}", summary, detail)
    }
}

/// Per-host checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HostCheck {
    Cpu,
    Memory,
    DiskSpace,
    NetworkPorts,
    Firewall,
}

impl HostCheck {
    /// Every host check, in display order.
    pub const ALL: [HostCheck; 5] = [
        HostCheck::Cpu,
        HostCheck::Memory,
        HostCheck::DiskSpace,
        HostCheck::NetworkPorts,
        HostCheck::Firewall,
    ];

    #[must_use]
    pub const fn spec(&self) -> CheckSpec {
        match self {
            HostCheck::Cpu => CheckSpec {
                name: "cpu",
                title: "CPU",
                strictable: false,
            },
            HostCheck::Memory => CheckSpec {
                name: "memory",
                title: "Memory",
                strictable: false,
            },
            HostCheck::DiskSpace => CheckSpec {
                name: "disk_space",
                title: "Disk Space",
                strictable: true,
            },
            HostCheck::NetworkPorts => CheckSpec {
                name: "network_ports",
                title: "Network Ports",
                strictable: false,
            },
            HostCheck::Firewall => CheckSpec {
                name: "firewall",
                title: "Firewall",
                strictable: false,
            },
        }
    }

    fn success_message(&self, host: &str) -> String {
        match self {
            HostCheck::Cpu => format!("{} has at least 4 CPU cores", host),
            HostCheck::Memory => format!("{} has at least 8 GiB of memory", host),
            HostCheck::DiskSpace => format!("{} has at least 40 GiB free in /var/lib", host),
            HostCheck::NetworkPorts => format!("Required ports are free on {}", host),
            HostCheck::Firewall => format!("Firewall on {} allows cluster traffic", host),
        }
    }

    fn failure_message(&self, host: &str) -> String {
        match self {
            HostCheck::Cpu => format!("{} has fewer than 4 CPU cores", host),
            HostCheck::Memory => format!("{} has only 4 GiB of memory; 8 GiB are required", host),
            HostCheck::DiskSpace => format!(
                "{} has only 12 GiB free in /var/lib; 40 GiB are required",
                host
            ),
            HostCheck::NetworkPorts => format!("Port 6443 is already in use on {}", host),
            HostCheck::Firewall => format!("Firewall on {} blocks cluster traffic", host),
        }
    }
}

// =============================================================================
// RESULTS
// =============================================================================

fn is_false(value: &bool) -> bool {
    !*value
}

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub success: bool,
    pub message: String,
    /// A strict failure cannot be bypassed.
    #[serde(rename = "isStrict", default, skip_serializing_if = "is_false")]
    pub is_strict: bool,
}

impl CheckResult {
    /// A passing result.
    #[must_use]
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            is_strict: false,
        }
    }

    /// A failing result.
    #[must_use]
    pub fn fail(message: impl Into<String>, strict: bool) -> Self {
        Self {
            success: false,
            message: message.into(),
            is_strict: strict,
        }
    }

    /// Failed and may not be bypassed.
    #[must_use]
    pub fn is_strict_failure(&self) -> bool {
        !self.success && self.is_strict
    }
}

/// Named check results for one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ValidationReport {
    checks: BTreeMap<String, CheckResult>,
}

impl ValidationReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of a check, replacing any earlier one.
    pub fn insert(&mut self, name: impl Into<String>, result: CheckResult) {
        self.checks.insert(name.into(), result);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.checks.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CheckResult)> {
        self.checks.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Failing checks, by name.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &CheckResult)> {
        self.iter().filter(|(_, r)| !r.success)
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.checks.values().any(|r| !r.success)
    }

    #[must_use]
    pub fn has_strict_failure(&self) -> bool {
        self.checks.values().any(CheckResult::is_strict_failure)
    }
}

/// Per-host validation reports, keyed by host name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct HostValidationReport {
    hosts: BTreeMap<String, ValidationReport>,
}

impl HostValidationReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, host: impl Into<String>, report: ValidationReport) {
        self.hosts.insert(host.into(), report);
    }

    #[must_use]
    pub fn get(&self, host: &str) -> Option<&ValidationReport> {
        self.hosts.get(host)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidationReport)> {
        self.hosts.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.hosts.values().map(ValidationReport::failure_count).sum()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.hosts.values().any(ValidationReport::has_failures)
    }

    #[must_use]
    pub fn has_strict_failure(&self) -> bool {
        self.hosts.values().any(ValidationReport::has_strict_failure)
    }
}

// =============================================================================
// DECISION TABLES
// =============================================================================

/// Environment checks forced to fail for the given flags.
#[must_use]
pub fn failing_environment_checks(flags: &PolicyFlags) -> &'static [EnvironmentCheck] {
    if !flags.fail_preflights {
        &[]
    } else if flags.many_preflight_failures {
        &[
            EnvironmentCheck::Helm,
            EnvironmentCheck::Storage,
            EnvironmentCheck::Networking,
            EnvironmentCheck::Permissions,
        ]
    } else {
        &[EnvironmentCheck::Storage, EnvironmentCheck::Permissions]
    }
}

/// Host checks forced to fail for the given flags.
#[must_use]
pub fn failing_host_checks(flags: &PolicyFlags) -> &'static [HostCheck] {
    if flags.fail_host_preflights {
        &[HostCheck::Memory, HostCheck::DiskSpace]
    } else {
        &[]
    }
}

/// Build the application preflight report.
///
/// Every check in [`EnvironmentCheck::ALL`] gets an entry.
#[must_use]
pub fn environment_report(config: &InstallConfig, flags: &PolicyFlags) -> ValidationReport {
    let failing = failing_environment_checks(flags);
    let verbose = flags.many_preflight_failures;
    let mut report = ValidationReport::new();

    for check in EnvironmentCheck::ALL {
        let spec = check.spec();
        let result = if failing.contains(&check) {
            let strict = flags.make_preflights_strict && spec.strictable;
            CheckResult::fail(check.failure_message(config, verbose), strict)
        } else {
            CheckResult::pass(check.success_message(config))
        };
        report.insert(spec.name, result);
    }

    report
}

/// Build the host preflight report, one entry per configured host.
#[must_use]
pub fn host_report(config: &InstallConfig, flags: &PolicyFlags) -> HostValidationReport {
    let failing = failing_host_checks(flags);
    let mut report = HostValidationReport::new();

    for host in &config.hosts {
        let mut checks = ValidationReport::new();
        for check in HostCheck::ALL {
            let spec = check.spec();
            let result = if failing.contains(&check) {
                let strict = flags.make_host_preflights_strict && spec.strictable;
                CheckResult::fail(check.failure_message(&host.name), strict)
            } else {
                CheckResult::pass(check.success_message(&host.name))
            };
            checks.insert(spec.name, result);
        }
        report.insert(host.name.clone(), checks);
    }

    report
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HostSpec;

    fn failing_flags() -> PolicyFlags {
        PolicyFlags {
            fail_preflights: true,
            ..PolicyFlags::default()
        }
    }

    #[test]
    fn default_flags_pass_everything() {
        let report = environment_report(&InstallConfig::default(), &PolicyFlags::default());
        assert_eq!(report.len(), EnvironmentCheck::ALL.len());
        assert!(!report.has_failures());
    }

    #[test]
    fn fail_flag_fails_storage_and_permissions() {
        let report = environment_report(&InstallConfig::default(), &failing_flags());
        let failed: Vec<_> = report.failures().map(|(name, _)| name).collect();
        assert_eq!(failed, vec!["permissions", "storage"]);
        assert!(!report.has_strict_failure());
    }

    #[test]
    fn strict_flag_only_promotes_strictable_checks() {
        let flags = PolicyFlags {
            make_preflights_strict: true,
            many_preflight_failures: true,
            ..failing_flags()
        };
        let report = environment_report(&InstallConfig::default(), &flags);
        let strict: Vec<_> = report
            .iter()
            .filter(|(_, r)| r.is_strict)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(strict, vec!["permissions"]);
        assert_eq!(report.failure_count(), 4);
    }

    #[test]
    fn strict_flag_without_fail_flag_is_inert() {
        let flags = PolicyFlags {
            make_preflights_strict: true,
            many_preflight_failures: true,
            ..PolicyFlags::default()
        };
        let report = environment_report(&InstallConfig::default(), &flags);
        assert!(!report.has_failures());
    }

    #[test]
    fn messages_interpolate_config() {
        let config = InstallConfig {
            storage_class: "fast-ssd".to_string(),
            ..InstallConfig::default()
        };
        let report = environment_report(&config, &failing_flags());
        let storage = report.get("storage").expect("storage entry");
        assert!(storage.message.contains("fast-ssd"));
    }

    #[test]
    fn many_failures_are_verbose() {
        let terse = environment_report(&InstallConfig::default(), &failing_flags());
        let verbose = environment_report(
            &InstallConfig::default(),
            &PolicyFlags {
                many_preflight_failures: true,
                ..failing_flags()
            },
        );
        let terse_len = terse.get("storage").map(|r| r.message.len()).unwrap_or(0);
        let verbose_len = verbose.get("storage").map(|r| r.message.len()).unwrap_or(0);
        assert!(verbose_len > terse_len);
    }

    #[test]
    fn host_report_covers_every_host() {
        let mut config = InstallConfig::default();
        config.hosts.push(HostSpec {
            name: "node-2".to_string(),
            address: "10.0.0.12".to_string(),
        });
        let flags = PolicyFlags {
            fail_host_preflights: true,
            make_host_preflights_strict: true,
            ..PolicyFlags::default()
        };
        let report = host_report(&config, &flags);
        assert_eq!(report.len(), 2);
        assert_eq!(report.failure_count(), 4);
        let node = report.get("node-2").expect("node-2");
        assert!(node.get("disk_space").is_some_and(CheckResult::is_strict_failure));
        assert!(node.get("memory").is_some_and(|r| !r.success && !r.is_strict));
    }

    #[test]
    fn strict_marker_omitted_when_false() {
        let json = serde_json::to_string(&CheckResult::pass("ok")).expect("serialize");
        assert!(!json.contains("isStrict"));
        let json = serde_json::to_string(&CheckResult::fail("no", true)).expect("serialize");
        assert!(json.contains("\"isStrict\":true"));
    }
}
