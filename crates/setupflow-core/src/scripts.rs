//! # Installer Scripts
//!
//! The status patches each installer step emits, in order. The app's
//! installer simulator plays these back around its clock delays:
//!
//! ```text
//! step_started(c)  ->  wait STEP_DELAY  ->  step_completed(c)
//! ```
//!
//! The generated configuration documents mimic what a real provisioning
//! call would print. They are never applied anywhere.

use crate::primitives::{APPLICATION_MIDPOINT_PROGRESS, CORE_FAILURE_MESSAGE};
use crate::{Component, ComponentStatus, DatabaseKind, InstallConfig, StatusPatch};

/// Progress reached when the component's step completes.
#[must_use]
pub fn milestone(component: Component) -> u8 {
    match component {
        Component::Openebs => 25,
        Component::Registry => 50,
        Component::Velero => 75,
        Component::Components => 100,
        Component::Database => APPLICATION_MIDPOINT_PROGRESS,
        Component::Core => 75,
        Component::Plugins => 100,
    }
}

/// `pending -> in-progress` with the generated configuration in the log.
#[must_use]
pub fn step_started(component: Component, config: &InstallConfig) -> StatusPatch {
    let mut lines = vec![
        format!("Installing {}...", component.title()),
        format!("Generated {} configuration:", component.title()),
    ];
    lines.extend(generated_config(component, config).lines().map(|l| format!("  {}", l)));

    StatusPatch::new()
        .component(component, ComponentStatus::InProgress)
        .message(format!("Installing {}...", component.title()))
        .logs(lines)
}

/// `in-progress -> completed` with progress advanced to the milestone.
#[must_use]
pub fn step_completed(component: Component, config: &InstallConfig) -> StatusPatch {
    let detail = match component {
        Component::Openebs => format!(
            "Storage class '{}' is backed by local persistent volumes",
            config.storage_class
        ),
        Component::Registry => format!("Registry available at registry.{}", config.domain),
        Component::Velero => "Backup schedule registered".to_string(),
        Component::Components => format!("Cluster '{}' add-ons are ready", config.cluster_name),
        Component::Database => match config.database.kind {
            DatabaseKind::Internal => format!(
                "Database '{}' created on the internal PostgreSQL instance",
                config.database.name
            ),
            DatabaseKind::Postgres => format!(
                "Connected to {}:{} and migrated database '{}'",
                config.database.host, config.database.port, config.database.name
            ),
        },
        Component::Core => format!("Application available at {}", config.base_url()),
        Component::Plugins => "Default plugins enabled".to_string(),
    };

    StatusPatch::new()
        .component(component, ComponentStatus::Completed)
        .progress(milestone(component))
        .message(format!("{} installed", component.title()))
        .logs([detail, format!("{} installed successfully", component.title())])
}

/// The core step short-circuiting to `failed`.
///
/// Progress stays at the midpoint reached by the database step.
#[must_use]
pub fn core_failed() -> StatusPatch {
    StatusPatch::new()
        .component(Component::Core, ComponentStatus::Failed)
        .progress(APPLICATION_MIDPOINT_PROGRESS)
        .message("Core application installation failed")
        .error(CORE_FAILURE_MESSAGE)
        .logs([
            "Installing Core Application...",
            "Error: deployment 'core-api' exceeded its progress deadline",
            "Error: 0/3 replicas available",
            CORE_FAILURE_MESSAGE,
        ])
}

/// Synthetic configuration document for a component.
#[must_use]
pub fn generated_config(component: Component, config: &InstallConfig) -> String {
    match component {
        Component::Openebs => format!(
            "apiVersion: storage.k8s.io/v1\nkind: StorageClass\nmetadata:\n  name: {}\nprovisioner: openebs.io/local\nvolumeBindingMode: WaitForFirstConsumer",
            config.storage_class
        ),
        Component::Registry => format!(
            "registry:\n  host: registry.{}\n  tls: {}\n  storage: {}",
            config.domain, config.use_https, config.storage_class
        ),
        Component::Velero => format!(
            "velero:\n  cluster: {}\n  schedule: \"0 3 * * *\"\n  ttl: 720h",
            config.cluster_name
        ),
        Component::Components => format!(
            "addons:\n  cluster: {}\n  ingress: enabled\n  certManager: {}",
            config.cluster_name, config.use_https
        ),
        Component::Database => format!(
            "database:\n  type: {}\n  host: {}\n  port: {}\n  name: {}\n  user: {}",
            match config.database.kind {
                DatabaseKind::Internal => "internal",
                DatabaseKind::Postgres => "postgres",
            },
            config.database.host,
            config.database.port,
            config.database.name,
            config.database.user
        ),
        Component::Core => format!(
            "core:\n  url: {}\n  admin:\n    username: {}\n    password: \"********\"",
            config.base_url(),
            config.admin_username
        ),
        Component::Plugins => "plugins:\n  - audit-log\n  - sso\n  - reporting".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Phase;

    #[test]
    fn milestones_increase_within_each_phase() {
        for phase in [Phase::Infrastructure, Phase::Application] {
            let values: Vec<u8> = phase.components().iter().map(|c| milestone(*c)).collect();
            assert!(values.windows(2).all(|w| w[0] < w[1]), "{:?}", values);
            assert_eq!(values.last().copied(), Some(100));
        }
    }

    #[test]
    fn started_patch_logs_generated_config() {
        let config = InstallConfig::default();
        let patch = step_started(Component::Openebs, &config);
        assert!(patch.logs.iter().any(|l| l.contains("kind: StorageClass")));
        assert!(patch.progress.is_none());
    }

    #[test]
    fn generated_config_never_leaks_password() {
        let config = InstallConfig {
            admin_password: "hunter2".to_string(),
            ..InstallConfig::default()
        };
        assert!(!generated_config(Component::Core, &config).contains("hunter2"));
    }

    #[test]
    fn core_failure_freezes_midpoint() {
        let patch = core_failed();
        assert_eq!(patch.progress, Some(APPLICATION_MIDPOINT_PROGRESS));
        assert_eq!(patch.error.as_deref(), Some(CORE_FAILURE_MESSAGE));
    }
}
