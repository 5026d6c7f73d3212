//! # Settings
//!
//! Policy flags and the install configuration live in TOML files next to
//! the binary. Flags are re-read through a [`FlagSource`] at each phase
//! start, so editing the file between phases changes the next outcome.

use setupflow_core::{InstallConfig, PolicyFlags, WizardError};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Default policy flags file name.
pub const DEFAULT_FLAGS_FILE: &str = "setupflow-flags.toml";

/// Where the wizard reads its policy flags from.
pub trait FlagSource: Send + Sync + std::fmt::Debug {
    fn load(&self) -> Result<PolicyFlags, WizardError>;
}

pub type SharedFlags = Arc<dyn FlagSource>;

// =============================================================================
// FILE FLAGS
// =============================================================================

/// Flags stored in a TOML file. A missing file means defaults.
#[derive(Debug, Clone)]
pub struct FileFlags {
    path: PathBuf,
}

impl FileFlags {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the file with `flags`.
    pub fn save(&self, flags: &PolicyFlags) -> Result<(), WizardError> {
        let content = render_flags(flags)?;
        std::fs::write(&self.path, content).map_err(|e| {
            WizardError::IoError(format!("Cannot write {}: {}", self.path.display(), e))
        })?;
        tracing::info!(path = %self.path.display(), "Policy flags saved");
        Ok(())
    }
}

impl FlagSource for FileFlags {
    fn load(&self) -> Result<PolicyFlags, WizardError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No flags file, using defaults");
            return Ok(PolicyFlags::default());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            WizardError::IoError(format!("Cannot read {}: {}", self.path.display(), e))
        })?;
        let flags = parse_flags(&content)?;
        tracing::debug!(path = %self.path.display(), ?flags, "Policy flags loaded");
        Ok(flags)
    }
}

// =============================================================================
// MEMORY FLAGS
// =============================================================================

/// Flags held in memory, replaceable at runtime.
#[derive(Debug, Default)]
pub struct MemoryFlags {
    flags: RwLock<PolicyFlags>,
}

impl MemoryFlags {
    #[must_use]
    pub fn new(flags: PolicyFlags) -> Self {
        Self {
            flags: RwLock::new(flags),
        }
    }

    /// Replace the flags seen by the next phase start.
    pub fn set(&self, flags: PolicyFlags) {
        *self.flags.write().unwrap_or_else(PoisonError::into_inner) = flags;
    }
}

impl FlagSource for MemoryFlags {
    fn load(&self) -> Result<PolicyFlags, WizardError> {
        Ok(self
            .flags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

// =============================================================================
// TOML HELPERS
// =============================================================================

pub fn parse_flags(content: &str) -> Result<PolicyFlags, WizardError> {
    toml::from_str(content).map_err(|e| WizardError::DeserializationError(e.to_string()))
}

pub fn render_flags(flags: &PolicyFlags) -> Result<String, WizardError> {
    toml::to_string_pretty(flags).map_err(|e| WizardError::SerializationError(e.to_string()))
}

/// Load the install configuration, or the built-in demo values when no
/// path is given.
pub fn load_install_config(path: Option<&Path>) -> Result<InstallConfig, WizardError> {
    let Some(path) = path else {
        return Ok(InstallConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| WizardError::IoError(format!("Cannot read {}: {}", path.display(), e)))?;
    let config: InstallConfig = toml::from_str(&content)
        .map_err(|e| WizardError::DeserializationError(e.to_string()))?;
    config.validate()?;
    tracing::info!(path = %path.display(), cluster = %config.cluster_name, "Install config loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use setupflow_core::Phase;

    #[test]
    fn partial_file_fills_defaults() {
        let flags = parse_flags("fail_preflights = true\nmanual_advance = [\"preflights\"]\n")
            .expect("parse");
        assert!(flags.fail_preflights);
        assert!(!flags.make_preflights_strict);
        assert!(flags.manual_advance.contains(&Phase::Preflights));
    }

    #[test]
    fn unknown_phase_is_rejected() {
        assert!(matches!(
            parse_flags("manual_advance = [\"nowhere\"]"),
            Err(WizardError::DeserializationError(_))
        ));
    }

    #[test]
    fn memory_flags_are_replaceable() {
        let source = MemoryFlags::default();
        assert_eq!(source.load().expect("load"), PolicyFlags::default());

        source.set(PolicyFlags {
            fail_installation: true,
            ..PolicyFlags::default()
        });
        assert!(source.load().expect("load").fail_installation);
    }

    #[test]
    fn no_config_path_uses_demo_values() {
        let config = load_install_config(None).expect("config");
        assert_eq!(config, InstallConfig::default());
    }
}
