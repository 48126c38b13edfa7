// Dispatch settings persistence
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Trace-log every hooked call that goes through the dispatcher.
    pub log_dispatch: bool,
    /// Warn when a shared event is used outside any mod scope.
    pub warn_unresolved_owner: bool,
    /// Hooks whose events are skipped; the original function still runs.
    pub disabled_hooks: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            log_dispatch: false,
            warn_unresolved_owner: true,
            disabled_hooks: Vec::new(),
        }
    }
}

impl DispatchConfig {
    /// Load from JSON, or TOML when the file ends in `.toml`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dispatch config: {}", path.display()))?;

        if path.extension().and_then(|e| e.to_str()) == Some("toml") {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse dispatch config: {}", path.display()))
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse dispatch config: {}", path.display()))
        }
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!(
                "No dispatch config at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn is_disabled(&self, hook_name: &str) -> bool {
        self.disabled_hooks.iter().any(|name| name == hook_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Scratch directory for one test, removed on drop.
    struct TempDir(PathBuf);

    impl TempDir {
        fn new(test: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "modhook-config-{}-{}",
                std::process::id(),
                test
            ));
            std::fs::create_dir_all(&path).unwrap();
            Self(path)
        }

        fn file(&self, name: &str) -> PathBuf {
            self.0.join(name)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.0).ok();
        }
    }

    #[test]
    fn test_defaults() {
        let config = DispatchConfig::default();
        assert!(!config.log_dispatch);
        assert!(config.warn_unresolved_owner);
        assert!(!config.is_disabled("anything"));
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = TempDir::new("save-load");
        let path = dir.file("nested/dispatch.json");
        let config = DispatchConfig {
            log_dispatch: true,
            warn_unresolved_owner: false,
            disabled_hooks: vec!["Player::Jump".to_string()],
        };
        config.save(&path).unwrap();
        assert_eq!(DispatchConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_toml_with_missing_fields() {
        let dir = TempDir::new("toml");
        let path = dir.file("dispatch.toml");
        std::fs::write(&path, "disabled_hooks = [\"Camera::Shake\"]\n").unwrap();

        let config = DispatchConfig::load(&path).unwrap();
        assert!(config.is_disabled("Camera::Shake"));
        assert!(config.warn_unresolved_owner);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = TempDir::new("missing");
        let path = dir.file("does-not-exist.json");
        assert_eq!(
            DispatchConfig::load_or_default(&path).unwrap(),
            DispatchConfig::default()
        );
        assert!(DispatchConfig::load(&path).is_err());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let dir = TempDir::new("malformed");
        let path = dir.file("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = DispatchConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse dispatch config"));
    }

    #[test]
    fn test_scratch_dir_is_removed() {
        let root = {
            let dir = TempDir::new("cleanup");
            std::fs::write(dir.file("leftover.json"), "{}").unwrap();
            dir.0.clone()
        };
        assert!(!root.exists());
    }
}
