pub mod schema;
pub mod watcher;

pub use schema::{HarnessConfig, MonitorConfig, PerfwatchConfig};
pub use watcher::ConfigWatcher;

use perfwatch_core::{PerfError, Result};
use std::path::{Path, PathBuf};

/// Load and validate configuration from a TOML file.  Returns
/// `PerfwatchConfig::default()` if the file doesn't exist.
pub fn load(path: impl AsRef<Path>) -> Result<PerfwatchConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(PerfwatchConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| PerfError::Config(format!("cannot read '{}': {e}", path.display())))?;

    let config: PerfwatchConfig =
        toml::from_str(&raw).map_err(|e| PerfError::Config(format!("TOML parse error: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("perfwatch").join("perfwatch.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "perfwatch-{}-{name}.toml",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("perfwatch-definitely-missing.toml");
        assert_eq!(load(path).unwrap(), PerfwatchConfig::default());
    }

    #[test]
    fn loads_overrides() {
        let path = scratch_file("overrides", "[monitor]\nmemory_ceiling_mb = 1024.0\n");
        let config = load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.monitor.memory_ceiling_mb, 1024.0);
        assert_eq!(config.monitor.capacity, 120);
    }

    #[test]
    fn parse_errors_are_config_errors() {
        let path = scratch_file("broken", "[monitor\ncapacity = ");
        let result = load(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(PerfError::Config(_))));
    }

    #[test]
    fn invalid_values_fail_fast() {
        let path = scratch_file("invalid", "[monitor]\ncapacity = 0\n");
        let result = load(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            result,
            Err(PerfError::Misconfiguration { field: "capacity", .. })
        ));
    }

    #[test]
    fn default_path_ends_with_file_name() {
        assert!(default_path().ends_with("perfwatch/perfwatch.toml"));
    }
}
