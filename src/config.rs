//! Configuration constants and types for the swap plugin.

use crate::error::{LoadError, LoadResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name the plugin is registered under.
pub const PLUGIN_NAME: &str = "swap";

/// Oldest `mkswap` that supports everything the plugin does.
pub const MIN_MKSWAP_VERSION: &str = "2.23.2";

/// Kernel table of active swap areas.
pub const DEFAULT_PROC_SWAPS: &str = "/proc/swaps";

/// Maximum label length stored in the swap header.
pub const MAX_LABEL_LENGTH: usize = 16;

/// Page sizes probed when looking for the swap magic.
pub const KNOWN_PAGE_SIZES: [usize; 4] = [4096, 8192, 16384, 65536];

/// Swap header field offsets (after the 1 KiB boot block).
pub mod header_layout {
    /// Offset of the header version field.
    pub const VERSION_OFFSET: usize = 1024;

    /// Offset of the last usable page field.
    pub const LAST_PAGE_OFFSET: usize = 1028;

    /// Offset of the bad page count.
    pub const NR_BADPAGES_OFFSET: usize = 1032;

    /// Offset of the 16-byte UUID.
    pub const UUID_OFFSET: usize = 1036;

    /// Offset of the 16-byte volume label.
    pub const LABEL_OFFSET: usize = 1052;

    /// Length of the magic string at the end of the first page.
    pub const MAGIC_LENGTH: usize = 10;
}

/// Environment variables read by [`SwapConfig::from_env`].
pub mod env_vars {
    pub const SEARCH_PATH: &str = "BDSWAP_SEARCH_PATH";
    pub const PROC_SWAPS: &str = "BDSWAP_PROC_SWAPS";
    pub const BACKEND: &str = "BDSWAP_BACKEND";
}

/// How swap areas are switched on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivationBackend {
    /// Call `swapon(2)`/`swapoff(2)` directly.
    #[default]
    Syscall,
    /// Run the `swapon`/`swapoff` utilities.
    Utility,
}

impl std::str::FromStr for ActivationBackend {
    type Err = LoadError;

    fn from_str(s: &str) -> LoadResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "syscall" => Ok(ActivationBackend::Syscall),
            "utility" => Ok(ActivationBackend::Utility),
            other => Err(LoadError::InvalidConfig(format!(
                "unknown activation backend '{}'",
                other
            ))),
        }
    }
}

/// Configuration for loading the swap plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapConfig {
    /// Directories searched for utilities, `PATH` syntax.
    /// `None` means the live `PATH` at load time.
    pub search_path: Option<String>,

    /// Location of the kernel's active swap table.
    pub proc_swaps: PathBuf,

    /// Activation mechanism.
    pub backend: ActivationBackend,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            search_path: None,
            proc_swaps: PathBuf::from(DEFAULT_PROC_SWAPS),
            backend: ActivationBackend::default(),
        }
    }
}

impl SwapConfig {
    /// Build a configuration from `BDSWAP_*` environment variables.
    pub fn from_env() -> LoadResult<Self> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(env_vars::SEARCH_PATH) {
            config.search_path = Some(path);
        }
        if let Ok(proc_swaps) = std::env::var(env_vars::PROC_SWAPS) {
            config.proc_swaps = PathBuf::from(proc_swaps);
        }
        if let Ok(backend) = std::env::var(env_vars::BACKEND) {
            config.backend = backend.parse()?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON configuration document.
    pub fn from_json(text: &str) -> LoadResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LoadResult<()> {
        if self.proc_swaps.as_os_str().is_empty() {
            return Err(LoadError::InvalidConfig(
                "proc_swaps path must not be empty".to_string(),
            ));
        }
        if let Some(search_path) = &self.search_path {
            if search_path.trim().is_empty() {
                return Err(LoadError::InvalidConfig(
                    "search_path must not be empty when set".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SwapConfig::default();
        assert_eq!(config.search_path, None);
        assert_eq!(config.proc_swaps, PathBuf::from("/proc/swaps"));
        assert_eq!(config.backend, ActivationBackend::Syscall);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = SwapConfig::from_json(r#"{"backend": "utility"}"#).unwrap();
        assert_eq!(config.backend, ActivationBackend::Utility);
        assert_eq!(config.proc_swaps, PathBuf::from(DEFAULT_PROC_SWAPS));
    }

    #[test]
    fn test_from_json_rejects_bad_backend() {
        let err = SwapConfig::from_json(r#"{"backend": "magic"}"#).unwrap_err();
        assert!(matches!(err, LoadError::InvalidConfig(_)));
    }

    #[test]
    fn test_validate_empty_search_path() {
        let config = SwapConfig {
            search_path: Some("  ".to_string()),
            ..SwapConfig::default()
        };
        assert!(config.validate().is_err());
    }

    // One test owns all BDSWAP_* variables; they are process-wide.
    #[test]
    fn test_from_env() {
        std::env::set_var(env_vars::SEARCH_PATH, "/opt/util-linux/bin");
        std::env::set_var(env_vars::PROC_SWAPS, "/tmp/swaps");
        std::env::set_var(env_vars::BACKEND, "utility");
        let config = SwapConfig::from_env().unwrap();
        assert_eq!(config.search_path.as_deref(), Some("/opt/util-linux/bin"));
        assert_eq!(config.proc_swaps, PathBuf::from("/tmp/swaps"));
        assert_eq!(config.backend, ActivationBackend::Utility);

        std::env::set_var(env_vars::BACKEND, "magic");
        assert!(matches!(
            SwapConfig::from_env(),
            Err(LoadError::InvalidConfig(_))
        ));

        std::env::remove_var(env_vars::BACKEND);
        std::env::set_var(env_vars::SEARCH_PATH, " ");
        assert!(matches!(
            SwapConfig::from_env(),
            Err(LoadError::InvalidConfig(_))
        ));

        std::env::remove_var(env_vars::SEARCH_PATH);
        std::env::remove_var(env_vars::PROC_SWAPS);
        assert_eq!(SwapConfig::from_env().unwrap(), SwapConfig::default());
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!(
            "Utility".parse::<ActivationBackend>().unwrap(),
            ActivationBackend::Utility
        );
        assert!("kernel".parse::<ActivationBackend>().is_err());
    }
}
