//! Load-time dependency checks.
//!
//! The swap plugin is only usable when `mkswap` (recent enough) and
//! `swaplabel` are on the search path. Everything is resolved afresh on
//! each call so a changed `PATH` is honoured on the next load.

use crate::config::{ActivationBackend, SwapConfig, MIN_MKSWAP_VERSION};
use crate::error::{LoadError, LoadResult};
use crate::tools::{execute, parse_tool_version, Tool, ToolLocator, ToolVersion};
use semver::Version;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Absolute paths of the utilities a loaded plugin uses.
#[derive(Debug, Clone)]
pub struct ToolSet {
    pub mkswap: PathBuf,
    pub mkswap_version: ToolVersion,
    pub swaplabel: PathBuf,
    /// Only resolved for the utility activation backend.
    pub swapon: Option<PathBuf>,
    /// Only resolved for the utility activation backend.
    pub swapoff: Option<PathBuf>,
}

/// Technologies provided by the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapTech {
    Swap,
}

/// Classes of operations for [`is_tech_avail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapTechMode {
    Create,
    ActivateDeactivate,
    Query,
    SetLabel,
    SetUuid,
}

/// Verify every utility the plugin needs and return their locations.
pub fn check_dependencies(locator: &ToolLocator, config: &SwapConfig) -> LoadResult<ToolSet> {
    let mkswap = require(locator, Tool::Mkswap)?;
    let mkswap_version = check_version(Tool::Mkswap, &mkswap, "-V", MIN_MKSWAP_VERSION)?;
    let swaplabel = require(locator, Tool::Swaplabel)?;

    let (swapon, swapoff) = match config.backend {
        ActivationBackend::Syscall => (None, None),
        ActivationBackend::Utility => (
            Some(require(locator, Tool::Swapon)?),
            Some(require(locator, Tool::Swapoff)?),
        ),
    };

    debug!(
        mkswap = %mkswap.display(),
        version = %mkswap_version,
        swaplabel = %swaplabel.display(),
        "Swap plugin dependencies satisfied"
    );

    Ok(ToolSet {
        mkswap,
        mkswap_version,
        swaplabel,
        swapon,
        swapoff,
    })
}

/// Check whether `mode` operations of `tech` can run with the given tools.
pub fn is_tech_avail(
    locator: &ToolLocator,
    backend: ActivationBackend,
    tech: SwapTech,
    mode: SwapTechMode,
) -> LoadResult<()> {
    let SwapTech::Swap = tech;

    let needed: &[Tool] = match (mode, backend) {
        (SwapTechMode::Create, _) => &[Tool::Mkswap],
        (SwapTechMode::SetLabel | SwapTechMode::SetUuid, _) => &[Tool::Swaplabel],
        (SwapTechMode::ActivateDeactivate, ActivationBackend::Utility) => {
            &[Tool::Swapon, Tool::Swapoff]
        }
        (SwapTechMode::ActivateDeactivate, ActivationBackend::Syscall) => &[],
        (SwapTechMode::Query, _) => &[],
    };

    for tool in needed {
        require(locator, *tool)?;
    }
    Ok(())
}

fn require(locator: &ToolLocator, tool: Tool) -> LoadResult<PathBuf> {
    locator.locate(tool).ok_or_else(|| {
        warn!(tool = tool.name(), "Required utility not found");
        LoadError::MissingTool(tool.name().to_string())
    })
}

fn check_version(tool: Tool, path: &Path, flag: &str, required: &str) -> LoadResult<ToolVersion> {
    let required_version = Version::parse(required).map_err(|e| LoadError::VersionQuery {
        tool: tool.name().to_string(),
        detail: format!("bad minimum version {}: {}", required, e),
    })?;

    let output = execute(Command::new(path).arg(flag)).map_err(|e| LoadError::VersionQuery {
        tool: tool.name().to_string(),
        detail: e.detail(),
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = if stdout.trim().is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        stdout.into_owned()
    };

    let unsupported = |found: String| {
        warn!(tool = tool.name(), found = %found, required, "Unsupported utility version");
        LoadError::UnsupportedVersion {
            tool: tool.name().to_string(),
            found,
            required: required.to_string(),
        }
    };

    let found = parse_tool_version(&text).ok_or_else(|| unsupported(text.trim().to_string()))?;
    if found.version < required_version {
        return Err(unsupported(found.raw));
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn script(dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn tools_dir(mkswap_version: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        script(
            dir.path(),
            "mkswap",
            &format!("echo 'mkswap from util-linux {}'", mkswap_version),
        );
        script(dir.path(), "swaplabel", "exit 0");
        dir
    }

    #[test]
    fn test_all_present() {
        let dir = tools_dir("2.39.3");
        let locator = ToolLocator::new(dir.path());
        let tools = check_dependencies(&locator, &SwapConfig::default()).unwrap();
        assert_eq!(tools.mkswap, dir.path().join("mkswap"));
        assert_eq!(tools.mkswap_version.version, Version::new(2, 39, 3));
        assert!(tools.swapon.is_none());
    }

    #[test]
    fn test_minimum_version_is_accepted() {
        let dir = tools_dir("2.23.2");
        let locator = ToolLocator::new(dir.path());
        assert!(check_dependencies(&locator, &SwapConfig::default()).is_ok());
    }

    #[test]
    fn test_low_version() {
        let dir = tools_dir("2.23.1");
        let locator = ToolLocator::new(dir.path());
        let err = check_dependencies(&locator, &SwapConfig::default()).unwrap_err();
        assert_eq!(
            err,
            LoadError::UnsupportedVersion {
                tool: "mkswap".to_string(),
                found: "2.23.1".to_string(),
                required: "2.23.2".to_string(),
            }
        );
    }

    #[test]
    fn test_unparseable_version() {
        let dir = TempDir::new().unwrap();
        script(dir.path(), "mkswap", "echo 'mkswap, some build'");
        script(dir.path(), "swaplabel", "exit 0");
        let locator = ToolLocator::new(dir.path());
        let err = check_dependencies(&locator, &SwapConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_version_query_fails() {
        let dir = TempDir::new().unwrap();
        script(dir.path(), "mkswap", "echo nope >&2; exit 1");
        script(dir.path(), "swaplabel", "exit 0");
        let locator = ToolLocator::new(dir.path());
        let err = check_dependencies(&locator, &SwapConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::VersionQuery { .. }));
    }

    #[test]
    fn test_missing_mkswap() {
        let dir = TempDir::new().unwrap();
        script(dir.path(), "swaplabel", "exit 0");
        let locator = ToolLocator::new(dir.path());
        let err = check_dependencies(&locator, &SwapConfig::default()).unwrap_err();
        assert_eq!(err, LoadError::MissingTool("mkswap".to_string()));
    }

    #[test]
    fn test_missing_swaplabel() {
        let dir = TempDir::new().unwrap();
        script(dir.path(), "mkswap", "echo 'mkswap from util-linux 2.39.3'");
        let locator = ToolLocator::new(dir.path());
        let err = check_dependencies(&locator, &SwapConfig::default()).unwrap_err();
        assert_eq!(err, LoadError::MissingTool("swaplabel".to_string()));
    }

    #[test]
    fn test_utility_backend_needs_swapon() {
        let dir = tools_dir("2.39.3");
        let locator = ToolLocator::new(dir.path());
        let config = SwapConfig {
            backend: ActivationBackend::Utility,
            ..SwapConfig::default()
        };
        let err = check_dependencies(&locator, &config).unwrap_err();
        assert_eq!(err, LoadError::MissingTool("swapon".to_string()));

        script(dir.path(), "swapon", "exit 0");
        script(dir.path(), "swapoff", "exit 0");
        let tools = check_dependencies(&locator, &config).unwrap();
        assert_eq!(tools.swapoff, Some(dir.path().join("swapoff")));
    }

    #[test]
    fn test_tech_avail() {
        let dir = TempDir::new().unwrap();
        script(dir.path(), "swaplabel", "exit 0");
        let locator = ToolLocator::new(dir.path());
        let syscall = ActivationBackend::Syscall;

        assert!(is_tech_avail(&locator, syscall, SwapTech::Swap, SwapTechMode::Query).is_ok());
        assert!(is_tech_avail(&locator, syscall, SwapTech::Swap, SwapTechMode::SetLabel).is_ok());
        assert!(
            is_tech_avail(&locator, syscall, SwapTech::Swap, SwapTechMode::ActivateDeactivate)
                .is_ok()
        );
        assert_eq!(
            is_tech_avail(&locator, syscall, SwapTech::Swap, SwapTechMode::Create).unwrap_err(),
            LoadError::MissingTool("mkswap".to_string())
        );
        assert!(is_tech_avail(
            &locator,
            ActivationBackend::Utility,
            SwapTech::Swap,
            SwapTechMode::ActivateDeactivate
        )
        .is_err());
    }
}
