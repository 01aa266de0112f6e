//! External utilities used by the plugin.
//!
//! This module handles:
//! - Locating utilities on the search path
//! - Running them and classifying failures
//! - Parsing self-reported versions

mod exec;
mod version;

pub use exec::{command_to_string, execute};
pub use version::{parse_tool_version, ToolVersion};

use std::ffi::OsString;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Utilities the swap plugin may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Mkswap,
    Swaplabel,
    Swapon,
    Swapoff,
}

impl Tool {
    /// Executable name looked up on the search path.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Mkswap => "mkswap",
            Tool::Swaplabel => "swaplabel",
            Tool::Swapon => "swapon",
            Tool::Swapoff => "swapoff",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves utilities against a snapshot of the search path.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    dirs: Vec<PathBuf>,
}

impl ToolLocator {
    /// Locator over an explicit `PATH`-style string.
    pub fn new(search_path: impl Into<OsString>) -> Self {
        let search_path = search_path.into();
        let dirs = std::env::split_paths(&search_path)
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect();
        Self { dirs }
    }

    /// Locator over the current process `PATH`.
    pub fn from_env() -> Self {
        Self::new(std::env::var_os("PATH").unwrap_or_default())
    }

    /// Locator for an optional configured path, falling back to `PATH`.
    pub fn from_search_path(search_path: Option<&str>) -> Self {
        match search_path {
            Some(path) => Self::new(path),
            None => Self::from_env(),
        }
    }

    /// Directories searched, in order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Absolute path of the first executable named after `tool`.
    pub fn locate(&self, tool: Tool) -> Option<PathBuf> {
        self.locate_name(tool.name())
    }

    /// Same as [`locate`](Self::locate) for an arbitrary executable name.
    pub fn locate_name(&self, name: &str) -> Option<PathBuf> {
        let candidate = Path::new(name);
        if candidate.is_absolute() {
            return is_executable(candidate).then(|| candidate.to_path_buf());
        }

        self.dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|path| is_executable(path))
            .and_then(|path| {
                if path.is_absolute() {
                    Some(path)
                } else {
                    std::env::current_dir().ok().map(|cwd| cwd.join(path))
                }
            })
    }
}

fn is_executable(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_file(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn test_locate_first_match_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        make_file(second.path(), "mkswap", 0o755);
        let expected = make_file(first.path(), "mkswap", 0o755);

        let search = std::env::join_paths([first.path(), second.path()]).unwrap();
        let locator = ToolLocator::new(search);
        assert_eq!(locator.locate(Tool::Mkswap), Some(expected));
    }

    #[test]
    fn test_locate_skips_non_executable() {
        let dir = TempDir::new().unwrap();
        make_file(dir.path(), "swaplabel", 0o644);

        let locator = ToolLocator::new(dir.path());
        assert_eq!(locator.locate(Tool::Swaplabel), None);
    }

    #[test]
    fn test_locate_skips_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("swapon")).unwrap();

        let locator = ToolLocator::new(dir.path());
        assert_eq!(locator.locate(Tool::Swapon), None);
    }

    #[test]
    fn test_locate_absolute_name() {
        let dir = TempDir::new().unwrap();
        let tool = make_file(dir.path(), "custom-mkswap", 0o755);

        let locator = ToolLocator::new("");
        assert!(locator.dirs().is_empty());
        assert_eq!(locator.locate_name(tool.to_str().unwrap()), Some(tool));
    }

    #[test]
    fn test_tool_names() {
        assert_eq!(Tool::Mkswap.to_string(), "mkswap");
        assert_eq!(Tool::Swaplabel.name(), "swaplabel");
        assert_eq!(Tool::Swapoff.name(), "swapoff");
    }
}
