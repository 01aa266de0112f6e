//! Swap operations - the main interface.

use crate::config::{ActivationBackend, SwapConfig, PLUGIN_NAME};
use crate::deps::{check_dependencies, is_tech_avail, SwapTech, SwapTechMode, ToolSet};
use crate::error::{LoadResult, OpError, Result};
use crate::swap::backend::{create_backend, SwapBackend};
use crate::swap::signature::{check_label, check_uuid, read_signature, SignatureKind, SwapSignature};
use crate::swap::status::{StatusOracle, SwapArea};
use crate::tools::{execute, ToolLocator};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Extra option passed through to a utility's command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraArg {
    pub opt: String,
    /// Empty for flags without a value.
    pub val: String,
}

impl ExtraArg {
    pub fn new(opt: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            opt: opt.into(),
            val: val.into(),
        }
    }

    fn append_to(&self, command: &mut Command) {
        command.arg(&self.opt);
        if !self.val.is_empty() {
            command.arg(&self.val);
        }
    }
}

impl std::str::FromStr for ExtraArg {
    type Err = String;

    /// Parse `OPT` or `OPT=VAL`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (opt, val) = s.split_once('=').unwrap_or((s, ""));
        if opt.is_empty() {
            return Err(format!("invalid extra argument '{}'", s));
        }
        Ok(Self::new(opt, val))
    }
}

/// Information about a loaded plugin.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub name: &'static str,
    pub mkswap: PathBuf,
    pub mkswap_version: String,
    pub swaplabel: PathBuf,
    pub backend: &'static str,
    pub proc_swaps: PathBuf,
}

/// A loaded swap plugin.
///
/// Only obtainable through [`SwapPlugin::load`], so holding one means the
/// dependency checks passed.
pub struct SwapPlugin {
    config: SwapConfig,
    tools: ToolSet,
    oracle: StatusOracle,
    backend: Box<dyn SwapBackend>,
}

impl std::fmt::Debug for SwapPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwapPlugin")
            .field("config", &self.config)
            .field("tools", &self.tools)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl SwapPlugin {
    /// Name the plugin is registered under.
    pub const NAME: &'static str = PLUGIN_NAME;

    /// Check dependencies and load the plugin.
    ///
    /// Utilities are located afresh on every call.
    pub fn load(config: SwapConfig) -> LoadResult<Self> {
        config.validate()?;

        let locator = ToolLocator::from_search_path(config.search_path.as_deref());
        let tools = check_dependencies(&locator, &config)?;
        let backend = create_backend(config.backend, &tools)?;
        let oracle = StatusOracle::new(&config.proc_swaps);

        info!(
            plugin = Self::NAME,
            mkswap_version = %tools.mkswap_version,
            backend = backend.name(),
            "Swap plugin loaded"
        );

        Ok(Self {
            config,
            tools,
            oracle,
            backend,
        })
    }

    /// Load with [`SwapConfig::default`].
    pub fn load_default() -> LoadResult<Self> {
        Self::load(SwapConfig::default())
    }

    /// Configuration the plugin was loaded with.
    pub fn config(&self) -> &SwapConfig {
        &self.config
    }

    /// Summary of resolved tools and settings.
    pub fn info(&self) -> PluginInfo {
        PluginInfo {
            name: Self::NAME,
            mkswap: self.tools.mkswap.clone(),
            mkswap_version: self.tools.mkswap_version.raw.clone(),
            swaplabel: self.tools.swaplabel.clone(),
            backend: self.backend.name(),
            proc_swaps: self.oracle.source().to_path_buf(),
        }
    }

    /// Whether `mode` operations are usable with the current search path.
    pub fn is_tech_avail(&self, tech: SwapTech, mode: SwapTechMode) -> LoadResult<()> {
        let locator = ToolLocator::from_search_path(self.config.search_path.as_deref());
        is_tech_avail(&locator, self.config.backend, tech, mode)
    }

    /// Format `device` as swap, optionally with a label.
    pub fn mkswap(&self, device: &Path, label: Option<&str>, extra: &[ExtraArg]) -> Result<()> {
        ensure_exists(device)?;
        if let Some(label) = label {
            check_label(label)?;
        }
        OpenOptions::new()
            .write(true)
            .open(device)
            .map_err(|e| OpError::invalid_device(device, format!("not writable: {}", e)))?;

        let mut command = Command::new(&self.tools.mkswap);
        command.arg("-f");
        if let Some(label) = label {
            command.arg("-L").arg(label);
        }
        for arg in extra {
            arg.append_to(&mut command);
        }
        command.arg(device);

        execute(&mut command).map_err(|e| e.into_op_error("mkswap"))?;
        info!(device = %device.display(), label = ?label, "Created swap area");
        Ok(())
    }

    /// Activate swap on `device`. A negative priority leaves it to the kernel.
    pub fn swapon(&self, device: &Path, priority: i32) -> Result<()> {
        ensure_exists(device)?;
        let canonical = canonical(device);

        let signature = self.require_signature(device, &canonical)?;
        match signature.kind {
            SignatureKind::Swap => {}
            SignatureKind::OldFormat => {
                return Err(OpError::UnusableSignature {
                    device: device.to_path_buf(),
                    reason: "Old swap format, cannot activate.".to_string(),
                })
            }
            SignatureKind::Hibernated => {
                return Err(OpError::UnusableSignature {
                    device: device.to_path_buf(),
                    reason: "Swap area hibernated, cannot activate.".to_string(),
                })
            }
        }

        if self.oracle.lookup(&canonical)?.is_some() {
            return Err(OpError::AlreadyActive(device.to_path_buf()));
        }

        debug!(
            device = %canonical.display(),
            priority,
            backend = self.backend.name(),
            "Activating swap"
        );
        self.backend.swapon(&canonical, priority)?;
        info!(device = %device.display(), priority, "Swap activated");
        Ok(())
    }

    /// Deactivate swap on `device`.
    ///
    /// A device that was never activated and one already deactivated both
    /// yield [`OpError::NotActive`].
    pub fn swapoff(&self, device: &Path) -> Result<()> {
        ensure_exists(device)?;
        let canonical = canonical(device);

        if self.oracle.lookup(&canonical)?.is_none() {
            return Err(OpError::NotActive(device.to_path_buf()));
        }

        debug!(device = %canonical.display(), backend = self.backend.name(), "Deactivating swap");
        self.backend.swapoff(&canonical)?;
        info!(device = %device.display(), "Swap deactivated");
        Ok(())
    }

    /// Whether `device` is active as swap. Never fails.
    pub fn swapstatus(&self, device: &Path) -> bool {
        self.oracle.is_active(device)
    }

    /// Rewrite the label of an existing swap area.
    pub fn set_label(&self, device: &Path, label: &str) -> Result<()> {
        ensure_exists(device)?;
        check_label(label)?;
        self.require_usable_signature(device)?;

        execute(
            Command::new(&self.tools.swaplabel)
                .arg("-L")
                .arg(label)
                .arg(device),
        )
        .map_err(|e| e.into_op_error("swaplabel"))?;
        info!(device = %device.display(), label, "Swap label set");
        Ok(())
    }

    /// Rewrite the UUID of an existing swap area.
    pub fn set_uuid(&self, device: &Path, uuid: &str) -> Result<()> {
        ensure_exists(device)?;
        check_uuid(uuid)?;
        self.require_usable_signature(device)?;

        execute(
            Command::new(&self.tools.swaplabel)
                .arg("-U")
                .arg(uuid)
                .arg(device),
        )
        .map_err(|e| e.into_op_error("swaplabel"))?;
        info!(device = %device.display(), uuid, "Swap UUID set");
        Ok(())
    }

    /// Decoded swap header of `device`, `None` when it is not swap.
    pub fn signature(&self, device: &Path) -> Result<Option<SwapSignature>> {
        ensure_exists(device)?;
        read_signature(device).map_err(|e| OpError::invalid_device(device, e.to_string()))
    }

    /// All swap areas currently active.
    pub fn active_swaps(&self) -> Result<Vec<SwapArea>> {
        self.oracle.areas()
    }

    /// Active record for `device`, if any.
    pub fn active_area(&self, device: &Path) -> Option<SwapArea> {
        self.oracle.find(device)
    }

    /// Configured activation mechanism.
    pub fn backend(&self) -> ActivationBackend {
        self.config.backend
    }

    fn require_signature(&self, device: &Path, canonical: &Path) -> Result<SwapSignature> {
        read_signature(canonical)
            .map_err(|e| OpError::invalid_device(device, e.to_string()))?
            .ok_or_else(|| OpError::NotSwapFormatted(device.to_path_buf()))
    }

    fn require_usable_signature(&self, device: &Path) -> Result<SwapSignature> {
        let signature = self.require_signature(device, device)?;
        if signature.kind == SignatureKind::OldFormat {
            return Err(OpError::NotSwapFormatted(device.to_path_buf()));
        }
        Ok(signature)
    }
}

fn ensure_exists(device: &Path) -> Result<()> {
    std::fs::metadata(device)
        .map(|_| ())
        .map_err(|e| OpError::invalid_device(device, e.to_string()))
}

fn canonical(device: &Path) -> PathBuf {
    device
        .canonicalize()
        .unwrap_or_else(|_| device.to_path_buf())
}
