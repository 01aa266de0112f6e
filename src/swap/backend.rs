//! Activation backend abstraction.
//!
//! Swap areas are switched on and off either straight through the kernel
//! or by running the util-linux `swapon`/`swapoff` tools.

use crate::config::ActivationBackend;
use crate::deps::ToolSet;
use crate::error::{LoadError, LoadResult, OpError, Result};
use crate::tools::execute;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Kernel flag asking for an explicit priority.
const SWAP_FLAG_PREFER: i32 = 0x8000;

/// Bits of the flags word holding the priority.
const SWAP_FLAG_PRIO_MASK: i32 = 0x7fff;

/// Trait for switching swap areas on and off.
///
/// Callers pass canonical paths and have already checked the signature and
/// current state; implementations only report what the kernel or tool says.
pub trait SwapBackend: Send + Sync {
    /// Start swapping on `device`. A negative priority means kernel default.
    fn swapon(&self, device: &Path, priority: i32) -> Result<()>;

    /// Stop swapping on `device`.
    fn swapoff(&self, device: &Path) -> Result<()>;

    /// Get the name of this backend (for logging).
    fn name(&self) -> &'static str;
}

/// Flags word for `swapon(2)`.
pub fn swap_flags(priority: i32) -> i32 {
    if priority < 0 {
        0
    } else {
        SWAP_FLAG_PREFER | (priority.min(SWAP_FLAG_PRIO_MASK) & SWAP_FLAG_PRIO_MASK)
    }
}

/// Create the backend selected by the configuration.
pub fn create_backend(kind: ActivationBackend, tools: &ToolSet) -> LoadResult<Box<dyn SwapBackend>> {
    match kind {
        ActivationBackend::Syscall => Ok(Box::new(KernelBackend)),
        ActivationBackend::Utility => {
            let swapon = tools
                .swapon
                .clone()
                .ok_or_else(|| LoadError::MissingTool("swapon".to_string()))?;
            let swapoff = tools
                .swapoff
                .clone()
                .ok_or_else(|| LoadError::MissingTool("swapoff".to_string()))?;
            Ok(Box::new(UtilityBackend { swapon, swapoff }))
        }
    }
}

/// Direct `swapon(2)`/`swapoff(2)` calls.
#[derive(Debug, Default)]
pub struct KernelBackend;

#[cfg(target_os = "linux")]
impl SwapBackend for KernelBackend {
    fn swapon(&self, device: &Path, priority: i32) -> Result<()> {
        let c_path = c_path(device)?;
        // SAFETY: c_path is a valid NUL-terminated string for the duration of the call.
        let rc = unsafe { libc::swapon(c_path.as_ptr(), swap_flags(priority)) };
        if rc != 0 {
            return Err(classify_swapon_errno(device, std::io::Error::last_os_error()));
        }
        Ok(())
    }

    fn swapoff(&self, device: &Path) -> Result<()> {
        let c_path = c_path(device)?;
        // SAFETY: c_path is a valid NUL-terminated string for the duration of the call.
        let rc = unsafe { libc::swapoff(c_path.as_ptr()) };
        if rc != 0 {
            return Err(classify_swapoff_errno(device, std::io::Error::last_os_error()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "kernel"
    }
}

#[cfg(not(target_os = "linux"))]
impl SwapBackend for KernelBackend {
    fn swapon(&self, _device: &Path, _priority: i32) -> Result<()> {
        Err(OpError::ToolFailure {
            tool: "swapon".to_string(),
            detail: "swap activation is not supported on this platform".to_string(),
        })
    }

    fn swapoff(&self, _device: &Path) -> Result<()> {
        Err(OpError::ToolFailure {
            tool: "swapoff".to_string(),
            detail: "swap deactivation is not supported on this platform".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "kernel"
    }
}

#[cfg(target_os = "linux")]
fn c_path(device: &Path) -> Result<std::ffi::CString> {
    use std::os::unix::ffi::OsStrExt;
    std::ffi::CString::new(device.as_os_str().as_bytes())
        .map_err(|_| OpError::invalid_device(device, "path contains a NUL byte"))
}

/// Map a failed `swapon(2)` to an operation error.
pub fn classify_swapon_errno(device: &Path, err: std::io::Error) -> OpError {
    match err.raw_os_error() {
        Some(libc::EBUSY) => OpError::AlreadyActive(device.to_path_buf()),
        Some(libc::EINVAL) => OpError::NotSwapFormatted(device.to_path_buf()),
        Some(libc::ENOENT) | Some(libc::ENOTDIR) => OpError::invalid_device(device, err.to_string()),
        _ => OpError::ToolFailure {
            tool: "swapon".to_string(),
            detail: format!("Failed to activate swap on {}: {}", device.display(), err),
        },
    }
}

/// Map a failed `swapoff(2)` to an operation error.
pub fn classify_swapoff_errno(device: &Path, err: std::io::Error) -> OpError {
    match err.raw_os_error() {
        Some(libc::EINVAL) => OpError::NotActive(device.to_path_buf()),
        Some(libc::ENOENT) | Some(libc::ENOTDIR) => OpError::invalid_device(device, err.to_string()),
        _ => OpError::ToolFailure {
            tool: "swapoff".to_string(),
            detail: format!("Failed to deactivate swap on {}: {}", device.display(), err),
        },
    }
}

/// Runs the util-linux `swapon`/`swapoff` tools.
#[derive(Debug)]
pub struct UtilityBackend {
    swapon: PathBuf,
    swapoff: PathBuf,
}

impl UtilityBackend {
    pub fn new(swapon: PathBuf, swapoff: PathBuf) -> Self {
        Self { swapon, swapoff }
    }
}

impl SwapBackend for UtilityBackend {
    fn swapon(&self, device: &Path, priority: i32) -> Result<()> {
        let mut command = Command::new(&self.swapon);
        if priority >= 0 {
            let priority = priority.min(SWAP_FLAG_PRIO_MASK).to_string();
            command.arg("-p").arg(priority);
        }
        command.arg(device);
        execute(&mut command).map_err(|e| e.into_op_error("swapon"))?;
        Ok(())
    }

    fn swapoff(&self, device: &Path) -> Result<()> {
        execute(Command::new(&self.swapoff).arg(device)).map_err(|e| e.into_op_error("swapoff"))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "utility"
    }
}
