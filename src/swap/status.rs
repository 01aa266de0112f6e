//! Active swap areas as reported by the kernel.
//!
//! Nothing here is cached: every query re-reads `/proc/swaps`.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One row of `/proc/swaps`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapArea {
    pub path: PathBuf,
    /// `partition` or `file`.
    pub kind: String,
    pub size_kib: u64,
    pub used_kib: u64,
    pub priority: i32,
    /// Backing file was unlinked while active; the path names nothing.
    #[serde(default)]
    pub deleted: bool,
}

impl SwapArea {
    /// Whether this record is the swap area at `device`.
    ///
    /// A deleted record never matches: its path may since have been reused.
    pub fn matches(&self, device: &Path) -> bool {
        !self.deleted && same_device(device, &self.path)
    }
}

/// Answers whether a device is currently swapped on.
#[derive(Debug, Clone)]
pub struct StatusOracle {
    proc_swaps: PathBuf,
}

impl StatusOracle {
    pub fn new(proc_swaps: impl Into<PathBuf>) -> Self {
        Self {
            proc_swaps: proc_swaps.into(),
        }
    }

    /// Path of the table being read.
    pub fn source(&self) -> &Path {
        &self.proc_swaps
    }

    /// All active swap areas.
    pub fn areas(&self) -> Result<Vec<SwapArea>> {
        let content = std::fs::read_to_string(&self.proc_swaps)?;
        Ok(parse_proc_swaps(&content))
    }

    /// Active record for `device`, failing when the table cannot be read.
    pub fn lookup(&self, device: &Path) -> Result<Option<SwapArea>> {
        Ok(self.areas()?.into_iter().find(|area| area.matches(device)))
    }

    /// Active record for `device`, if any. An unreadable table counts as none.
    pub fn find(&self, device: &Path) -> Option<SwapArea> {
        match self.lookup(device) {
            Ok(area) => area,
            Err(e) => {
                debug!(source = %self.proc_swaps.display(), error = %e, "Cannot read swap table");
                None
            }
        }
    }

    /// Whether `device` is active as swap. Never fails.
    pub fn is_active(&self, device: &Path) -> bool {
        self.find(device).is_some()
    }
}

/// Parse the contents of `/proc/swaps`.
///
/// Malformed rows are skipped.
pub fn parse_proc_swaps(content: &str) -> Vec<SwapArea> {
    content
        .lines()
        .filter(|line| !line.starts_with("Filename"))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let (path, deleted) = unescape_path(fields.next()?);
            let kind = fields.next()?.to_string();
            let size_kib = fields.next()?.parse().ok()?;
            let used_kib = fields.next()?.parse().ok()?;
            let priority = fields.next()?.parse().ok()?;
            Some(SwapArea {
                path,
                kind,
                size_kib,
                used_kib,
                priority,
                deleted,
            })
        })
        .collect()
}

/// Undo the kernel's octal escaping of whitespace and backslashes.
///
/// Also reports whether the kernel marked the path ` (deleted)`.
fn unescape_path(field: &str) -> (PathBuf, bool) {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && is_octal_escape(&bytes[i + 1..i + 4]) {
            let value =
                (bytes[i + 1] - b'0') * 64 + (bytes[i + 2] - b'0') * 8 + (bytes[i + 3] - b'0');
            out.push(value);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    let path = String::from_utf8_lossy(&out).into_owned();
    match path.strip_suffix(" (deleted)") {
        Some(stripped) => (PathBuf::from(stripped), true),
        None => (PathBuf::from(path), false),
    }
}

fn is_octal_escape(digits: &[u8]) -> bool {
    digits.len() == 3 && digits[0] <= b'3' && digits.iter().all(|d| (b'0'..=b'7').contains(d))
}

/// Whether two paths name the same swap area.
///
/// Paths are compared after canonicalization; block devices also match on
/// device number and files on inode.
pub fn same_device(a: &Path, b: &Path) -> bool {
    let canon_a = a.canonicalize().unwrap_or_else(|_| a.to_path_buf());
    let canon_b = b.canonicalize().unwrap_or_else(|_| b.to_path_buf());
    if canon_a == canon_b {
        return true;
    }

    match (std::fs::metadata(&canon_a), std::fs::metadata(&canon_b)) {
        (Ok(ma), Ok(mb)) => {
            let ta = ma.file_type();
            let tb = mb.file_type();
            if ta.is_block_device() && tb.is_block_device() {
                ma.rdev() == mb.rdev()
            } else if ta.is_file() && tb.is_file() {
                ma.dev() == mb.dev() && ma.ino() == mb.ino()
            } else {
                false
            }
        }
        _ => false,
    }
}
