//! On-disk swap header.
//!
//! The first page of a swap area holds a 1 KiB boot block, the version 1
//! header (version, last page, bad pages, UUID, label) and a 10 byte magic
//! string in the last bytes of the page.

use crate::config::{header_layout, KNOWN_PAGE_SIZES, MAX_LABEL_LENGTH};
use crate::error::{OpError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const MAGIC_SWAP: &[u8] = b"SWAPSPACE2";
const MAGIC_OLD: &[u8] = b"SWAP-SPACE";
const MAGIC_HIBERNATED: &[u8] = b"S1SUSPEND";

/// What the magic string says about the area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    /// Version 1 swap area, usable.
    Swap,
    /// Pre-2.2 kernel swap format.
    OldFormat,
    /// Area holds a suspend-to-disk image.
    Hibernated,
}

/// Decoded swap header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapSignature {
    pub kind: SignatureKind,
    /// Page size whose last bytes carry the magic.
    pub page_size: usize,
    pub version: u32,
    pub last_page: u32,
    pub nr_badpages: u32,
    pub uuid: Option<String>,
    pub label: Option<String>,
}

impl SwapSignature {
    /// Whether the kernel will accept the area for `swapon`.
    pub fn is_usable(&self) -> bool {
        self.kind == SignatureKind::Swap
    }
}

/// Read the swap header from a device or file.
///
/// Returns `Ok(None)` when no swap magic is found at any known page size.
pub fn read_signature(path: &Path) -> std::io::Result<Option<SwapSignature>> {
    let max_page = KNOWN_PAGE_SIZES.iter().copied().max().unwrap_or(4096);
    let mut buf = Vec::with_capacity(max_page);
    File::open(path)?
        .take(max_page as u64)
        .read_to_end(&mut buf)?;
    Ok(parse_signature(&buf))
}

/// Decode a swap header from the start of a device.
pub fn parse_signature(buf: &[u8]) -> Option<SwapSignature> {
    let system = system_page_size();
    let mut page_sizes = vec![system];
    page_sizes.extend(KNOWN_PAGE_SIZES.iter().filter(|&&ps| ps != system));

    page_sizes.into_iter().find_map(|page_size| {
        if buf.len() < page_size || page_size < header_layout::LABEL_OFFSET + MAX_LABEL_LENGTH {
            return None;
        }
        let magic = &buf[page_size - header_layout::MAGIC_LENGTH..page_size];
        let kind = if magic == MAGIC_SWAP {
            SignatureKind::Swap
        } else if magic == MAGIC_OLD {
            SignatureKind::OldFormat
        } else if magic.starts_with(MAGIC_HIBERNATED) {
            SignatureKind::Hibernated
        } else {
            return None;
        };

        Some(SwapSignature {
            kind,
            page_size,
            version: read_u32(buf, header_layout::VERSION_OFFSET),
            last_page: read_u32(buf, header_layout::LAST_PAGE_OFFSET),
            nr_badpages: read_u32(buf, header_layout::NR_BADPAGES_OFFSET),
            uuid: decode_uuid(&buf[header_layout::UUID_OFFSET..header_layout::UUID_OFFSET + 16]),
            label: decode_label(
                &buf[header_layout::LABEL_OFFSET..header_layout::LABEL_OFFSET + MAX_LABEL_LENGTH],
            ),
        })
    })
}

/// Reject labels the swap header cannot hold.
pub fn check_label(label: &str) -> Result<()> {
    let invalid = |reason: String| OpError::InvalidLabel {
        label: label.to_string(),
        reason,
    };
    if label.len() > MAX_LABEL_LENGTH {
        return Err(invalid(format!(
            "label is {} bytes, at most {} allowed",
            label.len(),
            MAX_LABEL_LENGTH
        )));
    }
    if label.contains('\0') {
        return Err(invalid("label contains a NUL byte".to_string()));
    }
    Ok(())
}

/// Reject anything that is not a hyphenated 8-4-4-4-12 hex UUID.
pub fn check_uuid(uuid: &str) -> Result<()> {
    let groups: Vec<&str> = uuid.split('-').collect();
    let lengths: Vec<usize> = groups.iter().map(|g| g.len()).collect();
    let well_formed = lengths == [8, 4, 4, 4, 12]
        && groups
            .iter()
            .all(|g| g.chars().all(|c| c.is_ascii_hexdigit()));

    if well_formed {
        Ok(())
    } else {
        Err(OpError::InvalidUuid {
            uuid: uuid.to_string(),
            reason: "expected xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx".to_string(),
        })
    }
}

fn system_page_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        size as usize
    } else {
        4096
    }
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_ne_bytes(bytes)
}

fn decode_uuid(bytes: &[u8]) -> Option<String> {
    if bytes.iter().all(|&b| b == 0) {
        return None;
    }
    let hex = hex::encode(bytes);
    Some(format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    ))
}

fn decode_label(bytes: &[u8]) -> Option<String> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    if end == 0 {
        return None;
    }
    Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
}
