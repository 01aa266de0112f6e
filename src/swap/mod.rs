//! Swap area management.
//!
//! This module handles:
//! - Formatting, labelling and activating swap areas
//! - Reading the on-disk swap header
//! - Querying the kernel's active swap table

mod backend;
mod operations;
mod signature;
mod status;

pub use backend::{
    classify_swapoff_errno, classify_swapon_errno, create_backend, swap_flags, KernelBackend,
    SwapBackend, UtilityBackend,
};
pub use operations::{ExtraArg, PluginInfo, SwapPlugin};
pub use signature::{
    check_label, check_uuid, parse_signature, read_signature, SignatureKind, SwapSignature,
};
pub use status::{parse_proc_swaps, same_device, StatusOracle, SwapArea};
