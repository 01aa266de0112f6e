//! Swap area management for block devices and files.
//!
//! Creates, activates, deactivates, labels and reports the status of swap
//! areas. Loading the plugin checks that compatible versions of the external
//! utilities it relies on are installed.
//!
//! # Architecture
//!
//! ```text
//! SwapPlugin::load → locate tools → check mkswap version → operations
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use blockdev_swap::{SwapConfig, SwapPlugin};
//! use std::path::Path;
//!
//! let swap = SwapPlugin::load(SwapConfig::default()).unwrap();
//! let device = Path::new("/dev/loop0");
//!
//! swap.mkswap(device, Some("scratch"), &[]).unwrap();
//! swap.swapon(device, -1).unwrap();
//! assert!(swap.swapstatus(device));
//! swap.swapoff(device).unwrap();
//! ```

pub mod config;
pub mod deps;
pub mod error;
pub mod swap;
pub mod tools;

pub use config::{ActivationBackend, SwapConfig};
pub use deps::{check_dependencies, SwapTech, SwapTechMode};
pub use error::{LoadError, OpError, Result};
pub use swap::{ExtraArg, SwapArea, SwapPlugin, SwapSignature};
