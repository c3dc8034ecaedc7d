//! Common utilities and types shared across FolderSync crates.
//!
//! This module provides the error type and the small path-level types that
//! both the synchronization engine and the command line tool build on.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{EntryName, SyncPair};
