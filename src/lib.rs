//! Library crate for account-users.
//!
//! This crate exposes the building blocks of the TUI:
//! - Application state, input handling and event loop (`app`)
//! - Command-line configuration (`config`)
//! - Error and result types (`error`)
//! - Paging, search and selection state (`list`)
//! - Remote user source and background loading (`remote`)
//! - In-memory search helpers (`search`)
//! - UI rendering and widgets (`ui`)
//!
//! It is used by the `account-users` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod app;
pub mod config;
pub mod error;
pub mod list;
pub mod remote;
pub mod search;
pub mod ui;

// Re-export commonly used items at the crate root for convenience
/// Convenient error and result types shared across the crate.
pub use error::{DynError, Result};
