//! Core domain of GoldenTab: bookmark-backed workspaces for browser windows.
//!
//! The host browser is reached only through the traits in [`bookmark`],
//! [`tab`] and [`storage`]; adapters live in `goldentab-infrastructure`.

pub mod bookmark;
pub mod config;
pub mod error;
pub mod filter;
pub mod housekeeping;
pub mod metadata;
pub mod storage;
pub mod tab;
pub mod url;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{GoldenTabError, Result};
