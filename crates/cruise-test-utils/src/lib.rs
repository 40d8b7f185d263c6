//! Shared test fixtures for the cruise workspace.
//!
//! Dev-dependency only, never published. Fixtures are plain markup strings
//! so this crate does not depend on the crates it helps to test.
//!
//! # Modules
//!
//! - [`fixtures`]: complete documents at the current and historical versions
//! - [`builders`]: small builders for pipeline markup
//! - [`workspace`]: [`TestWorkspace`](workspace::TestWorkspace), a temporary
//!   directory holding a config file, key files and settings

pub mod builders;
pub mod fixtures;
pub mod workspace;

/// Schema version written by the current codec.
pub const CURRENT_VERSION: u32 = 139;
