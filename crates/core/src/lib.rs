//! Tidi Core - Shared types library.
//!
//! This crate provides the types used across all Tidi components:
//! - `web` - HTTP application (workspaces, proposals, sign-in)
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. This keeps it lightweight and lets the selection pickers
//! and the workspace input normalization be tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, slugs and money
//! - [`workspace`] - Workspace identifiers and update payload normalization
//! - [`selection`] - Generic multi-select picker with quantities and totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod selection;
pub mod types;
pub mod workspace;

pub use types::*;
pub use workspace::WorkspaceRef;
