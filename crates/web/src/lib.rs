//! Tidi web application library.
//!
//! Workspaces, the proposal pickers and sign-in, served by the `tidi-web`
//! binary. Exposed as a library so the CLI and integration tests can reuse
//! the repositories, services and migrations.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
