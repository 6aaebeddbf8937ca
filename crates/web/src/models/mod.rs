//! Domain models for the web application.
//!
//! These are validated domain types, separate from the row structs the
//! repositories decode into.

pub mod session;
pub mod user;
pub mod workspace;

pub use session::{CurrentUser, SignInStep, keys as session_keys};
pub use user::User;
pub use workspace::{Address, Workspace, WorkspaceDetail};
