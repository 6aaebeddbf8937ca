//! Business logic layer.
//!
//! Services sit between route handlers and repositories: they normalize
//! input, call one or more repositories, log failures with context and hand
//! errors back unchanged.

pub mod auth;
pub mod code_delivery;
pub mod workspaces;

pub use auth::{AuthError, AuthService};
pub use code_delivery::{CodeDelivery, DeliveryError, TracingCodeDelivery};
pub use workspaces::{WorkspaceError, WorkspaceService};
