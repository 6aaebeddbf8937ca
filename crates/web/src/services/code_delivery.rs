//! Delivery of one-time sign-in codes.

use thiserror::Error;

use tidi_core::Email;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct DeliveryError(pub String);

/// Sends a freshly issued sign-in code to its owner.
pub trait CodeDelivery: Send + Sync {
    /// # Errors
    ///
    /// Returns `DeliveryError` if the code could not be handed off.
    fn deliver(&self, email: &Email, code: &str) -> Result<(), DeliveryError>;
}

/// Writes codes to the log. Used until an email provider is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCodeDelivery;

impl CodeDelivery for TracingCodeDelivery {
    fn deliver(&self, email: &Email, code: &str) -> Result<(), DeliveryError> {
        tracing::info!(email = %email, "sign-in code issued");
        tracing::debug!(email = %email, code, "sign-in code value");
        Ok(())
    }
}
