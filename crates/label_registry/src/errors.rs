//! Error types for the label registry

use ebakus_types::{Amount, Timestamp};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Label already registered: {label} (expires at {expires_at})")]
    AlreadyRegistered { label: String, expires_at: Timestamp },

    #[error("Insufficient payment: required {required}, provided {provided}")]
    InsufficientPayment { required: Amount, provided: Amount },

    #[error("Label not found: {label}")]
    NotFound { label: String },

    #[error("Unauthorized: {caller} may not {action}")]
    Unauthorized { caller: String, action: &'static str },

    #[error("Renewal not allowed for label {label}: {reason}")]
    RenewalNotAllowed { label: String, reason: &'static str },

    #[error("Invalid registry configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported call for this interface: {method}")]
    UnsupportedCall { method: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Discriminant of [`RegistryError`] for callers that branch on the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyRegistered,
    InsufficientPayment,
    NotFound,
    Unauthorized,
    RenewalNotAllowed,
    InvalidConfig,
    UnsupportedCall,
    Serialization,
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::AlreadyRegistered { .. } => ErrorKind::AlreadyRegistered,
            RegistryError::InsufficientPayment { .. } => ErrorKind::InsufficientPayment,
            RegistryError::NotFound { .. } => ErrorKind::NotFound,
            RegistryError::Unauthorized { .. } => ErrorKind::Unauthorized,
            RegistryError::RenewalNotAllowed { .. } => ErrorKind::RenewalNotAllowed,
            RegistryError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            RegistryError::UnsupportedCall { .. } => ErrorKind::UnsupportedCall,
            RegistryError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
