//! Error types for network parsing, reservation and settings rendering.
//!
//! Every failure is deterministic and propagates to the caller untouched;
//! nothing in this crate retries.

use std::net::Ipv4Addr;
use thiserror::Error;

use crate::network::{InstanceId, ReservationKind, ReservationState};

/// Result type alias for network operations.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Main error type for the network core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    // Manifest errors
    #[error("{0}")]
    NetworkInvalidProperty(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Error parsing manifest at '{path}': {reason}")]
    ManifestParse { path: String, reason: String },

    // Reservation errors
    #[error("Network '{network}' can't satisfy a {kind} reservation")]
    NetworkReservationWrongType { network: String, kind: ReservationKind },

    #[error("Reservation for network '{actual}' used against network '{expected}'")]
    NetworkReservationWrongNetwork { expected: String, actual: String },

    #[error("Can't {action} a reservation in state {state}")]
    InvalidReservationState {
        action: &'static str,
        state: ReservationState,
    },

    // Address space errors
    #[error("Network '{network}' has no more free IP addresses")]
    NetworkPoolExhausted { network: String },

    #[error("IP {ip} on network '{network}' is already held by {owner}")]
    NetworkAddressInUse {
        network: String,
        ip: Ipv4Addr,
        owner: InstanceId,
    },

    #[error("IP {ip} is not usable on network '{network}'")]
    NetworkAddressOutOfRange { network: String, ip: Ipv4Addr },

    // Plan loading and task plumbing
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NetworkError {
    /// Shorthand for an invalid manifest property.
    pub fn invalid_property(msg: impl Into<String>) -> Self {
        Self::NetworkInvalidProperty(msg.into())
    }

    /// True for errors that signal the address space can't satisfy a request.
    ///
    /// Callers surface these to plan-level retry/abort logic.
    pub fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            Self::NetworkPoolExhausted { .. } | Self::NetworkAddressInUse { .. }
        )
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
