//! Networks, reservations and rendered settings.
//!
//! This module contains the network core:
//! - [`definition`] - network types and manifest parsing
//! - [`reservation`] - the reservation state machine
//! - [`registry`] - held-address bookkeeping per network
//! - [`allocation`] - reserve/release
//! - [`settings`] - agent network settings

mod allocation;
mod definition;
mod registry;
mod reservation;
mod settings;

// Re-export public types
pub use definition::{Network, NetworkType};
pub use registry::{AddressRegistry, Claim, Release};
pub use reservation::{InstanceId, NetworkReservation, ReservationKind, ReservationState};
pub use settings::NetworkSettings;
