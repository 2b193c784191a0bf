//! Network reservation core for a deployment director.
//!
//! Parses network definitions out of a deployment manifest, hands out
//! addresses to instances without double-booking, and renders the network
//! settings each instance's agent receives.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod network;
pub mod output;
pub mod plan;

pub use error::{NetworkError, Result};
pub use logging::Logger;
pub use network::{
    InstanceId, Network, NetworkReservation, NetworkSettings, NetworkType, ReservationKind,
    ReservationState,
};
