//! Deployment plan input for the `director-network` binary.
//!
//! This module wires the network core to a JSON plan file:
//! - [`loader`] - reading and deserializing the plan
//! - [`allocate`] - parsing networks and reserving an address per instance

mod allocate;
mod loader;

// Re-export public types and functions
pub use allocate::{allocate, build_networks, InstanceNetwork};
pub use loader::{parse_plan, read_plan, InstanceSpec, Plan};
