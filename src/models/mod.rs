//! Domain models for network configuration.
//!
//! This module contains the leaf data structures the networks are built from:
//! - [`Ipv4`] and [`AddressRange`] - CIDR and inclusive address ranges
//! - [`Subnet`] - a pool of DNS and cloud properties, optionally range-bound

mod ipv4;
mod subnet;

// Re-export public types
pub use ipv4::{int_to_ip, ip_to_int, parse_ip, AddressRange, Ipv4};
pub(crate) use subnet::{parse_cloud_properties, parse_dns};
pub use subnet::{CloudProperties, Subnet};
