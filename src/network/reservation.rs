//! Network reservations: a request for an address on one network.
//!
//! One struct covers both kinds. A dynamic reservation asks for any free
//! address and only gets an `ip` once resolved or reserved. A static
//! reservation names its address up front.

use crate::error::{NetworkError, Result};
use crate::models::int_to_ip;
use std::fmt;
use std::net::Ipv4Addr;

/// Opaque handle identifying the instance that owns a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        InstanceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of address a reservation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationKind {
    /// Any free address.
    Dynamic,
    /// One exact address.
    Static,
}

impl fmt::Display for ReservationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationKind::Dynamic => write!(f, "dynamic"),
            ReservationKind::Static => write!(f, "static"),
        }
    }
}

/// Lifecycle of a reservation.
///
/// `Unresolved -> Resolved -> Reserved -> Released`. Static reservations
/// start out `Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationState {
    Unresolved,
    Resolved,
    Reserved,
    Released,
}

impl fmt::Display for ReservationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            ReservationState::Unresolved => "unresolved",
            ReservationState::Resolved => "resolved",
            ReservationState::Reserved => "reserved",
            ReservationState::Released => "released",
        };
        write!(f, "{state}")
    }
}

/// A request-and-grant record binding an instance to an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkReservation {
    owner: InstanceId,
    network: String,
    kind: ReservationKind,
    ip: Option<u32>,
    state: ReservationState,
    availability_zone: Option<String>,
}

impl NetworkReservation {
    /// A dynamic reservation with no address yet.
    pub fn dynamic(owner: InstanceId, network: impl Into<String>) -> Self {
        NetworkReservation {
            owner,
            network: network.into(),
            kind: ReservationKind::Dynamic,
            ip: None,
            state: ReservationState::Unresolved,
            availability_zone: None,
        }
    }

    /// A static reservation for `ip`, already resolved.
    pub fn static_ip(owner: InstanceId, network: impl Into<String>, ip: u32) -> Self {
        NetworkReservation {
            owner,
            network: network.into(),
            kind: ReservationKind::Static,
            ip: Some(ip),
            state: ReservationState::Resolved,
            availability_zone: None,
        }
    }

    /// Pin the reservation to subnets in `az`.
    pub fn with_availability_zone(mut self, az: impl Into<String>) -> Self {
        self.availability_zone = Some(az.into());
        self
    }

    pub fn owner(&self) -> &InstanceId {
        &self.owner
    }

    /// Name of the network this reservation targets.
    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn kind(&self) -> ReservationKind {
        self.kind
    }

    pub fn ip(&self) -> Option<u32> {
        self.ip
    }

    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.ip.map(int_to_ip)
    }

    pub fn state(&self) -> ReservationState {
        self.state
    }

    pub fn availability_zone(&self) -> Option<&str> {
        self.availability_zone.as_deref()
    }

    pub fn is_reserved(&self) -> bool {
        self.state == ReservationState::Reserved
    }

    /// Pre-seed a dynamic reservation with a known address.
    ///
    /// Touches no registry; the address is only claimed by a later
    /// `Network::reserve`. Used by recovery flows that already know which
    /// address an instance has.
    pub fn resolve_ip(&mut self, ip: u32) -> Result<()> {
        match (self.kind, self.state) {
            (ReservationKind::Dynamic, ReservationState::Unresolved | ReservationState::Resolved) => {
                self.ip = Some(ip);
                self.state = ReservationState::Resolved;
                Ok(())
            }
            _ => Err(NetworkError::InvalidReservationState {
                action: "resolve",
                state: self.state,
            }),
        }
    }

    pub(crate) fn mark_reserved(&mut self, ip: u32) {
        self.ip = Some(ip);
        self.state = ReservationState::Reserved;
    }

    pub(crate) fn mark_released(&mut self) {
        self.state = ReservationState::Released;
    }
}

impl fmt::Display for NetworkReservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reservation for {} on '{}'",
            self.kind, self.owner, self.network
        )?;
        if let Some(ip) = self.ip_addr() {
            write!(f, " ({ip})")?;
        }
        Ok(())
    }
}
