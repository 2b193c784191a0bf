//! Reserving and releasing addresses on a network.
//!
//! Both operations validate everything before touching the registry, and
//! only update the reservation once the registry change succeeded, so a
//! failed call leaves no trace.

use super::registry::{Claim, Release};
use super::{Network, NetworkReservation, NetworkType, ReservationKind, ReservationState};
use crate::error::{NetworkError, Result};
use crate::logging::Logger;
use crate::models::{int_to_ip, Subnet};

impl Network {
    /// Claim an address for `reservation`.
    ///
    /// A resolved reservation claims its own `ip`. An unresolved dynamic
    /// reservation on a manual network gets the first free address, scanning
    /// subnets in manifest order. Reserving again with the same owner and
    /// address is a no-op.
    ///
    /// # Errors
    ///
    /// * `NetworkReservationWrongType` if this network can't satisfy the kind
    /// * `NetworkAddressOutOfRange` if the address isn't usable here, or sits
    ///   outside the reservation's availability zone
    /// * `NetworkAddressInUse` if another owner holds the address
    /// * `NetworkPoolExhausted` if no free address is left
    /// * `InvalidReservationState` for released reservations, or unresolved
    ///   ones on a dynamic network
    pub fn reserve(&self, reservation: &mut NetworkReservation, logger: &Logger) -> Result<()> {
        self.check_reservation(reservation)?;
        if reservation.state() == ReservationState::Released {
            return Err(NetworkError::InvalidReservationState {
                action: "reserve",
                state: reservation.state(),
            });
        }
        let zone_subnets = self.subnets_in_zone(reservation)?;

        let mut registry = self.registry();
        let ip = match reservation.ip() {
            Some(ip) => {
                self.check_address(reservation.kind(), ip)?;
                if self.network_type.is_range_bound()
                    && !zone_subnets.iter().any(|s| s.contains(ip))
                {
                    return Err(self.out_of_range(ip));
                }
                ip
            }
            None if self.network_type == NetworkType::Manual => registry
                .first_free(zone_subnets.into_iter().flat_map(Subnet::dynamic_candidates))
                .ok_or_else(|| NetworkError::NetworkPoolExhausted {
                    network: self.name.clone(),
                })?,
            None => {
                return Err(NetworkError::InvalidReservationState {
                    action: "reserve",
                    state: reservation.state(),
                })
            }
        };

        match registry.claim(&self.name, ip, reservation.owner())? {
            Claim::Claimed => logger.info(format_args!(
                "reserved {} for {} on network '{}'",
                int_to_ip(ip),
                reservation.owner(),
                self.name
            )),
            Claim::AlreadyHeld => logger.debug(format_args!(
                "{} already holds {} on network '{}'",
                reservation.owner(),
                int_to_ip(ip),
                self.name
            )),
        }
        drop(registry);

        reservation.mark_reserved(ip);
        Ok(())
    }

    /// Give the reservation's address back.
    ///
    /// Only a `Reserved` reservation frees its address; any other state just
    /// moves to `Released`. Releasing an address that isn't held, or is held
    /// by someone else, changes nothing and is not an error.
    ///
    /// # Errors
    ///
    /// Returns `NetworkReservationWrongType` if this network can't satisfy
    /// the reservation's kind.
    pub fn release(&self, reservation: &mut NetworkReservation, logger: &Logger) -> Result<()> {
        self.check_reservation(reservation)?;

        match (reservation.state(), reservation.ip()) {
            (ReservationState::Reserved, Some(ip)) => {
                let outcome = self.registry().release(ip, reservation.owner());
                match outcome {
                    Release::Released => logger.info(format_args!(
                        "released {} from {} on network '{}'",
                        int_to_ip(ip),
                        reservation.owner(),
                        self.name
                    )),
                    Release::NotHeld => logger.debug(format_args!(
                        "{} was not held on network '{}'",
                        int_to_ip(ip),
                        self.name
                    )),
                    Release::HeldByOther(holder) => logger.warn(format_args!(
                        "{} tried to release {} on network '{}' but it is held by {}",
                        reservation.owner(),
                        int_to_ip(ip),
                        self.name,
                        holder
                    )),
                }
            }
            (state, _) => logger.debug(format_args!(
                "{} is {state}, nothing to release on network '{}'",
                reservation.owner(),
                self.name
            )),
        }

        reservation.mark_released();
        Ok(())
    }

    /// Reject reservations this network can't serve.
    pub(super) fn check_reservation(&self, reservation: &NetworkReservation) -> Result<()> {
        if !self.network_type.supports(reservation.kind()) {
            return Err(NetworkError::NetworkReservationWrongType {
                network: self.name.clone(),
                kind: reservation.kind(),
            });
        }
        if reservation.network() != self.name {
            return Err(NetworkError::NetworkReservationWrongNetwork {
                expected: self.name.clone(),
                actual: reservation.network().to_string(),
            });
        }
        Ok(())
    }

    /// The subnet a reservation resolves against.
    ///
    /// Range-bound networks use the subnet containing the address. Dynamic
    /// networks use the first subnet in the reservation's availability zone.
    pub(super) fn subnet_for(&self, reservation: &NetworkReservation) -> Result<&Subnet> {
        if self.network_type.is_range_bound() {
            let ip = reservation
                .ip()
                .ok_or(NetworkError::InvalidReservationState {
                    action: "resolve a subnet for",
                    state: reservation.state(),
                })?;
            return self
                .subnet_containing(ip)
                .ok_or_else(|| self.out_of_range(ip));
        }

        self.subnets_in_zone(reservation)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                NetworkError::invalid_property(format!("network '{}' has no subnets", self.name))
            })
    }

    /// Subnets a reservation may use, in manifest order.
    ///
    /// When the reservation names an availability zone and the subnets are
    /// zoned, only subnets in that zone qualify; otherwise all of them do.
    fn subnets_in_zone(&self, reservation: &NetworkReservation) -> Result<Vec<&Subnet>> {
        let zoned = self.subnets.iter().any(|s| s.availability_zone.is_some());
        match reservation.availability_zone() {
            Some(az) if zoned => {
                let matching: Vec<&Subnet> = self
                    .subnets
                    .iter()
                    .filter(|s| s.availability_zone.as_deref() == Some(az))
                    .collect();
                if matching.is_empty() {
                    return Err(NetworkError::invalid_property(format!(
                        "network '{}' has no subnet in availability zone '{az}'",
                        self.name
                    )));
                }
                Ok(matching)
            }
            _ => Ok(self.subnets.iter().collect()),
        }
    }

    /// Validate a known address against the subnet rules for `kind`.
    ///
    /// Static reservations must use the `static` ranges; dynamic ones must
    /// stay out of them. Range-free networks accept any address.
    fn check_address(&self, kind: ReservationKind, ip: u32) -> Result<()> {
        if !self.network_type.is_range_bound() {
            return Ok(());
        }
        let subnet = self
            .subnet_containing(ip)
            .ok_or_else(|| self.out_of_range(ip))?;
        let usable = subnet.is_assignable(ip)
            && match kind {
                ReservationKind::Static => subnet.is_static(ip),
                ReservationKind::Dynamic => !subnet.is_static(ip),
            };
        if usable {
            Ok(())
        } else {
            Err(self.out_of_range(ip))
        }
    }

    fn out_of_range(&self, ip: u32) -> NetworkError {
        NetworkError::NetworkAddressOutOfRange {
            network: self.name.clone(),
            ip: int_to_ip(ip),
        }
    }
}
