//! IPv4 address and CIDR notation utilities.
//!
//! Provides [`Ipv4`] for subnet ranges written as `10.0.0.0/24`, and
//! [`AddressRange`] for the inclusive `reserved`/`static` lists written as
//! `10.0.0.10 - 10.0.0.20`. Addresses held by reservations are plain `u32`.

use crate::error::{NetworkError, Result};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Longest IPv4 prefix length.
const MAX_LENGTH: u8 = 32;

/// Mask for a prefix length already known to be <= 32.
fn mask_bits(len: u8) -> u32 {
    let right_len = MAX_LENGTH - len.min(MAX_LENGTH);
    let all_bits = u32::MAX as u64;
    ((all_bits >> right_len) << right_len) as u32
}

/// Parse a dotted-quad address into its integer form.
///
/// # Examples
/// ```
/// use director_network::models::ip_to_int;
/// assert_eq!(ip_to_int("0.0.0.1").unwrap(), 1);
/// assert_eq!(ip_to_int("255.255.255.255").unwrap(), 4294967295);
/// ```
pub fn ip_to_int(ip: &str) -> Result<u32> {
    parse_ip(ip).map(u32::from)
}

/// Render an integer address as dotted-quad.
pub fn int_to_ip(ip: u32) -> Ipv4Addr {
    Ipv4Addr::from(ip)
}

/// Parse a dotted-quad address, trimming surrounding whitespace.
pub fn parse_ip(ip: &str) -> Result<Ipv4Addr> {
    Ipv4Addr::from_str(ip.trim())
        .map_err(|_| NetworkError::InvalidAddress(format!("invalid IP address: {ip}")))
}

/// IPv4 address with CIDR notation support.
#[derive(Eq, PartialEq, Debug, Copy, Clone, Hash)]
pub struct Ipv4 {
    /// The IPv4 address.
    pub addr: Ipv4Addr,
    /// The subnet mask length (0-32).
    pub mask: u8,
}

impl Ipv4 {
    /// Create a new [`Ipv4`] from a CIDR string (e.g., "10.0.0.0/24").
    pub fn new(addr_cidr: &str) -> Result<Ipv4> {
        let addr_cidr = addr_cidr.trim();
        let (addr, mask) = addr_cidr.split_once('/').ok_or_else(|| {
            NetworkError::InvalidAddress(format!("invalid CIDR format: {addr_cidr}"))
        })?;
        let addr = parse_ip(addr)?;
        let mask: u8 = mask
            .trim()
            .parse()
            .map_err(|_| NetworkError::InvalidAddress(format!("invalid subnet mask: {mask}")))?;
        if mask > MAX_LENGTH {
            return Err(NetworkError::InvalidAddress(format!(
                "network length /{mask} is too long"
            )));
        }
        Ok(Ipv4 { addr, mask })
    }

    /// Get the highest (broadcast) address in the subnet.
    pub fn hi(&self) -> Ipv4Addr {
        let mask = mask_bits(self.mask);
        Ipv4Addr::from((u32::from(self.addr) & mask) | !mask)
    }

    /// Get the lowest (network) address in the subnet.
    pub fn lo(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.addr) & mask_bits(self.mask))
    }

    /// The subnet mask in dotted-quad form, e.g. `255.255.255.0`.
    pub fn netmask(&self) -> Ipv4Addr {
        Ipv4Addr::from(mask_bits(self.mask))
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        ip >= self.lo() && ip <= self.hi()
    }

    /// Addresses usable by hosts: everything but the network and broadcast address.
    ///
    /// /31 and /32 have no room for either, so every address is usable.
    pub fn host_range(&self) -> AddressRange {
        let lo = u32::from(self.lo());
        let hi = u32::from(self.hi());
        if self.mask >= MAX_LENGTH - 1 {
            AddressRange::new(lo, hi)
        } else {
            AddressRange::new(lo + 1, hi - 1)
        }
    }
}

impl std::fmt::Display for Ipv4 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

/// Inclusive range of addresses, `first..=last`.
#[derive(Eq, PartialEq, Debug, Copy, Clone, Hash)]
pub struct AddressRange {
    pub first: u32,
    pub last: u32,
}

impl AddressRange {
    /// Create a range, swapping the bounds if given backwards.
    pub fn new(first: u32, last: u32) -> Self {
        AddressRange {
            first: first.min(last),
            last: first.max(last),
        }
    }

    /// Parse `"10.0.0.5"` or `"10.0.0.5 - 10.0.0.9"`.
    pub fn parse(input: &str) -> Result<AddressRange> {
        match input.split_once('-') {
            Some((first, last)) => Ok(AddressRange::new(ip_to_int(first)?, ip_to_int(last)?)),
            None => {
                let ip = ip_to_int(input)?;
                Ok(AddressRange::new(ip, ip))
            }
        }
    }

    pub fn contains(&self, ip: u32) -> bool {
        ip >= self.first && ip <= self.last
    }

    pub fn overlaps(&self, other: &AddressRange) -> bool {
        self.first <= other.last && other.first <= self.last
    }

    /// True when the whole range sits inside `cidr`.
    pub fn within(&self, cidr: &Ipv4) -> bool {
        cidr.contains(int_to_ip(self.first)) && cidr.contains(int_to_ip(self.last))
    }
}

impl std::fmt::Display for AddressRange {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.first == self.last {
            write!(f, "{}", int_to_ip(self.first))
        } else {
            write!(f, "{} - {}", int_to_ip(self.first), int_to_ip(self.last))
        }
    }
}
