//! Subnet data model.

use super::{int_to_ip, AddressRange, Ipv4};
use crate::error::{NetworkError, Result};
use itertools::Itertools;
use serde_json::{Map, Value};
use std::net::Ipv4Addr;

/// Opaque provider-specific properties, passed through untouched.
pub type CloudProperties = Map<String, Value>;

/// A pool descriptor inside a network.
///
/// Subnets of dynamic networks only carry `dns` and `cloud_properties`; the
/// infrastructure hands out their addresses. Manual and static networks bind
/// each subnet to a CIDR `range` with a `gateway`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Subnet {
    /// DNS servers, `None` when the manifest did not set any.
    pub dns: Option<Vec<String>>,
    /// Cloud provider properties, empty when unset.
    pub cloud_properties: CloudProperties,
    /// Address range (None for dynamic networks).
    pub range: Option<Ipv4>,
    /// Gateway inside `range`.
    pub gateway: Option<Ipv4Addr>,
    /// Addresses never handed out.
    pub reserved: Vec<AddressRange>,
    /// Addresses only static reservations may claim.
    pub static_ips: Vec<AddressRange>,
    /// Availability zone this subnet lives in.
    pub availability_zone: Option<String>,
}

impl Subnet {
    /// Build a range-free subnet from a manifest fragment.
    ///
    /// `dns` defaults to `None` and `cloud_properties` to an empty map.
    pub fn parse_dynamic(fragment: &Map<String, Value>) -> Result<Subnet> {
        Ok(Subnet {
            dns: parse_dns(fragment.get("dns"))?,
            cloud_properties: parse_cloud_properties(fragment.get("cloud_properties"))?,
            availability_zone: parse_az(fragment.get("az"))?,
            ..Default::default()
        })
    }

    /// Build a range-bound subnet for a manual or static network.
    pub fn parse_ranged(network: &str, fragment: &Map<String, Value>) -> Result<Subnet> {
        let range_str = fragment.get("range").and_then(Value::as_str).ok_or_else(|| {
            NetworkError::invalid_property(format!(
                "missing 'range' for a subnet of network '{network}'"
            ))
        })?;
        let range = Ipv4::new(range_str).map_err(|e| {
            NetworkError::invalid_property(format!(
                "invalid 'range' {range_str} on network '{network}': {e}"
            ))
        })?;

        let gateway_str = fragment
            .get("gateway")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                NetworkError::invalid_property(format!(
                    "missing 'gateway' for subnet {range} of network '{network}'"
                ))
            })?;
        let gateway = super::parse_ip(gateway_str).map_err(|e| {
            NetworkError::invalid_property(format!(
                "invalid 'gateway' on network '{network}': {e}"
            ))
        })?;
        let hosts = range.host_range();
        if !hosts.contains(u32::from(gateway)) {
            return Err(NetworkError::invalid_property(format!(
                "gateway {gateway} must be a host address inside {range} on network '{network}'"
            )));
        }

        let reserved = parse_ranges(network, &range, "reserved", fragment.get("reserved"))?;
        let static_ips = parse_ranges(network, &range, "static", fragment.get("static"))?;

        // static addresses can never also be reserved
        if let Some((s, r)) = static_ips
            .iter()
            .cartesian_product(reserved.iter())
            .find(|(s, r)| s.overlaps(r))
        {
            return Err(NetworkError::invalid_property(format!(
                "static IPs {s} overlap reserved IPs {r} on network '{network}'"
            )));
        }

        Ok(Subnet {
            dns: parse_dns(fragment.get("dns"))?,
            cloud_properties: parse_cloud_properties(fragment.get("cloud_properties"))?,
            range: Some(range),
            gateway: Some(gateway),
            reserved,
            static_ips,
            availability_zone: parse_az(fragment.get("az"))?,
        })
    }

    /// True when `ip` falls inside this subnet's range.
    pub fn contains(&self, ip: u32) -> bool {
        self.range
            .map(|r| r.contains(int_to_ip(ip)))
            .unwrap_or(false)
    }

    pub fn is_reserved(&self, ip: u32) -> bool {
        self.reserved.iter().any(|r| r.contains(ip))
    }

    pub fn is_static(&self, ip: u32) -> bool {
        self.static_ips.iter().any(|r| r.contains(ip))
    }

    /// True when `ip` may be handed to some instance at all.
    ///
    /// Excludes the network/broadcast address, the gateway and reserved
    /// ranges. Range-free subnets never restrict addresses.
    pub fn is_assignable(&self, ip: u32) -> bool {
        let Some(range) = self.range else {
            return true;
        };
        range.host_range().contains(ip)
            && self.gateway.map(u32::from) != Some(ip)
            && !self.is_reserved(ip)
    }

    /// Addresses a dynamic reservation may be given, ascending.
    pub fn dynamic_candidates(&self) -> impl Iterator<Item = u32> + '_ {
        let hosts = self.range.map(|r| r.host_range());
        hosts
            .into_iter()
            .flat_map(|h| h.first..=h.last)
            .filter(move |ip| self.is_assignable(*ip) && !self.is_static(*ip))
    }
}

/// Read an optional `dns` list.
pub(crate) fn parse_dns(value: Option<&Value>) -> Result<Option<Vec<String>>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    NetworkError::invalid_property("'dns' must be a list of strings")
                })
            })
            .collect::<Result<Vec<String>>>()
            .map(Some),
        Some(_) => Err(NetworkError::invalid_property(
            "'dns' must be a list of strings",
        )),
    }
}

/// Read optional `cloud_properties`, defaulting to an empty map.
pub(crate) fn parse_cloud_properties(value: Option<&Value>) -> Result<CloudProperties> {
    match value {
        None | Some(Value::Null) => Ok(CloudProperties::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(NetworkError::invalid_property(
            "'cloud_properties' must be a mapping",
        )),
    }
}

fn parse_az(value: Option<&Value>) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(az)) => Ok(Some(az.clone())),
        Some(_) => Err(NetworkError::invalid_property("'az' must be a string")),
    }
}

/// Read a `reserved`/`static` list; each entry must sit inside `range`.
fn parse_ranges(
    network: &str,
    range: &Ipv4,
    key: &str,
    value: Option<&Value>,
) -> Result<Vec<AddressRange>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(NetworkError::invalid_property(format!(
                "'{key}' on network '{network}' must be a list"
            )))
        }
    };

    items
        .iter()
        .map(|item| {
            let text = item.as_str().ok_or_else(|| {
                NetworkError::invalid_property(format!(
                    "'{key}' entries on network '{network}' must be strings"
                ))
            })?;
            let parsed = AddressRange::parse(text).map_err(|e| {
                NetworkError::invalid_property(format!(
                    "invalid '{key}' entry '{text}' on network '{network}': {e}"
                ))
            })?;
            if !parsed.within(range) {
                return Err(NetworkError::invalid_property(format!(
                    "'{key}' entry {parsed} is outside {range} on network '{network}'"
                )));
            }
            Ok(parsed)
        })
        .collect()
}
