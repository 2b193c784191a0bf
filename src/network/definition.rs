//! Network definitions and manifest parsing.
//!
//! A manifest network fragment looks like:
//!
//! ```json
//! {"name": "foo", "dns": ["1.2.3.4"], "cloud_properties": {"foz": "baz"}}
//! {"name": "foo", "subnets": [{"dns": ["1.2.3.4"], "cloud_properties": {}}]}
//! ```
//!
//! Dynamic networks accept either shape but never both at once. Manual and
//! static networks always list range-bound subnets.

use super::registry::AddressRegistry;
use super::ReservationKind;
use crate::config;
use crate::error::{NetworkError, Result};
use crate::logging::Logger;
use crate::models::Subnet;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// How a network hands out addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// The infrastructure assigns addresses; subnets carry no range.
    Dynamic,
    /// Every instance names its address from the `static` lists.
    Static,
    /// The director allocates addresses from subnet ranges.
    Manual,
}

impl NetworkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Dynamic => "dynamic",
            NetworkType::Static => "static",
            NetworkType::Manual => "manual",
        }
    }

    /// Whether reservations of `kind` can be satisfied by this network type.
    pub fn supports(&self, kind: ReservationKind) -> bool {
        matches!(
            (self, kind),
            (NetworkType::Dynamic, ReservationKind::Dynamic)
                | (NetworkType::Static, ReservationKind::Static)
                | (NetworkType::Manual, _)
        )
    }

    /// True when subnets carry a CIDR range and gateway.
    pub fn is_range_bound(&self) -> bool {
        !matches!(self, NetworkType::Dynamic)
    }
}

impl FromStr for NetworkType {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dynamic" => Ok(NetworkType::Dynamic),
            "static" => Ok(NetworkType::Static),
            "manual" => Ok(NetworkType::Manual),
            other => Err(NetworkError::invalid_property(format!(
                "unknown network type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, typed set of subnets plus the addresses currently held on it.
///
/// Everything but the registry is immutable after parsing. Share it across
/// threads with `Arc<Network>`; reserve/release serialize on the registry lock.
#[derive(Debug)]
pub struct Network {
    pub(super) name: String,
    pub(super) network_type: NetworkType,
    pub(super) subnets: Vec<Subnet>,
    pub(super) registry: Mutex<AddressRegistry>,
}

impl Network {
    /// Parse a manifest fragment into a network of the given type.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::NetworkInvalidProperty` naming the offending
    /// field when the fragment has the wrong shape.
    pub fn parse(network_type: NetworkType, fragment: &Value, logger: &Logger) -> Result<Network> {
        let spec = fragment
            .as_object()
            .ok_or_else(|| NetworkError::invalid_property("network spec must be a mapping"))?;
        let name = spec
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| NetworkError::invalid_property("missing or invalid 'name'"))?;

        let subnets = match network_type {
            NetworkType::Dynamic => parse_dynamic_subnets(name, spec)?,
            NetworkType::Manual | NetworkType::Static => parse_ranged_subnets(name, spec)?,
        };

        if network_type == NetworkType::Static && subnets.iter().all(|s| s.static_ips.is_empty()) {
            return Err(NetworkError::invalid_property(format!(
                "static network '{name}' declares no 'static' IPs"
            )));
        }

        logger.debug(format_args!(
            "parsed {network_type} network '{name}' with {} subnet(s)",
            subnets.len()
        ));

        Ok(Network::new(name, network_type, subnets))
    }

    /// Parse a fragment whose type comes from its own `type` key.
    ///
    /// Fragments without a `type` are manual networks.
    pub fn from_manifest(fragment: &Value, logger: &Logger) -> Result<Network> {
        let network_type = match fragment.get("type") {
            None | Some(Value::Null) => config::DEFAULT_NETWORK_TYPE.parse()?,
            Some(Value::String(t)) => t.parse()?,
            Some(_) => return Err(NetworkError::invalid_property("'type' must be a string")),
        };
        Network::parse(network_type, fragment, logger)
    }

    fn new(name: &str, network_type: NetworkType, subnets: Vec<Subnet>) -> Network {
        Network {
            name: name.to_string(),
            network_type,
            subnets,
            registry: Mutex::new(AddressRegistry::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn network_type(&self) -> NetworkType {
        self.network_type
    }

    /// Subnets in manifest order.
    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    /// Snapshot of held addresses, ascending.
    pub fn held_addresses(&self) -> Vec<u32> {
        self.registry().held().map(|(ip, _)| ip).collect()
    }

    pub fn is_held(&self, ip: u32) -> bool {
        self.registry().is_held(ip)
    }

    /// First range-bound subnet containing `ip`.
    pub fn subnet_containing(&self, ip: u32) -> Option<&Subnet> {
        self.subnets.iter().find(|s| s.contains(ip))
    }

    /// Lock the registry. It is never left half-updated, so poisoning is ignored.
    pub(super) fn registry(&self) -> MutexGuard<'_, AddressRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({} subnets, {} held)",
            self.name,
            self.network_type,
            self.subnets.len(),
            self.registry().len()
        )
    }
}

/// Subnets of a dynamic network.
///
/// Without `subnets` the top-level `dns`/`cloud_properties` become the single
/// implicit subnet; with `subnets` neither may appear at the top level.
fn parse_dynamic_subnets(name: &str, spec: &Map<String, Value>) -> Result<Vec<Subnet>> {
    match spec.get("subnets") {
        None => Ok(vec![Subnet::parse_dynamic(spec)?]),
        Some(subnets) => {
            if spec.contains_key("dns") {
                return Err(NetworkError::invalid_property(
                    "top-level 'dns' invalid when specifying subnets",
                ));
            }
            if spec.contains_key("cloud_properties") {
                return Err(NetworkError::invalid_property(
                    "top-level 'cloud_properties' invalid when specifying subnets",
                ));
            }
            subnet_fragments(name, subnets)?
                .into_iter()
                .map(Subnet::parse_dynamic)
                .collect()
        }
    }
}

/// Subnets of a manual or static network; `subnets` is mandatory.
fn parse_ranged_subnets(name: &str, spec: &Map<String, Value>) -> Result<Vec<Subnet>> {
    let subnets = spec.get("subnets").ok_or_else(|| {
        NetworkError::invalid_property(format!("missing 'subnets' for network '{name}'"))
    })?;
    let subnets = subnet_fragments(name, subnets)?
        .into_iter()
        .map(|fragment| Subnet::parse_ranged(name, fragment))
        .collect::<Result<Vec<Subnet>>>()?;

    for (i, a) in subnets.iter().enumerate() {
        for b in &subnets[i + 1..] {
            if let (Some(ra), Some(rb)) = (a.range, b.range) {
                if ra.host_range().overlaps(&rb.host_range()) {
                    return Err(NetworkError::invalid_property(format!(
                        "subnet {ra} overlaps subnet {rb} on network '{name}'"
                    )));
                }
            }
        }
    }
    Ok(subnets)
}

/// `subnets` must be a non-empty list of mappings.
fn subnet_fragments<'a>(name: &str, subnets: &'a Value) -> Result<Vec<&'a Map<String, Value>>> {
    let list = subnets
        .as_array()
        .filter(|list| !list.is_empty())
        .ok_or_else(|| {
            NetworkError::invalid_property(format!(
                "'subnets' for network '{name}' must be a non-empty list"
            ))
        })?;
    list.iter()
        .map(|subnet| {
            subnet.as_object().ok_or_else(|| {
                NetworkError::invalid_property(format!(
                    "each subnet of network '{name}' must be a mapping"
                ))
            })
        })
        .collect()
}
