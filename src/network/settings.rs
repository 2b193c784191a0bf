//! Per-instance network settings handed to the VM agent.
//!
//! The serialized form is a wire contract with deployed agents: field names,
//! field order and the absence (not `null`) of unset optional fields must not
//! change.

use super::{Network, NetworkReservation, NetworkType};
use crate::config;
use crate::error::Result;
use crate::models::CloudProperties;
use serde::Serialize;
use serde_json::Value;
use std::net::Ipv4Addr;

/// Rendered settings for one network of one instance.
///
/// Dynamic networks render as
/// `{"type":"dynamic","cloud_properties":{..},"dns":[..],"default":[..]}`
/// with `dns` only present when the subnet has DNS servers. Manual and static
/// networks add `ip`, `netmask` and `gateway`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkSettings {
    #[serde(rename = "type")]
    pub network_type: NetworkType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netmask: Option<Ipv4Addr>,
    pub cloud_properties: CloudProperties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<Vec<String>>,
    pub default: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<Ipv4Addr>,
}

impl NetworkSettings {
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Network {
    /// Render the agent settings for `reservation`.
    ///
    /// `default_properties` names the settings categories this network
    /// supplies defaults for and is passed through verbatim.
    ///
    /// # Errors
    ///
    /// Returns `NetworkReservationWrongType` if this network can't satisfy
    /// the reservation's kind, or `InvalidReservationState` if a range-bound
    /// network is asked to render an unresolved reservation.
    pub fn network_settings(
        &self,
        reservation: &NetworkReservation,
        default_properties: &[&str],
    ) -> Result<NetworkSettings> {
        self.check_reservation(reservation)?;
        let subnet = self.subnet_for(reservation)?;

        let (ip, netmask) = if self.network_type.is_range_bound() {
            (reservation.ip_addr(), subnet.range.map(|r| r.netmask()))
        } else {
            (None, None)
        };

        Ok(NetworkSettings {
            network_type: self.network_type,
            ip,
            netmask,
            cloud_properties: subnet.cloud_properties.clone(),
            dns: subnet.dns.clone(),
            default: default_properties.iter().map(|p| p.to_string()).collect(),
            gateway: subnet.gateway,
        })
    }

    /// [`Network::network_settings`] with the default `["dns", "gateway"]`.
    pub fn network_settings_with_defaults(
        &self,
        reservation: &NetworkReservation,
    ) -> Result<NetworkSettings> {
        self.network_settings(reservation, &config::DEFAULT_PROPERTIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;
    use crate::logging::Logger;
    use crate::models::ip_to_int;
    use crate::network::InstanceId;
    use serde_json::json;

    fn logger() -> Logger {
        Logger::new("TestLogger")
    }

    fn dynamic_network(fragment: Value) -> Network {
        Network::parse(NetworkType::Dynamic, &fragment, &logger()).unwrap()
    }

    fn resolved(network: &str) -> NetworkReservation {
        let mut reservation = NetworkReservation::dynamic(InstanceId::new("vm1"), network);
        reservation.resolve_ip(4294967295).unwrap();
        reservation
    }

    #[test]
    fn test_dynamic_settings_with_empty_defaults() {
        let network = dynamic_network(json!({"name": "foo", "cloud_properties": {"foz": "baz"}}));
        let settings = network.network_settings(&resolved("foo"), &[]).unwrap();
        assert_eq!(
            settings.to_value().unwrap(),
            json!({
                "type": "dynamic",
                "cloud_properties": {"foz": "baz"},
                "default": [],
            })
        );
    }

    #[test]
    fn test_dynamic_settings_sets_the_defaults() {
        let network = dynamic_network(json!({"name": "foo", "cloud_properties": {"foz": "baz"}}));
        let settings = network
            .network_settings_with_defaults(&resolved("foo"))
            .unwrap();
        assert_eq!(
            settings.to_value().unwrap(),
            json!({
                "type": "dynamic",
                "cloud_properties": {"foz": "baz"},
                "default": ["dns", "gateway"],
            })
        );
    }

    #[test]
    fn test_dynamic_settings_wire_format() {
        let network = dynamic_network(json!({
            "name": "foo",
            "dns": ["1.2.3.4"],
            "cloud_properties": {"b": 1, "a": 2},
        }));
        let json = network
            .network_settings_with_defaults(&resolved("foo"))
            .unwrap()
            .to_json()
            .unwrap();
        assert_eq!(
            json,
            r#"{"type":"dynamic","cloud_properties":{"a":2,"b":1},"dns":["1.2.3.4"],"default":["dns","gateway"]}"#
        );
    }

    #[test]
    fn test_settings_fail_for_static_reservation() {
        let network = dynamic_network(json!({"name": "foo", "cloud_properties": {"foz": "baz"}}));
        let reservation = NetworkReservation::static_ip(InstanceId::new("vm1"), "foo", 1);
        assert!(matches!(
            network.network_settings_with_defaults(&reservation),
            Err(NetworkError::NetworkReservationWrongType { .. })
        ));
    }

    #[test]
    fn test_manual_settings() {
        let network = Network::parse(
            NetworkType::Manual,
            &json!({
                "name": "private",
                "subnets": [{
                    "range": "10.0.0.0/24",
                    "gateway": "10.0.0.1",
                    "dns": ["10.0.0.2"],
                    "cloud_properties": {"subnet": "subnet-1"},
                }],
            }),
            &logger(),
        )
        .unwrap();

        let mut reservation = NetworkReservation::dynamic(InstanceId::new("vm1"), "private");
        assert!(matches!(
            network.network_settings_with_defaults(&reservation),
            Err(NetworkError::InvalidReservationState { .. })
        ));

        network.reserve(&mut reservation, &logger()).unwrap();
        assert_eq!(reservation.ip(), Some(ip_to_int("10.0.0.2").unwrap()));
        let json = network
            .network_settings(&reservation, &["dns"])
            .unwrap()
            .to_json()
            .unwrap();
        assert_eq!(
            json,
            r#"{"type":"manual","ip":"10.0.0.2","netmask":"255.255.255.0","cloud_properties":{"subnet":"subnet-1"},"dns":["10.0.0.2"],"default":["dns"],"gateway":"10.0.0.1"}"#
        );
    }
}
