//! Parsing plan networks and reserving addresses for plan instances.
//!
//! Every instance is reserved in its own tokio task against a shared
//! `Arc<Network>`, so instances on the same network race for addresses the
//! way concurrent deployments do.

use super::{InstanceSpec, Plan};
use crate::error::{NetworkError, Result};
use crate::logging::Logger;
use crate::models::ip_to_int;
use crate::network::{
    InstanceId, Network, NetworkReservation, NetworkSettings, NetworkType, ReservationState,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// An instance's reservation and the settings rendered for it.
#[derive(Debug, Clone)]
pub struct InstanceNetwork {
    pub instance: InstanceId,
    pub reservation: NetworkReservation,
    pub settings: NetworkSettings,
}

/// Parse every network in the plan, keyed by name.
///
/// # Errors
/// Any parse error, or `NetworkInvalidProperty` for a duplicate name.
pub fn build_networks(plan: &Plan, logger: &Logger) -> Result<BTreeMap<String, Arc<Network>>> {
    let mut networks = BTreeMap::new();
    for fragment in &plan.networks {
        let network = Network::from_manifest(fragment, logger)?;
        let name = network.name().to_string();
        if networks.insert(name.clone(), Arc::new(network)).is_some() {
            return Err(NetworkError::invalid_property(format!(
                "duplicate network name '{name}'"
            )));
        }
    }
    logger.info(format_args!("parsed {} network(s)", networks.len()));
    Ok(networks)
}

/// Reserve an address for every instance concurrently.
///
/// Results come back in instance order. If any reservation fails, the ones
/// that succeeded are released again and the first error is returned.
pub async fn allocate(
    networks: &BTreeMap<String, Arc<Network>>,
    instances: &[InstanceSpec],
    logger: &Logger,
) -> Result<Vec<InstanceNetwork>> {
    // every network must resolve before any task is spawned
    let targets = instances
        .iter()
        .map(|spec| {
            networks
                .get(&spec.network)
                .cloned()
                .map(|network| (network, spec.clone()))
                .ok_or_else(|| {
                    NetworkError::invalid_property(format!(
                        "instance '{}' references unknown network '{}'",
                        spec.name, spec.network
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let handles: Vec<_> = targets
        .into_iter()
        .map(|(network, spec)| {
            let logger = logger.clone();
            tokio::spawn(async move { reserve_one(&network, &spec, &logger) })
        })
        .collect();

    let mut placed = Vec::with_capacity(handles.len());
    let mut first_err = None;
    for handle in handles {
        let outcome = handle
            .await
            .map_err(|e| NetworkError::Internal(format!("allocation task failed: {e}")))
            .and_then(|result| result);
        match outcome {
            Ok(instance) => placed.push(instance),
            Err(e) if first_err.is_none() => first_err = Some(e),
            Err(e) => logger.warn(format_args!("additional allocation failure: {e}")),
        }
    }

    if let Some(err) = first_err {
        logger.warn(format_args!(
            "allocation failed, releasing {} reservation(s): {err}",
            placed.len()
        ));
        for instance in &mut placed {
            if let Some(network) = networks.get(instance.reservation.network()) {
                network.release(&mut instance.reservation, logger)?;
            }
        }
        return Err(err);
    }
    Ok(placed)
}

/// Reserve and render settings for one instance.
///
/// Unresolved reservations on dynamic networks are left unreserved: the
/// infrastructure assigns those addresses once the VM exists.
fn reserve_one(network: &Network, spec: &InstanceSpec, logger: &Logger) -> Result<InstanceNetwork> {
    let owner = InstanceId::new(spec.name.clone());
    let mut reservation = match &spec.static_ip {
        Some(ip) => NetworkReservation::static_ip(owner.clone(), network.name(), ip_to_int(ip)?),
        None => NetworkReservation::dynamic(owner.clone(), network.name()),
    };
    if let Some(az) = &spec.az {
        reservation = reservation.with_availability_zone(az.clone());
    }

    let assigned_by_infrastructure = network.network_type() == NetworkType::Dynamic
        && reservation.state() == ReservationState::Unresolved;
    if assigned_by_infrastructure {
        logger.debug(format_args!(
            "{owner} gets its address on '{}' from the infrastructure",
            network.name()
        ));
    } else {
        network.reserve(&mut reservation, logger)?;
    }

    let settings = network.network_settings_with_defaults(&reservation)?;
    Ok(InstanceNetwork {
        instance: owner,
        reservation,
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::read_plan;
    use serde_json::json;

    fn logger() -> Logger {
        Logger::new("TestLogger")
    }

    fn spec(name: &str, network: &str, static_ip: Option<&str>) -> InstanceSpec {
        InstanceSpec {
            name: name.to_string(),
            network: network.to_string(),
            static_ip: static_ip.map(str::to_string),
            az: None,
        }
    }

    #[test]
    fn test_build_networks_rejects_duplicates() {
        let plan = Plan {
            networks: vec![
                json!({"name": "foo", "type": "dynamic"}),
                json!({"name": "foo", "type": "dynamic"}),
            ],
            instances: vec![],
        };
        let err = build_networks(&plan, &logger()).unwrap_err();
        assert_eq!(err.to_string(), "duplicate network name 'foo'");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_allocate_plan() {
        let plan = read_plan("src/tests/test_data/plan_01.json").expect("Error reading plan");
        let networks = build_networks(&plan, &logger()).unwrap();
        let placed = allocate(&networks, &plan.instances, &logger())
            .await
            .unwrap();

        assert_eq!(placed.len(), plan.instances.len());
        assert_eq!(placed[0].instance.as_str(), "web/0");
        assert_eq!(networks["private"].held_addresses().len(), 3);
        assert_eq!(networks["fixed"].held_addresses().len(), 1);

        // dynamic network entries are rendered without reserving
        let on_dynamic = placed
            .iter()
            .find(|p| p.reservation.network() == "cloud")
            .unwrap();
        assert_eq!(on_dynamic.settings.network_type, NetworkType::Dynamic);
        assert_eq!(on_dynamic.reservation.state(), ReservationState::Unresolved);
    }

    #[tokio::test]
    async fn test_allocate_releases_on_failure() {
        let plan = Plan {
            networks: vec![json!({
                "name": "private",
                "subnets": [{"range": "10.0.0.0/30", "gateway": "10.0.0.1"}],
            })],
            instances: vec![],
        };
        let networks = build_networks(&plan, &logger()).unwrap();
        // /30 has a single usable address once the gateway is taken
        let instances = vec![spec("a/0", "private", None), spec("b/0", "private", None)];

        let err = allocate(&networks, &instances, &logger()).await.unwrap_err();
        assert!(err.is_exhaustion());
        assert!(networks["private"].held_addresses().is_empty());
    }

    #[tokio::test]
    async fn test_allocate_unknown_network() {
        let networks = BTreeMap::new();
        let instances = vec![spec("a/0", "nope", None)];
        assert!(allocate(&networks, &instances, &logger()).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_allocate_unknown_network_reserves_nothing() {
        let plan = Plan {
            networks: vec![json!({
                "name": "private",
                "subnets": [{"range": "10.0.0.0/24", "gateway": "10.0.0.1"}],
            })],
            instances: vec![],
        };
        let networks = build_networks(&plan, &logger()).unwrap();
        let instances = vec![
            spec("a/0", "private", None),
            spec("b/0", "private", None),
            spec("c/0", "nope", None),
        ];

        let err = allocate(&networks, &instances, &logger()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "instance 'c/0' references unknown network 'nope'"
        );
        assert!(networks["private"].held_addresses().is_empty());
    }
}
