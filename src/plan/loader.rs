//! Plan file loading.

use crate::error::{NetworkError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// One instance wanting an address on one network.
#[derive(Deserialize, Debug, Clone)]
pub struct InstanceSpec {
    /// Instance name, e.g. `web/0`.
    pub name: String,
    /// Name of the network to reserve on.
    pub network: String,
    /// Exact address for a static reservation.
    #[serde(default)]
    pub static_ip: Option<String>,
    /// Availability zone the instance is placed in.
    #[serde(default)]
    pub az: Option<String>,
}

/// Networks from the manifest plus the instances to place on them.
#[derive(Deserialize, Debug, Default)]
pub struct Plan {
    /// Raw manifest network fragments, parsed later by `Network::from_manifest`.
    pub networks: Vec<Value>,
    #[serde(default)]
    pub instances: Vec<InstanceSpec>,
}

/// Read a plan from a JSON file.
///
/// # Errors
/// * `Io` if the file can't be read
/// * `ManifestParse` with the JSON path of the first bad field
pub fn read_plan(path: impl AsRef<Path>) -> Result<Plan> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(NetworkError::Io(format!(
            "plan file does not exist: {}",
            path.display()
        )));
    }
    log::info!("Reading plan file: {}", path.display());
    let json = std::fs::read_to_string(path)?;
    parse_plan(&json)
}

/// Deserialize a plan, reporting the failing JSON path.
pub fn parse_plan(json: &str) -> Result<Plan> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        log::error!("Error parsing plan at path={}", e.path());
        NetworkError::ManifestParse {
            path: e.path().to_string(),
            reason: e.inner().to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_plan() {
        let plan = read_plan("src/tests/test_data/plan_01.json").expect("Error reading plan");
        assert_eq!(plan.networks.len(), 3);
        assert_eq!(plan.instances.len(), 5);
        assert_eq!(plan.instances[0].name, "web/0");
        assert_eq!(plan.instances[3].static_ip.as_deref(), Some("10.10.0.20"));
    }

    #[test]
    fn test_read_plan_missing_file() {
        let err = read_plan("src/tests/test_data/no_such_plan.json").unwrap_err();
        assert!(matches!(err, NetworkError::Io(_)));
    }

    #[test]
    fn test_parse_plan_reports_path() {
        let err = parse_plan(r#"{"networks": [], "instances": [{"name": "web/0", "network": 7}]}"#)
            .unwrap_err();
        match err {
            NetworkError::ManifestParse { path, .. } => assert_eq!(path, "instances[0].network"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
