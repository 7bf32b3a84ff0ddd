//! `NetworkDriver.*` requests and responses

use std::{collections::BTreeMap, fmt};

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

/// Reach of the networks created through an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Networks visible to every host of the cluster
    Global,
    /// Networks visible only within the local mesh
    Local,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Local => f.write_str("local"),
        }
    }
}

/// Response to `/NetworkDriver.GetCapabilities`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapabilitiesResponse {
    pub scope: Scope,
}

/// Address data of one pool attached to a network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IpamData {
    pub address_space: String,
    pub pool: String,
    pub gateway: String,
}

/// Body of `/NetworkDriver.CreateNetwork`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateNetworkRequest {
    #[serde(rename = "NetworkID")]
    pub network_id: String,
    #[serde(rename = "IPv4Data")]
    pub ipv4_data: Vec<IpamData>,
    #[serde(rename = "IPv6Data")]
    pub ipv6_data: Vec<IpamData>,
}

/// Body of calls naming a network only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkRequest {
    #[serde(rename = "NetworkID")]
    pub network_id: String,
}

/// Body of calls naming an endpoint of a network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointRequest {
    #[serde(rename = "NetworkID")]
    pub network_id: String,
    #[serde(rename = "EndpointID")]
    pub endpoint_id: String,
}

/// Addressing of an endpoint's interface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EndpointInterface {
    pub address: String,
    #[serde(rename = "AddressIPv6")]
    pub address_ipv6: String,
    pub mac_address: String,
}

/// Body of `/NetworkDriver.CreateEndpoint`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CreateEndpointRequest {
    #[serde(rename = "NetworkID")]
    pub network_id: String,
    #[serde(rename = "EndpointID")]
    pub endpoint_id: String,
    pub interface: Option<EndpointInterface>,
}

/// Response to `/NetworkDriver.CreateEndpoint`.
///
/// The interface is only set when the driver picked addressing the platform did not supply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateEndpointResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<EndpointInterface>,
}

/// Response to `/NetworkDriver.EndpointOperInfo`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointInfoResponse {
    pub value: BTreeMap<String, String>,
}

/// Body of `/NetworkDriver.Join`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct JoinRequest {
    #[serde(rename = "NetworkID")]
    pub network_id: String,
    #[serde(rename = "EndpointID")]
    pub endpoint_id: String,
    pub sandbox_key: String,
}

/// Interface the platform moves into the container on join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InterfaceName {
    /// Host-side name of the interface
    pub src_name: String,
    /// Name prefix inside the container
    pub dst_prefix: String,
}

/// Route type of a route reachable directly on the interface
pub const ROUTE_CONNECTED: u8 = 1;

/// A route installed in the container on join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StaticRoute {
    pub destination: IpNet,
    pub route_type: u8,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub next_hop: String,
}

/// Response to `/NetworkDriver.Join`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JoinResponse {
    pub interface_name: InterfaceName,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gateway: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub static_routes: Vec<StaticRoute>,
    #[serde(default)]
    pub disable_gateway_service: bool,
}

/// Body of `/NetworkDriver.DiscoverNew` and `/NetworkDriver.DiscoverDelete`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DiscoveryRequest {
    pub discovery_type: u8,
    pub discovery_data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_shape() {
        assert_eq!(
            serde_json::to_string(&CapabilitiesResponse {
                scope: Scope::Global
            })
            .unwrap(),
            r#"{"Scope":"global"}"#
        );
        assert_eq!(Scope::Local.to_string(), "local");
    }

    #[test]
    fn test_create_network_ignores_unknown_keys() {
        let request: CreateNetworkRequest = serde_json::from_str(
            r#"{
                "NetworkID": "abc",
                "Options": {"com.docker.network.generic": {"works.weave.multicast": "true"}},
                "IPv4Data": [{"AddressSpace": "weavelocal", "Pool": "10.32.0.0/12", "Gateway": "10.32.0.0/12"}],
                "IPv6Data": []
            }"#,
        )
        .unwrap();
        assert_eq!(request.network_id, "abc");
        assert_eq!(request.ipv4_data[0].pool, "10.32.0.0/12");
    }

    #[test]
    fn test_create_endpoint_without_interface() {
        let request: CreateEndpointRequest =
            serde_json::from_str(r#"{"NetworkID": "abc", "EndpointID": "def"}"#).unwrap();
        assert!(request.interface.is_none());
        assert_eq!(
            serde_json::to_string(&CreateEndpointResponse::default()).unwrap(),
            "{}"
        );
    }
}
