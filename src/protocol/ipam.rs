//! `IpamDriver.*` requests and responses

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

/// Response to `/IpamDriver.GetCapabilities`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CapabilitiesResponse {
    #[serde(rename = "RequiresMACAddress")]
    pub requires_mac_address: bool,
}

/// Response to `/IpamDriver.GetDefaultAddressSpaces`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressSpacesResponse {
    pub local_default_address_space: String,
    pub global_default_address_space: String,
}

/// Options recognised on pool requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolOptions {
    /// Set when the platform asks for serial rather than first-free allocation
    #[serde(
        rename = "com.docker.network.ipam.serial",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub serial: Option<String>,
}

/// Body of `/IpamDriver.RequestPool`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RequestPoolRequest {
    pub address_space: String,
    pub pool: String,
    pub sub_pool: String,
    #[serde(deserialize_with = "null_as_default")]
    pub options: PoolOptions,
    #[serde(rename = "V6")]
    pub v6: bool,
}

/// Data returned alongside a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolData {
    /// Advisory gateway. Always the pool's network address, never meant to be routed to
    #[serde(rename = "com.docker.network.gateway")]
    pub gateway: IpNet,
}

/// Response to `/IpamDriver.RequestPool`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestPoolResponse {
    #[serde(rename = "PoolID")]
    pub pool_id: String,
    pub pool: IpNet,
    pub data: PoolData,
}

/// Body of `/IpamDriver.ReleasePool`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleasePoolRequest {
    #[serde(rename = "PoolID")]
    pub pool_id: String,
}

/// Options recognised on address requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressOptions {
    /// What the platform wants the address for. Logged, otherwise unused
    #[serde(
        rename = "com.docker.network.request_address_type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub request_address_type: Option<String>,
    /// MAC address of the endpoint the address is for
    #[serde(
        rename = "com.docker.network.endpoint.macaddress",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub mac_address: Option<String>,
}

/// Body of `/IpamDriver.RequestAddress`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RequestAddressRequest {
    #[serde(rename = "PoolID")]
    pub pool_id: String,
    /// Specific address wanted, or empty for any
    pub address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub options: AddressOptions,
}

/// Response to `/IpamDriver.RequestAddress`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestAddressResponse {
    /// The address with the mask of its pool's subnet
    pub address: IpNet,
    pub data: super::Empty,
}

/// Body of `/IpamDriver.ReleaseAddress`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ReleaseAddressRequest {
    #[serde(rename = "PoolID")]
    pub pool_id: String,
    pub address: String,
}

/// The platform sends `null` for option maps it has nothing to put in
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
