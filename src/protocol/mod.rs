//! Wire types of the Docker plugin protocol.
//!
//! Every call is an HTTP `POST` to `/<Capability>.<Operation>` carrying a JSON object and
//! answered with a JSON object. Option maps are decoded into typed structures naming the keys
//! this plugin understands. Unknown keys are ignored.

use serde::{Deserialize, Serialize};

pub mod ipam;
pub mod network;

/// Content type of every plugin response
pub const CONTENT_TYPE: &str = "application/vnd.docker.plugins.v1.2+json";

/// Capability sets a plugin endpoint can implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Implements {
    NetworkDriver,
    IpamDriver,
}

/// Response to `/Plugin.Activate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivateResponse {
    pub implements: Vec<Implements>,
}

/// Body of every failed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "Err")]
    pub err: String,
}

/// An empty JSON object, the body of calls that only report success
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}
