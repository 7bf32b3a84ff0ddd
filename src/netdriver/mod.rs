//! The `NetworkDriver` capability set.
//!
//! Creating interfaces and routes is the job of the companion network driver. What lives here is
//! the seam the plugin server dispatches through, plus a driver that answers the protocol without
//! touching host networking.

use async_trait::async_trait;

use crate::protocol::network::{
    CapabilitiesResponse, CreateEndpointRequest, CreateEndpointResponse, CreateNetworkRequest,
    DiscoveryRequest, EndpointInfoResponse, EndpointRequest, JoinRequest, JoinResponse,
    NetworkRequest, Scope,
};

mod passive;
pub use passive::PassiveNetworkDriver;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed endpoint ID: {0:?}")]
    InvalidEndpointId(String),
    #[error("Invalid route prefix: {0}")]
    Route(#[from] ipnet::PrefixLenError),
}

/// Operations of the `NetworkDriver` capability set
#[async_trait]
pub trait NetworkDriver: Send + Sync {
    /// Scope of the networks this driver serves
    fn scope(&self) -> Scope;

    fn get_capabilities(&self) -> CapabilitiesResponse {
        log::debug!("GetCapabilities");
        CapabilitiesResponse {
            scope: self.scope(),
        }
    }

    async fn create_network(&self, request: &CreateNetworkRequest) -> Result<(), Error>;
    async fn delete_network(&self, request: &NetworkRequest) -> Result<(), Error>;
    async fn create_endpoint(
        &self,
        request: &CreateEndpointRequest,
    ) -> Result<CreateEndpointResponse, Error>;
    async fn delete_endpoint(&self, request: &EndpointRequest) -> Result<(), Error>;
    async fn endpoint_info(&self, request: &EndpointRequest)
        -> Result<EndpointInfoResponse, Error>;
    async fn join(&self, request: &JoinRequest) -> Result<JoinResponse, Error>;
    async fn leave(&self, request: &EndpointRequest) -> Result<(), Error>;

    async fn discover_new(&self, request: &DiscoveryRequest) -> Result<(), Error> {
        log::debug!("DiscoverNew {}", request.discovery_type);
        Ok(())
    }

    async fn discover_delete(&self, request: &DiscoveryRequest) -> Result<(), Error> {
        log::debug!("DiscoverDelete {}", request.discovery_type);
        Ok(())
    }

    async fn program_external_connectivity(&self, request: &EndpointRequest) -> Result<(), Error> {
        log::debug!(
            "ProgramExternalConnectivity {} {}",
            request.network_id,
            request.endpoint_id
        );
        Ok(())
    }

    async fn revoke_external_connectivity(&self, request: &EndpointRequest) -> Result<(), Error> {
        log::debug!(
            "RevokeExternalConnectivity {} {}",
            request.network_id,
            request.endpoint_id
        );
        Ok(())
    }
}
