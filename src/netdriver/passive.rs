use std::{collections::BTreeMap, net::Ipv4Addr};

use async_trait::async_trait;
use ipnet::{IpNet, Ipv4Net};

use super::{Error, NetworkDriver};
use crate::protocol::network::{
    CreateEndpointRequest, CreateEndpointResponse, CreateNetworkRequest, EndpointInfoResponse,
    EndpointRequest, InterfaceName, JoinRequest, JoinResponse, NetworkRequest, Scope, StaticRoute,
    ROUTE_CONNECTED,
};

/// Host-side interface names are this prefix plus the start of the endpoint ID
const INTERFACE_PREFIX: &str = "vethwepl";

/// Name prefix of the interface inside the container
const CONTAINER_INTERFACE_PREFIX: &str = "ethwe";

/// Multicast block routed through the endpoint's interface
const MULTICAST_NETWORK: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 0);
const MULTICAST_PREFIX_LEN: u8 = 4;

/// Longest Linux interface name
const MAX_INTERFACE_NAME_LEN: usize = 15;

/// Network driver that answers the protocol without configuring host networking.
///
/// On join it names the host-side interface the companion driver creates for the endpoint, and
/// asks the platform to route multicast through it unless told not to.
#[derive(Debug, Clone)]
pub struct PassiveNetworkDriver {
    scope: Scope,
    no_multicast_route: bool,
}

impl PassiveNetworkDriver {
    #[must_use]
    pub fn new(scope: Scope, no_multicast_route: bool) -> Self {
        Self {
            scope,
            no_multicast_route,
        }
    }

    /// Host-side name of the interface belonging to an endpoint
    fn interface_name(endpoint_id: &str) -> Result<String, Error> {
        let keep = MAX_INTERFACE_NAME_LEN - INTERFACE_PREFIX.len();
        match endpoint_id.get(..keep) {
            Some(id) if id.chars().all(|c| c.is_ascii_alphanumeric()) => {
                Ok(format!("{INTERFACE_PREFIX}{id}"))
            }
            _ => Err(Error::InvalidEndpointId(endpoint_id.to_owned())),
        }
    }
}

#[async_trait]
impl NetworkDriver for PassiveNetworkDriver {
    fn scope(&self) -> Scope {
        self.scope
    }

    async fn create_network(&self, request: &CreateNetworkRequest) -> Result<(), Error> {
        log::debug!(
            "CreateNetwork {} {:?} {:?}",
            request.network_id,
            request.ipv4_data,
            request.ipv6_data
        );
        Ok(())
    }

    async fn delete_network(&self, request: &NetworkRequest) -> Result<(), Error> {
        log::debug!("DeleteNetwork {}", request.network_id);
        Ok(())
    }

    async fn create_endpoint(
        &self,
        request: &CreateEndpointRequest,
    ) -> Result<CreateEndpointResponse, Error> {
        log::debug!(
            "CreateEndpoint {} {} {:?}",
            request.network_id,
            request.endpoint_id,
            request.interface
        );
        // Addressing always comes from IPAM, so there is nothing to add to it
        Ok(CreateEndpointResponse::default())
    }

    async fn delete_endpoint(&self, request: &EndpointRequest) -> Result<(), Error> {
        log::debug!(
            "DeleteEndpoint {} {}",
            request.network_id,
            request.endpoint_id
        );
        Ok(())
    }

    async fn endpoint_info(
        &self,
        request: &EndpointRequest,
    ) -> Result<EndpointInfoResponse, Error> {
        log::debug!(
            "EndpointOperInfo {} {}",
            request.network_id,
            request.endpoint_id
        );
        Ok(EndpointInfoResponse {
            value: BTreeMap::new(),
        })
    }

    async fn join(&self, request: &JoinRequest) -> Result<JoinResponse, Error> {
        log::debug!(
            "Join {} {} {}",
            request.network_id,
            request.endpoint_id,
            request.sandbox_key
        );
        let mut static_routes = Vec::new();
        if !self.no_multicast_route {
            let multicast = Ipv4Net::new(MULTICAST_NETWORK, MULTICAST_PREFIX_LEN)?;
            static_routes.push(StaticRoute {
                destination: IpNet::V4(multicast),
                route_type: ROUTE_CONNECTED,
                next_hop: String::new(),
            });
        }
        Ok(JoinResponse {
            interface_name: InterfaceName {
                src_name: Self::interface_name(&request.endpoint_id)?,
                dst_prefix: CONTAINER_INTERFACE_PREFIX.to_owned(),
            },
            gateway: String::new(),
            static_routes,
            disable_gateway_service: false,
        })
    }

    async fn leave(&self, request: &EndpointRequest) -> Result<(), Error> {
        log::debug!("Leave {} {}", request.network_id, request.endpoint_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join_request(endpoint_id: &str) -> JoinRequest {
        JoinRequest {
            network_id: "net".to_owned(),
            endpoint_id: endpoint_id.to_owned(),
            sandbox_key: "/var/run/docker/netns/abc".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_join_with_multicast_route() {
        let driver = PassiveNetworkDriver::new(Scope::Local, false);
        let response = driver
            .join(&join_request("0123456789abcdef0123"))
            .await
            .unwrap();
        assert_eq!(response.interface_name.src_name, "vethwepl0123456");
        assert_eq!(response.interface_name.dst_prefix, "ethwe");
        assert_eq!(
            response.static_routes,
            vec![StaticRoute {
                destination: "224.0.0.0/4".parse().unwrap(),
                route_type: ROUTE_CONNECTED,
                next_hop: String::new(),
            }]
        );
    }

    #[tokio::test]
    async fn test_join_without_multicast_route() {
        let driver = PassiveNetworkDriver::new(Scope::Global, true);
        let response = driver
            .join(&join_request("0123456789abcdef0123"))
            .await
            .unwrap();
        assert!(response.static_routes.is_empty());
    }

    #[tokio::test]
    async fn test_join_rejects_malformed_endpoint() {
        let driver = PassiveNetworkDriver::new(Scope::Global, false);
        for endpoint_id in ["", "abc", "../../etc/passwd"] {
            assert!(matches!(
                driver.join(&join_request(endpoint_id)).await,
                Err(Error::InvalidEndpointId(_))
            ));
        }
    }

    #[test]
    fn test_capabilities_report_scope() {
        let driver = PassiveNetworkDriver::new(Scope::Local, false);
        assert_eq!(driver.get_capabilities().scope, Scope::Local);
    }
}
