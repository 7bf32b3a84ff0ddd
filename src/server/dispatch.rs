//! Routing of plugin calls to the drivers behind an endpoint

use std::sync::Arc;

use hyper::{
    header::{HeaderValue, CONTENT_TYPE},
    Body, Request, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};

use super::error::HandlerError;
use crate::{
    ipam::IpamDriver,
    netdriver::NetworkDriver,
    protocol::{self, ActivateResponse, Empty, ErrorResponse, Implements},
};

/// Answers the plugin calls arriving on one endpoint
pub struct PluginHandler {
    network: Arc<dyn NetworkDriver>,
    ipam: Option<IpamDriver>,
}

impl PluginHandler {
    /// Construct a handler. IPAM calls are only answered when an IPAM driver is given
    pub fn new(network: Arc<dyn NetworkDriver>, ipam: Option<IpamDriver>) -> Self {
        Self { network, ipam }
    }

    /// Capability sets advertised on activation
    #[must_use]
    pub fn implements(&self) -> Vec<Implements> {
        match self.ipam {
            Some(_) => vec![Implements::NetworkDriver, Implements::IpamDriver],
            None => vec![Implements::NetworkDriver],
        }
    }

    /// Answer a single plugin call. Failures are rendered as `{"Err": ...}` bodies
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let path = request.uri().path().to_owned();
        let result = match hyper::body::to_bytes(request.into_body()).await {
            Ok(body) => self.dispatch(&path, &body).await,
            Err(error) => Err(error.into()),
        };

        match result {
            Ok(body) => respond(StatusCode::OK, body),
            Err(error) => {
                log::warn!("{} failed: {}", path, error);
                let body = serde_json::to_vec(&ErrorResponse {
                    err: error.to_string(),
                })
                .unwrap_or_default();
                respond(error.status(), body)
            }
        }
    }

    async fn dispatch(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, HandlerError> {
        let not_found = || HandlerError::NotFound(path.to_owned());
        let (capability, operation) = path
            .strip_prefix('/')
            .and_then(|call| call.split_once('.'))
            .ok_or_else(not_found)?;

        let result = match (capability, operation, &self.ipam) {
            ("Plugin", "Activate", _) => encode(&ActivateResponse {
                implements: self.implements(),
            }),
            ("NetworkDriver", operation, _) => self.dispatch_network(operation, body).await,
            ("IpamDriver", operation, Some(ipam)) => dispatch_ipam(ipam, operation, body).await,
            _ => Err(not_found()),
        };

        // Report the full call path rather than just the operation
        result.map_err(|error| match error {
            HandlerError::NotFound(_) => not_found(),
            error => error,
        })
    }

    async fn dispatch_network(&self, operation: &str, body: &[u8]) -> Result<Vec<u8>, HandlerError> {
        let network = self.network.as_ref();
        match operation {
            "GetCapabilities" => encode(&network.get_capabilities()),
            "CreateNetwork" => {
                network.create_network(&decode(body)?).await?;
                encode(&Empty {})
            }
            "DeleteNetwork" => {
                network.delete_network(&decode(body)?).await?;
                encode(&Empty {})
            }
            "CreateEndpoint" => encode(&network.create_endpoint(&decode(body)?).await?),
            "DeleteEndpoint" => {
                network.delete_endpoint(&decode(body)?).await?;
                encode(&Empty {})
            }
            "EndpointOperInfo" => encode(&network.endpoint_info(&decode(body)?).await?),
            "Join" => encode(&network.join(&decode(body)?).await?),
            "Leave" => {
                network.leave(&decode(body)?).await?;
                encode(&Empty {})
            }
            "DiscoverNew" => {
                network.discover_new(&decode(body)?).await?;
                encode(&Empty {})
            }
            "DiscoverDelete" => {
                network.discover_delete(&decode(body)?).await?;
                encode(&Empty {})
            }
            "ProgramExternalConnectivity" => {
                network.program_external_connectivity(&decode(body)?).await?;
                encode(&Empty {})
            }
            "RevokeExternalConnectivity" => {
                network.revoke_external_connectivity(&decode(body)?).await?;
                encode(&Empty {})
            }
            _ => Err(HandlerError::NotFound(operation.to_owned())),
        }
    }
}

async fn dispatch_ipam(
    ipam: &IpamDriver,
    operation: &str,
    body: &[u8],
) -> Result<Vec<u8>, HandlerError> {
    match operation {
        "GetCapabilities" => encode(&ipam.get_capabilities()),
        "GetDefaultAddressSpaces" => encode(&ipam.get_default_address_spaces()),
        "RequestPool" => encode(&ipam.request_pool(&decode(body)?).await?),
        "ReleasePool" => {
            ipam.release_pool(&decode(body)?);
            encode(&Empty {})
        }
        "RequestAddress" => encode(&ipam.request_address(&decode(body)?).await?),
        "ReleaseAddress" => {
            ipam.release_address(&decode(body)?).await?;
            encode(&Empty {})
        }
        _ => Err(HandlerError::NotFound(operation.to_owned())),
    }
}

/// Decode a request body. An empty body or `null` stands for an empty request
fn decode<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, HandlerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice::<Option<T>>(body)
        .map(Option::unwrap_or_default)
        .map_err(HandlerError::Decode)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, HandlerError> {
    serde_json::to_vec(value).map_err(HandlerError::Encode)
}

fn respond(status: StatusCode, body: Vec<u8>) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(protocol::CONTENT_TYPE));
    response
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::{
        allocator::testing::MemoryAllocator, netdriver::PassiveNetworkDriver,
        protocol::network::Scope,
    };

    fn handler(with_ipam: bool) -> PluginHandler {
        let ipam = with_ipam
            .then(|| IpamDriver::new(Arc::new(MemoryAllocator::new("10.32.0.0/12"))));
        PluginHandler::new(
            Arc::new(PassiveNetworkDriver::new(Scope::Local, false)),
            ipam,
        )
    }

    async fn call(handler: &PluginHandler, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(path)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = handler.handle(request).await;
        let status = response.status();
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/vnd.docker.plugins.v1.2+json"
        );
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_activate() {
        assert_eq!(
            call(&handler(true), "/Plugin.Activate", Value::Null).await,
            (
                StatusCode::OK,
                json!({"Implements": ["NetworkDriver", "IpamDriver"]})
            )
        );
        assert_eq!(
            call(&handler(false), "/Plugin.Activate", Value::Null).await,
            (StatusCode::OK, json!({"Implements": ["NetworkDriver"]}))
        );
    }

    #[tokio::test]
    async fn test_pool_and_address_flow() {
        let handler = handler(true);
        let (status, pool) = call(
            &handler,
            "/IpamDriver.RequestPool",
            json!({"AddressSpace": "weavelocal", "Pool": "10.32.0.0/12", "SubPool": "10.32.0.0/16", "Options": {}, "V6": false}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            pool,
            json!({
                "PoolID": "weave-10.32.0.0/12-10.32.0.0/16",
                "Pool": "10.32.0.0/12",
                "Data": {"com.docker.network.gateway": "10.32.0.0/12"}
            })
        );

        let (status, address) = call(
            &handler,
            "/IpamDriver.RequestAddress",
            json!({"PoolID": pool["PoolID"], "Address": "", "Options": null}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(address, json!({"Address": "10.32.0.1/12", "Data": {}}));

        let (status, released) = call(
            &handler,
            "/IpamDriver.ReleaseAddress",
            json!({"PoolID": pool["PoolID"], "Address": "10.32.0.1"}),
        )
        .await;
        assert_eq!((status, released), (StatusCode::OK, json!({})));

        let (status, released) = call(
            &handler,
            "/IpamDriver.ReleasePool",
            json!({"PoolID": pool["PoolID"]}),
        )
        .await;
        assert_eq!((status, released), (StatusCode::OK, json!({})));
    }

    #[tokio::test]
    async fn test_driver_errors_are_rendered() {
        let (status, body) = call(
            &handler(true),
            "/IpamDriver.RequestAddress",
            json!({"PoolID": "bogus"}),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"Err": "Unrecognized pool ID: bogus"}));
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let (status, body) = call(&handler(true), "/IpamDriver.RequestPool", json!([1, 2])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["Err"]
            .as_str()
            .unwrap()
            .starts_with("Unable to decode JSON payload"));
    }

    #[tokio::test]
    async fn test_ipam_absent_without_ipam() {
        let (status, body) = call(
            &handler(false),
            "/IpamDriver.GetDefaultAddressSpaces",
            Value::Null,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({"Err": "No handler for /IpamDriver.GetDefaultAddressSpaces"})
        );
    }

    #[tokio::test]
    async fn test_unknown_paths() {
        for path in ["/", "/Plugin.Deactivate", "/NetworkDriver.Teleport", "/nonsense"] {
            let (status, _) = call(&handler(true), path, Value::Null).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        }
    }

    #[tokio::test]
    async fn test_network_calls() {
        let handler = handler(true);
        assert_eq!(
            call(&handler, "/NetworkDriver.GetCapabilities", Value::Null).await,
            (StatusCode::OK, json!({"Scope": "local"}))
        );
        assert_eq!(
            call(
                &handler,
                "/NetworkDriver.CreateNetwork",
                json!({"NetworkID": "abc", "Options": {}, "IPv4Data": [], "IPv6Data": []})
            )
            .await,
            (StatusCode::OK, json!({}))
        );
        let (status, joined) = call(
            &handler,
            "/NetworkDriver.Join",
            json!({"NetworkID": "abc", "EndpointID": "0123456789abcdef", "SandboxKey": "/x"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            joined["InterfaceName"],
            json!({"SrcName": "vethwepl0123456", "DstPrefix": "ethwe"})
        );
        assert_eq!(
            call(
                &handler,
                "/NetworkDriver.Leave",
                json!({"NetworkID": "abc", "EndpointID": "0123456789abcdef"})
            )
            .await,
            (StatusCode::OK, json!({}))
        );
    }
}
