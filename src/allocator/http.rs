use std::net::IpAddr;

use async_trait::async_trait;
use hyper::{client::HttpConnector, Body, Client, Method, Request, StatusCode};
use ipnet::IpNet;

use super::{error::Error, resolver::Resolver, Allocator};

/// Allocator reached over its HTTP API
pub struct HttpAllocator<R> {
    resolver: R,
    client: Client<HttpConnector>,
}

impl<R: Resolver> HttpAllocator<R> {
    /// Construct a client that locates the allocator through `resolver` on every call
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            client: Client::new(),
        }
    }

    /// Send a bodyless request and read back the status and trimmed response text
    async fn request(&self, method: Method, path: &str) -> Result<(StatusCode, String), Error> {
        let address = self.resolver.resolve().await?;
        log::trace!("{} http://{}{}", method, address, path);
        let request = Request::builder()
            .method(method)
            .uri(format!("http://{address}{path}"))
            .body(Body::empty())?;

        let response = self.client.request(request).await?;
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await?;
        Ok((status, String::from_utf8_lossy(&body).trim().to_owned()))
    }

    /// Like `request`, but treats any non-2xx status as an error
    async fn expect_success(&self, method: Method, path: &str) -> Result<String, Error> {
        match self.request(method, path).await? {
            (status, text) if status.is_success() => Ok(text),
            (status, message) => Err(Error::Remote { status, message }),
        }
    }

    /// Parse an `addr/len` response without clearing the host bits
    fn parse_address(text: String) -> Result<IpNet, Error> {
        text.parse().map_err(|_| Error::InvalidResponse(text))
    }
}

#[async_trait]
impl<R: Resolver> Allocator for HttpAllocator<R> {
    async fn default_subnet(&self) -> Result<IpNet, Error> {
        let text = self
            .expect_success(Method::GET, "/ipinfo/defaultsubnet")
            .await?;
        Self::parse_address(text).map(|net| net.trunc())
    }

    async fn allocate_ip(&self, owner: &str) -> Result<IpNet, Error> {
        let text = self
            .expect_success(Method::POST, &format!("/ip/{owner}"))
            .await?;
        Self::parse_address(text)
    }

    async fn allocate_ip_in_subnet(&self, owner: &str, subnet: IpNet) -> Result<IpNet, Error> {
        let text = self
            .expect_success(Method::POST, &format!("/ip/{owner}/{subnet}"))
            .await?;
        Self::parse_address(text)
    }

    async fn claim_ip(&self, owner: &str, address: IpAddr) -> Result<(), Error> {
        match self
            .request(Method::PUT, &format!("/ip/{owner}/{address}"))
            .await?
        {
            (status, _) if status.is_success() => Ok(()),
            (StatusCode::CONFLICT, message) => Err(Error::Conflict { address, message }),
            (status, message) => Err(Error::Remote { status, message }),
        }
    }

    async fn release_ip(&self, address: IpAddr) -> Result<(), Error> {
        self.expect_success(Method::DELETE, &format!("/ip/{address}"))
            .await
            .map(|_| ())
    }
}
