//! Locating the allocator on the network

use std::net::SocketAddr;

use async_trait::async_trait;

use super::error::Error;

/// Finds the allocator's current network address.
///
/// Clients call this before every request, so an allocator that moved or restarted is picked up
/// on the next call.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self) -> Result<SocketAddr, Error>;
}

/// Resolves a `host:port` target with a fresh name lookup on every call
#[derive(Debug, Clone)]
pub struct HostResolver {
    target: String,
}

impl HostResolver {
    /// Construct a resolver for a `host:port` target
    pub fn new<T: Into<String>>(target: T) -> Self {
        Self {
            target: target.into(),
        }
    }
}

#[async_trait]
impl Resolver for HostResolver {
    async fn resolve(&self) -> Result<SocketAddr, Error> {
        let address = tokio::net::lookup_host(self.target.as_str())
            .await
            .map_err(|source| Error::Resolve {
                target: self.target.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| Error::Unresolved(self.target.clone()))?;
        log::trace!("Resolved allocator {} to {}", self.target, address);
        Ok(address)
    }
}
