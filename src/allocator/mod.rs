//! Client side of the remote IP allocator.
//!
//! The allocator owns every address decision. It associates each address with an owner string
//! and serialises competing claims, so nothing here keeps state of its own.

use std::net::IpAddr;

use async_trait::async_trait;
use ipnet::IpNet;

mod error;
mod http;
mod resolver;
pub use error::Error;
pub use http::HttpAllocator;
pub use resolver::{HostResolver, Resolver};

/// Operations offered by the remote allocator
#[async_trait]
pub trait Allocator: Send + Sync {
    /// The subnet the allocator hands out addresses from when none is given
    async fn default_subnet(&self) -> Result<IpNet, Error>;

    /// Allocate any free address in the default subnet
    async fn allocate_ip(&self, owner: &str) -> Result<IpNet, Error>;

    /// Allocate a free address inside `subnet`. The returned mask is that of `subnet`
    async fn allocate_ip_in_subnet(&self, owner: &str, subnet: IpNet) -> Result<IpNet, Error>;

    /// Claim a specific address, failing with [`Error::Conflict`] if it is taken
    async fn claim_ip(&self, owner: &str, address: IpAddr) -> Result<(), Error>;

    /// Return an address to the allocator
    async fn release_ip(&self, address: IpAddr) -> Result<(), Error>;
}
