//! The `IpamDriver` capability set.
//!
//! The driver is stateless. Pool identifiers carry their own subnet and range (see the
//! `pool-id` crate), so every call rebuilds its context from its arguments and hands the actual
//! allocation to the remote allocator under a single owner tag.

use std::{net::IpAddr, sync::Arc};

use ipnet::IpNet;
use pool_id::{parse_cidr, AddressPool, PoolId};

use crate::{
    allocator::Allocator,
    protocol::{
        ipam::{
            AddressSpacesResponse, CapabilitiesResponse, PoolData, ReleaseAddressRequest,
            ReleasePoolRequest, RequestAddressRequest, RequestAddressResponse, RequestPoolRequest,
            RequestPoolResponse,
        },
        Empty,
    },
};

mod error;
pub use error::Error;

/// Owner every address is allocated under. The allocator keys its bookkeeping on it
pub const OWNER_TAG: &str = "_";

/// Address space reported for local-scope networks
pub const LOCAL_ADDRESS_SPACE: &str = "weavelocal";

/// Address space reported for global-scope networks
pub const GLOBAL_ADDRESS_SPACE: &str = "weaveglobal";

/// IPAM driver translating pool and address requests onto the allocator
#[derive(Clone)]
pub struct IpamDriver {
    allocator: Arc<dyn Allocator>,
}

impl IpamDriver {
    /// Construct a new driver on top of an allocator
    pub fn new(allocator: Arc<dyn Allocator>) -> Self {
        Self { allocator }
    }

    /// Handle `IpamDriver.GetCapabilities`
    #[must_use]
    pub fn get_capabilities(&self) -> CapabilitiesResponse {
        log::debug!("GetCapabilities");
        CapabilitiesResponse {
            requires_mac_address: false,
        }
    }

    /// Handle `IpamDriver.GetDefaultAddressSpaces`
    #[must_use]
    pub fn get_default_address_spaces(&self) -> AddressSpacesResponse {
        log::debug!("GetDefaultAddressSpaces");
        AddressSpacesResponse {
            local_default_address_space: LOCAL_ADDRESS_SPACE.to_owned(),
            global_default_address_space: GLOBAL_ADDRESS_SPACE.to_owned(),
        }
    }

    /// Handle `IpamDriver.RequestPool`.
    ///
    /// Without an explicit pool the allocator's current default subnet is used. It is asked
    /// again on every call since it may change between calls.
    pub async fn request_pool(
        &self,
        request: &RequestPoolRequest,
    ) -> Result<RequestPoolResponse, Error> {
        log::debug!(
            "RequestPool {} {:?} {:?} {:?} v6={}",
            request.address_space,
            request.pool,
            request.sub_pool,
            request.options,
            request.v6
        );
        let result = self.build_pool(request).await;
        log::debug!("RequestPool returning {:?}", result);
        result
    }

    async fn build_pool(&self, request: &RequestPoolRequest) -> Result<RequestPoolResponse, Error> {
        let subnet = match request.pool.as_str() {
            "" => self.allocator.default_subnet().await?,
            pool => parse_cidr(pool)?,
        };
        let pool = match request.sub_pool.as_str() {
            "" => AddressPool::whole(subnet),
            sub_pool => AddressPool::new(subnet, parse_cidr(sub_pool)?),
        };
        if !pool.range_within_subnet() {
            log::warn!(
                "Sub-pool {} lies outside pool {}; allocating from it anyway",
                pool.range,
                subnet
            );
        }

        Ok(RequestPoolResponse {
            pool_id: pool.to_string(),
            pool: subnet,
            // Not a usable gateway. The protocol wants one, so hand back the network address
            data: PoolData { gateway: subnet },
        })
    }

    /// Handle `IpamDriver.ReleasePool`. Pools hold no resources, so there is nothing to do
    pub fn release_pool(&self, request: &ReleasePoolRequest) {
        log::debug!("ReleasePool {}", request.pool_id);
    }

    /// Handle `IpamDriver.RequestAddress`.
    ///
    /// A specific address is claimed as-is, even outside the pool's range. Otherwise an address is
    /// allocated from the range. Either way the result carries the mask of the pool's subnet.
    pub async fn request_address(
        &self,
        request: &RequestAddressRequest,
    ) -> Result<RequestAddressResponse, Error> {
        log::debug!(
            "RequestAddress {} {:?} {:?}",
            request.pool_id,
            request.address,
            request.options
        );
        let requested = match request.address.as_str() {
            "" => None,
            text => Some(parse_address(text)?),
        };
        let result = self.allocate(&request.pool_id, requested).await;
        log::debug!("RequestAddress returning {:?}", result);
        Ok(RequestAddressResponse {
            address: result?,
            data: Empty {},
        })
    }

    async fn allocate(&self, pool_id: &str, requested: Option<IpAddr>) -> Result<IpNet, Error> {
        let pool = match pool_id.parse::<PoolId>() {
            Ok(PoolId::Encoded(pool)) => pool,
            Ok(PoolId::Legacy) => {
                if let Some(address) = requested {
                    log::debug!("Ignoring requested address {} on legacy pool", address);
                }
                return Ok(self.allocator.allocate_ip(OWNER_TAG).await?);
            }
            Err(source) => {
                return Err(Error::UnrecognizedPool {
                    pool_id: pool_id.to_owned(),
                    source,
                })
            }
        };

        match requested {
            Some(address) => {
                let address_net = with_subnet_mask(address, pool.subnet)?;
                self.allocator.claim_ip(OWNER_TAG, address).await?;
                Ok(address_net)
            }
            None => {
                // Anything the allocator hands out from here could never carry the subnet's mask
                if pool.range.addr().is_ipv4() != pool.subnet.addr().is_ipv4() {
                    return Err(Error::RangeFamilyMismatch {
                        range: pool.range,
                        subnet: pool.subnet,
                    });
                }
                // The range is handed over as if it were the subnet so the allocator only searches
                // inside it. The mask it hands back is the range's and gets replaced by the subnet's
                let allocated = self
                    .allocator
                    .allocate_ip_in_subnet(OWNER_TAG, pool.range)
                    .await?;
                with_subnet_mask(allocated.addr(), pool.subnet)
            }
        }
    }

    /// Handle `IpamDriver.ReleaseAddress`
    pub async fn release_address(&self, request: &ReleaseAddressRequest) -> Result<(), Error> {
        log::debug!("ReleaseAddress {} {}", request.pool_id, request.address);
        let address = parse_address(&request.address)?;
        Ok(self.allocator.release_ip(address).await?)
    }
}

fn parse_address(text: &str) -> Result<IpAddr, Error> {
    text.parse().map_err(|source| Error::InvalidAddress {
        text: text.to_owned(),
        source,
    })
}

/// Attach the mask of `subnet` to `address`
fn with_subnet_mask(address: IpAddr, subnet: IpNet) -> Result<IpNet, Error> {
    let mismatch = || Error::FamilyMismatch { address, subnet };
    if address.is_ipv4() != subnet.addr().is_ipv4() {
        return Err(mismatch());
    }
    IpNet::new(address, subnet.prefix_len()).map_err(|_| mismatch())
}
