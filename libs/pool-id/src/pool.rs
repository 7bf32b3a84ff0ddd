use std::{fmt, str::FromStr};

use ipnet::IpNet;

use crate::{decode::decode_pool_id, encode::encode_pool_id, error::Error, LEGACY_POOL_ID};

/// The address block behind a pool identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressPool {
    /// Full block of the pool. Every address handed out carries this mask
    pub subnet: IpNet,
    /// Block that automatic allocation is restricted to
    pub range: IpNet,
}

impl AddressPool {
    /// Construct a pool restricting automatic allocation to `range`
    #[must_use]
    pub fn new(subnet: IpNet, range: IpNet) -> Self {
        Self { subnet, range }
    }

    /// Construct a pool whose range is the whole subnet
    #[must_use]
    pub fn whole(subnet: IpNet) -> Self {
        Self::new(subnet, subnet)
    }

    /// Check whether the range lies inside the subnet.
    ///
    /// Nothing in this library enforces it.
    #[must_use]
    pub fn range_within_subnet(&self) -> bool {
        self.subnet.contains(&self.range)
    }
}

impl fmt::Display for AddressPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_pool_id(self.subnet, self.range))
    }
}

/// A decoded pool identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolId {
    /// The legacy identifier. Carries no subnet or range
    Legacy,
    /// An identifier carrying its own address pool
    Encoded(AddressPool),
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolId::Legacy => f.write_str(LEGACY_POOL_ID),
            PoolId::Encoded(pool) => pool.fmt(f),
        }
    }
}

impl FromStr for PoolId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_pool_id(s)
    }
}

impl From<AddressPool> for PoolId {
    fn from(pool: AddressPool) -> Self {
        PoolId::Encoded(pool)
    }
}
