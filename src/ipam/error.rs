use std::net::{AddrParseError, IpAddr};

use ipnet::IpNet;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] pool_id::Error),
    #[error("Invalid IP address {text:?}: {source}")]
    InvalidAddress {
        text: String,
        #[source]
        source: AddrParseError,
    },
    #[error("Unrecognized pool ID: {pool_id}")]
    UnrecognizedPool {
        pool_id: String,
        #[source]
        source: pool_id::Error,
    },
    #[error("Address {address} is not of the same address family as {subnet}")]
    FamilyMismatch { address: IpAddr, subnet: IpNet },
    #[error("Sub-pool {range} is not of the same address family as {subnet}")]
    RangeFamilyMismatch { range: IpNet, subnet: IpNet },
    #[error(transparent)]
    Allocator(#[from] crate::allocator::Error),
}
