use std::net::IpAddr;

use hyper::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unable to resolve allocator address {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Allocator address {0} did not resolve to anything")]
    Unresolved(String),
    #[error("Allocator is unavailable: {0}")]
    Unavailable(#[from] hyper::Error),
    #[error(transparent)]
    Request(#[from] hyper::http::Error),
    #[error("Address {address} is already claimed: {message}")]
    Conflict { address: IpAddr, message: String },
    #[error("Allocator responded with {status}: {message}")]
    Remote { status: StatusCode, message: String },
    #[error("Allocator responded with an unparsable address: {0:?}")]
    InvalidResponse(String),
}
