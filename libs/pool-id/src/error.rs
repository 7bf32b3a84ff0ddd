//! Error types for this library

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid pool ID: {0}")]
    InvalidPoolId(String),
    #[error("Invalid CIDR {text:?}: {source}")]
    InvalidCidr {
        text: String,
        #[source]
        source: ipnet::AddrParseError,
    },
}
