#![doc = include_str!("../README.md")]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod decode;
mod encode;
mod error;
mod pool;
pub use decode::{decode_pool_id, parse_cidr};
pub use encode::encode_pool_id;
pub use error::Error;
pub use pool::{AddressPool, PoolId};

/// Tag leading every encoded pool identifier
pub const POOL_TAG: &str = "weave";

/// Identifier handed out before pool identifiers carried their own subnet and range.
///
/// Callers that still hold it get addresses from the allocator's default subnet.
pub const LEGACY_POOL_ID: &str = "weavepool";

/// Joins the parts of an encoded identifier. CIDR text never contains it.
pub const SEPARATOR: char = '-';
