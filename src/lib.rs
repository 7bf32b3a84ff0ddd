//! # Weave plugin library
//!
//! *Note: There is a fair chance you are looking for `src/weave-plugin.rs` instead of this file.*

#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod allocator;
pub mod ipam;
pub mod netdriver;
pub mod protocol;
pub mod server;
