//! Code shared by the binary's setup steps

pub mod logging;
