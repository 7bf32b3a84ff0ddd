//! This module contains the definitions for the binary's CLI arguments and config file structure for the sake of readability.

pub mod weave_plugin;
