//! ocmtf-cli library root.
//!
//! Exposes the config layer so integration tests can exercise it without
//! going through the binary.

pub mod config;
