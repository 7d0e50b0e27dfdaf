//! # Ports

pub mod inbound;

pub use inbound::AccessValidatorApi;
