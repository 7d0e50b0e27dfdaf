//! # Ports
//!
//! Inbound API of the registry. Outbound needs (authorization, time, event
//! publication) are the shared `AuthorizationPolicy`, `TimeSource` and
//! `EventPublisher` traits.

pub mod inbound;

pub use inbound::ModuleRegistryApi;
