//! Network layer subsystem.
//!
//! The listener and connection lifecycle belong to the HTTP bindings in
//! `crate::http`; this module only answers "who is this host" for the
//! default echo payload.

pub mod identity;

pub use identity::{HostSnapshot, NetworkIdentity, OsInfo, StaticIdentity, SystemIdentity};
