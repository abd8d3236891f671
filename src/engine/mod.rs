//! Cache-and-poll engine.
//!
//! One [`Endpoint`] owns the ETag / expiry / value state of a single HTTP
//! resource, decides whether a request is needed at all, performs the
//! conditional GET and only replaces (and emits) the cached value when the
//! caller's equality says it really changed.
//!
//! Polling is demand-driven: the endpoint's change stream starts the poll
//! loop when its first subscriber arrives and stops it when the last one
//! leaves.

mod builder;
mod endpoint;
mod freshness;
mod poller;
mod state;

pub use builder::*;
pub use endpoint::*;
pub use freshness::*;
