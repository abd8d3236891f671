//! # freshet
//!
//! A client-side data-freshness cache for HTTP resources.
//!
//! - [`Endpoint`] caches one resource, revalidates it with `If-None-Match`,
//!   honours `Expires` and an optional refresh interval, and only emits when
//!   the payload really changed.
//! - [`Endpoint::changes`] is a demand-driven multicast stream: the first
//!   subscriber starts polling, the last one to leave stops it.
//! - [`IndexOverlay`] turns a collection endpoint into synchronous
//!   by-identifier lookups shared between consumers.
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use freshet::{EndpointBuilder, ReqwestTransport};
//!
//! let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(30))?);
//! let users = EndpointBuilder::new(transport)
//!     .url("https://api.example.com/users/1")
//!     .refresh_interval(Duration::from_secs(60))
//!     .build_json::<serde_json::Value>()?;
//!
//! let user = users.fetch().await?;
//! ```

mod config;
mod contract;
mod engine;
mod errors;
mod index;
pub mod metrics;
mod service;
mod stream;
mod transport;
pub(crate) mod utils;

pub use config::*;
pub use contract::*;
pub use engine::*;
pub use errors::*;
pub use index::*;
pub use service::*;
pub use stream::*;
pub use transport::*;


//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
