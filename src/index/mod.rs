//! Local index overlay over collection-shaped payloads.
//!
//! A collection payload carries a change-identifying version token and an
//! array of items keyed by an identifier field. Every accepted upstream
//! collection is turned into an immutable [`LocalIndex`]; the
//! [`IndexOverlay`] shares one upstream subscription between any number of
//! consumers and offers synchronous lookups against the latest index.

mod collection;
mod local_index;
mod overlay;

pub use collection::*;
pub use local_index::*;
pub use overlay::*;
