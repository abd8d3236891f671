//! Demand-driven multicast stream.
//!
//! A push stream layered over `tokio::sync::broadcast` with two refinements:
//! the zero-to-one subscriber transition runs a start hook and the
//! one-to-zero transition runs a stop hook; and a new subscriber receives the
//! last known value first, but only if a value is known (there is no "unset"
//! sentinel).

mod demand_stream;
pub use demand_stream::*;
