//! cf-core: stable foundation for catchflow.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact node ids and element paths for diagnostics)
//! - timing (env-gated scoped timers reporting through tracing)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod timing;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CfError, CfResult};
pub use ids::*;
pub use numeric::*;
pub use timing::ScopedTimer;
