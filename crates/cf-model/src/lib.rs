//! Catchment composition and routing for catchflow.
//!
//! Provides:
//! - `Unit`: a layered DAG of elements representing one hydrological
//!   response unit, with strict declaration-order flux hand-off
//! - `Node`: an area-weighted mixture of units producing local discharge
//! - `Network`: a rooted forest of nodes with topologically ordered
//!   accumulation from headwaters to outlets
//! - the `run(forcing)` entry point with options and recorded output

pub mod error;
pub mod network;
pub mod node;
pub mod run;
pub mod unit;

// Re-exports for public API
pub use error::{ModelError, ModelResult};
pub use network::Network;
pub use node::Node;
pub use run::{Forcing, ForcingStep, RunOptions, RunOutput};
pub use unit::Unit;
