//! Hydrological model elements for catchflow.
//!
//! Provides:
//! - the `Element` trait: the polymorphic unit of computation over fluxes
//! - stateful reservoirs (snow, unsaturated, power-law fast/slow) sharing one
//!   implicit-update skeleton around the Pegasus solver
//! - stateless structural elements (splitter, junction, transparent)
//! - the half-triangular lag function

pub mod element;
pub mod error;
pub mod lag;
pub mod reservoir;
pub mod structure;

// Internal modules
mod params;

// Re-exports for public API
pub use element::{Element, StepContext};
pub use error::{ElementError, ElementResult};
pub use lag::HalfTriangularLag;
pub use reservoir::{PowerLawReservoir, SnowReservoir, UnsaturatedReservoir};
pub use structure::{Junction, Splitter, Transparent};
