//! Bracketed scalar root finding for implicit reservoir updates.
//!
//! This crate provides the Pegasus method: a false-position variant that
//! rescales the retained endpoint's residual to avoid the one-sided stalling
//! of plain regula falsi. Every stateful reservoir in the engine solves its
//! per-timestep water balance through this solver.

pub mod error;
pub mod pegasus;

pub use error::{SolverError, SolverResult};
pub use pegasus::{Pegasus, RootResult};
