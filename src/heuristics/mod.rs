//! Metaheuristic engines for the CVRP.
//!
//! This module exports the four search engines. They share the instance and
//! solution model and nothing else; each owns its configuration, state, and
//! (where it has one) random number generator.

pub mod aco;
pub mod alns;
pub mod genetic;
pub mod tabu;

pub use aco::*;
pub use alns::*;
pub use genetic::*;
pub use tabu::*;
