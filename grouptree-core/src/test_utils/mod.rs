//! Test utilities and helpers for grouptree
//!
//! Fixtures for building populated hierarchies and assertions over ring
//! structure, shared by the unit test modules.

pub mod assertions;
pub mod deterministic_rng;
pub mod fixtures;

pub use assertions::*;
pub use deterministic_rng::*;
pub use fixtures::*;
