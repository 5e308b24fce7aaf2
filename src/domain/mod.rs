//! Domain types.
//!
//! This module contains the entities the admin service manages.

mod agency;
mod agent;
mod customer;

pub use agency::*;
pub use agent::*;
pub use customer::*;
