//! Deterministic simulation harness for OAT protocol testing.
//!
//! Seeded implementations of the environment plus an in-process lossy link,
//! so a client and server can be driven through arbitrary schedules of lost
//! requests and lost responses and replayed exactly from a seed.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks over [`SystemSnapshot`]s. Use [`InvariantRegistry::standard()`]
//! for the protocol invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_env;
pub mod sim_link;
pub mod sim_world;

pub use invariants::{
    ClientSnapshot, IdentityAgreement, Invariant, InvariantRegistry, InvariantResult,
    KeyWithinWindow, OperationRecord, ServerSnapshot, SingleCommit, SystemSnapshot, Violation,
};
pub use sim_env::SimEnv;
pub use sim_link::{Fault, LinkEvent, SimLink};
pub use sim_world::SimWorld;
