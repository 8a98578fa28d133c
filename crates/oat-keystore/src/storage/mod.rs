//! Durable and fault-injecting implementations of the OAT store traits.
//!
//! The traits themselves live in [`oat_core::storage`]; the in-memory
//! implementation used by simulations lives there too.

mod chaotic;
mod redb;

pub use chaotic::{ChaoticStore, FailurePoint};
pub use redb::RedbStore;
