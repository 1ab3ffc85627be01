//! `bankcore-core`: ledger foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no IO, no storage).

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;

pub use clock::{Clock, FixedClock, SystemClock, Timestamp};
pub use entity::Entity;
pub use error::{BankError, BankResult};
pub use id::{AccountNo, OwnerId};
