//! Domain model for the client board.
//!
//! # Responsibility
//! - Define canonical data structures used by rank maintenance.
//!
//! # Invariants
//! - Every client belongs to exactly one lane of a closed set.
//! - Ranks within one lane are contiguous from 1.

pub mod client;
