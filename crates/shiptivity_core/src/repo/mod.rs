//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the store contract rank maintenance is written against.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes validate ranks before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod client_repo;
