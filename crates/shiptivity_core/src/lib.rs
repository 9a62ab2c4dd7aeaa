//! Core domain logic for the Shiptivity client board.
//! This crate is the single source of truth for lane rank invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::client::{
    ranks_are_contiguous, Client, ClientId, ClientValidationError, Lane, NewClient,
};
pub use repo::client_repo::{ClientRepository, RepoError, RepoResult, SqliteClientRepository};
pub use service::client_service::ClientService;
pub use service::rank_manager::{RankError, RankManager, ReassignRequest};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
