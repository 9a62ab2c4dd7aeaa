//! Client read/create use-case service.
//!
//! # Responsibility
//! - Provide list/get/create entry points for board callers.
//! - Parse raw lane filters at the core boundary.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Created clients join their lane at the last rank.

use crate::model::client::{Client, ClientId, Lane, NewClient};
use crate::repo::client_repo::{ClientRepository, RepoError, RepoResult};
use log::info;

/// Use-case service wrapper for client reads and creation.
pub struct ClientService<R: ClientRepository> {
    repo: R,
}

impl<R: ClientRepository> ClientService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists all clients in store order, or one lane in rank order.
    pub fn list_clients(&self, lane: Option<Lane>) -> RepoResult<Vec<Client>> {
        match lane {
            Some(lane) => self.repo.list_clients_by_lane(lane),
            None => self.repo.list_clients(),
        }
    }

    /// Lists one lane given its raw wire name.
    ///
    /// Returns `RepoError::Validation` for anything but
    /// `backlog|in-progress|complete`.
    pub fn list_clients_by_status(&self, status: &str) -> RepoResult<Vec<Client>> {
        let lane = status.parse::<Lane>()?;
        self.repo.list_clients_by_lane(lane)
    }

    /// Gets one client by id.
    pub fn get_client(&self, id: ClientId) -> RepoResult<Client> {
        self.repo.get_client(id)?.ok_or(RepoError::NotFound(id))
    }

    /// Creates a client at the end of `new_client.lane`.
    pub fn create_client(&self, new_client: &NewClient) -> RepoResult<Client> {
        let client = self.repo.create_client(new_client)?;
        info!(
            "event=client_create module=client status=ok client_id={} lane={} priority={}",
            client.id, client.lane, client.priority
        );
        Ok(client)
    }
}
