//! Lane rank maintenance use-case.
//!
//! # Responsibility
//! - Move one client to another lane and/or rank slot.
//! - Re-rank every lane touched by the move so ranks stay `1..=N`.
//!
//! # Invariants
//! - Clients other than the target keep their relative order.
//! - One reassign reads and writes inside a single `atomically` unit.
//! - Unknown targets fail with `NotFound` before any write.
//! - Requested ranks past the end of a lane land in its last slot.
//! - On a rank tie in the destination lane the moved client goes first.

use crate::model::client::{
    ranks_are_contiguous, validate_priority, Client, ClientId, ClientValidationError, Lane,
};
use crate::repo::client_repo::{ClientRepository, RepoError};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from rank maintenance operations.
#[derive(Debug)]
pub enum RankError {
    /// Target client does not exist.
    NotFound(ClientId),
    /// Caller input failed validation at the core boundary.
    InvalidInput(ClientValidationError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for RankError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "client not found: {id}"),
            Self::InvalidInput(err) => write!(f, "invalid input: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RankError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for RankError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::InvalidInput(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ClientValidationError> for RankError {
    fn from(value: ClientValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

/// Request to move one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReassignRequest {
    pub target_id: ClientId,
    /// `None` keeps the client's current lane.
    pub lane: Option<Lane>,
    /// `None` keeps the current rank, or appends when the lane changes.
    pub priority: Option<i64>,
}

impl ReassignRequest {
    /// Creates a request that changes nothing yet.
    pub fn new(target_id: ClientId) -> Self {
        Self {
            target_id,
            lane: None,
            priority: None,
        }
    }

    pub fn with_lane(mut self, lane: Lane) -> Self {
        self.lane = Some(lane);
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Builds a request from raw caller input.
    ///
    /// # Errors
    /// - `InvalidInput` for a lane outside `backlog|in-progress|complete`.
    /// - `InvalidInput` for a zero or negative priority.
    pub fn parse(
        target_id: ClientId,
        lane: Option<&str>,
        priority: Option<i64>,
    ) -> Result<Self, RankError> {
        let lane = lane.map(str::parse::<Lane>).transpose()?;
        if let Some(priority) = priority {
            validate_priority(priority)?;
        }
        Ok(Self {
            target_id,
            lane,
            priority,
        })
    }
}

/// Rank maintenance service over one client store.
pub struct RankManager<R: ClientRepository> {
    repo: R,
}

impl<R: ClientRepository> RankManager<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Moves one client to a new lane and/or rank and re-ranks affected lanes.
    ///
    /// Returns every client of the destination lane ordered by rank. A
    /// request that changes nothing writes nothing and returns the client's
    /// current lane.
    ///
    /// # Errors
    /// - `InvalidInput` when the requested priority is not positive.
    /// - `NotFound` when the target does not exist; nothing is written.
    /// - `Repo` on storage failure; every write of this call is rolled back.
    pub fn reassign(&self, request: &ReassignRequest) -> Result<Vec<Client>, RankError> {
        if let Some(priority) = request.priority {
            validate_priority(priority)?;
        }

        let started_at = Instant::now();
        let result = self.repo.atomically(|| self.reassign_unit(request));
        match &result {
            Ok(outcome) => info!(
                "event=client_reassign module=rank status={} client_id={} lane={} rewrites={} duration_ms={}",
                outcome.status,
                request.target_id,
                outcome.lane,
                outcome.rewrites,
                started_at.elapsed().as_millis()
            ),
            Err(RankError::NotFound(id)) => warn!(
                "event=client_reassign module=rank status=error client_id={id} error_code=not_found duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=client_reassign module=rank status=error client_id={} duration_ms={} error={}",
                request.target_id,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result.map(|outcome| outcome.lane_clients)
    }

    /// Re-ranks one lane to `1..=N`, keeping its current order.
    ///
    /// Repairs lanes holding duplicate or sparse ranks, e.g. rows imported
    /// from an older database. A lane that is already contiguous is left
    /// untouched.
    pub fn compact_lane(&self, lane: Lane) -> Result<Vec<Client>, RankError> {
        let started_at = Instant::now();
        let result = self.repo.atomically(|| -> Result<LaneOutcome, RankError> {
            let members = self.repo.list_clients_by_lane(lane)?;
            if ranks_are_contiguous(&members) {
                return Ok(LaneOutcome::noop(lane, members));
            }
            let ordered: Vec<&Client> = members.iter().collect();
            let rewrites = self.apply_ranks(&ordered, None)?;
            Ok(LaneOutcome {
                status: "ok",
                lane,
                rewrites,
                lane_clients: self.repo.list_clients_by_lane(lane)?,
            })
        });

        match &result {
            Ok(outcome) => info!(
                "event=lane_compact module=rank status={} lane={} members={} rewrites={} duration_ms={}",
                outcome.status,
                lane,
                outcome.lane_clients.len(),
                outcome.rewrites,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=lane_compact module=rank status=error lane={} duration_ms={} error={}",
                lane,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result.map(|outcome| outcome.lane_clients)
    }

    fn reassign_unit(&self, request: &ReassignRequest) -> Result<LaneOutcome, RankError> {
        let target = self
            .repo
            .get_client(request.target_id)?
            .ok_or(RankError::NotFound(request.target_id))?;

        let Some(planned) = plan_move(&target, request.lane, request.priority) else {
            debug!(
                "event=client_reassign module=rank status=noop client_id={} lane={} priority={}",
                target.id, target.lane, target.priority
            );
            let lane_clients = self.repo.list_clients_by_lane(target.lane)?;
            return Ok(LaneOutcome::noop(target.lane, lane_clients));
        };

        let rewrites = match planned {
            Move::Within { lane, priority } => self.move_within(&target, lane, priority)?,
            Move::Across { from, to, priority } => {
                self.move_across(&target, from, to, priority)?
            }
        };

        let lane = planned.destination();
        Ok(LaneOutcome {
            status: "ok",
            lane,
            rewrites,
            lane_clients: self.repo.list_clients_by_lane(lane)?,
        })
    }

    fn move_within(
        &self,
        target: &Client,
        lane: Lane,
        priority: i64,
    ) -> Result<usize, RankError> {
        let members = self.repo.list_clients_by_lane(lane)?;
        let others: Vec<&Client> = members
            .iter()
            .filter(|client| client.id != target.id)
            .collect();
        let (ordered, target_rank) = insert_at_slot(others, target, Some(priority));

        let mut rewrites = 0;
        if target_rank != target.priority {
            self.repo.update_priority(target.id, target_rank)?;
            rewrites += 1;
        }
        rewrites += self.apply_ranks(&ordered, Some(target.id))?;
        Ok(rewrites)
    }

    fn move_across(
        &self,
        target: &Client,
        from: Lane,
        to: Lane,
        priority: Option<i64>,
    ) -> Result<usize, RankError> {
        let source = self.repo.list_clients_by_lane(from)?;
        let destination = self.repo.list_clients_by_lane(to)?;

        let remaining: Vec<&Client> = source
            .iter()
            .filter(|client| client.id != target.id)
            .collect();
        let (ordered, target_rank) =
            insert_at_slot(destination.iter().collect(), target, priority);

        self.repo.update_priority_and_lane(target.id, target_rank, to)?;
        let mut rewrites = 1;
        rewrites += self.apply_ranks(&remaining, Some(target.id))?;
        rewrites += self.apply_ranks(&ordered, Some(target.id))?;
        Ok(rewrites)
    }

    /// Writes rank `index + 1` for every client in `ordered` whose stored
    /// rank differs, except `skip`. Returns the number of rows written.
    fn apply_ranks(
        &self,
        ordered: &[&Client],
        skip: Option<ClientId>,
    ) -> Result<usize, RankError> {
        let changes = rank_changes(ordered, skip);
        for &(id, rank) in &changes {
            self.repo.update_priority(id, rank)?;
        }
        Ok(changes.len())
    }
}

#[derive(Debug)]
struct LaneOutcome {
    status: &'static str,
    lane: Lane,
    rewrites: usize,
    lane_clients: Vec<Client>,
}

impl LaneOutcome {
    fn noop(lane: Lane, lane_clients: Vec<Client>) -> Self {
        Self {
            status: "noop",
            lane,
            rewrites: 0,
            lane_clients,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    /// Same lane, different slot.
    Within { lane: Lane, priority: i64 },
    /// Different lane; `priority: None` appends to the destination.
    Across {
        from: Lane,
        to: Lane,
        priority: Option<i64>,
    },
}

impl Move {
    fn destination(self) -> Lane {
        match self {
            Self::Within { lane, .. } => lane,
            Self::Across { to, .. } => to,
        }
    }
}

fn plan_move(target: &Client, lane: Option<Lane>, priority: Option<i64>) -> Option<Move> {
    let destination = lane.unwrap_or(target.lane);
    if destination != target.lane {
        return Some(Move::Across {
            from: target.lane,
            to: destination,
            priority,
        });
    }

    match priority {
        Some(priority) if priority != target.priority => Some(Move::Within {
            lane: destination,
            priority,
        }),
        _ => None,
    }
}

/// Inserts `target` into `others` (already in rank order) at the slot for
/// `requested` and returns the new order plus the target's 1-based rank.
///
/// `None` or a rank past the end appends.
fn insert_at_slot<'a>(
    mut others: Vec<&'a Client>,
    target: &'a Client,
    requested: Option<i64>,
) -> (Vec<&'a Client>, i64) {
    let slot = requested
        .and_then(|priority| usize::try_from(priority.saturating_sub(1)).ok())
        .map_or(others.len(), |index| index.min(others.len()));
    others.insert(slot, target);
    (others, slot as i64 + 1)
}

fn rank_changes(ordered: &[&Client], skip: Option<ClientId>) -> Vec<(ClientId, i64)> {
    ordered
        .iter()
        .zip(1_i64..)
        .filter(|(client, rank)| Some(client.id) != skip && client.priority != *rank)
        .map(|(client, rank)| (client.id, rank))
        .collect()
}
