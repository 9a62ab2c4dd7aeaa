//! Client domain model.
//!
//! # Responsibility
//! - Define the client record and the closed set of lanes it can sit in.
//! - Provide validation helpers shared by repository and service layers.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused for another client.
//! - `priority` is a positive rank; within one lane ranks form `1..=N`.
//! - `lane` is serialized as `status` to match the external API naming.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Storage-assigned client identifier.
pub type ClientId = i64;

/// Fixed swimlane a client belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Lane {
    /// Not started yet.
    Backlog,
    /// Currently being worked on.
    InProgress,
    /// Shipped.
    Complete,
}

impl Lane {
    /// Every lane, in board order.
    pub const ALL: [Lane; 3] = [Lane::Backlog, Lane::InProgress, Lane::Complete];

    /// Returns the persisted/wire name of this lane.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::InProgress => "in-progress",
            Self::Complete => "complete",
        }
    }
}

impl Display for Lane {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lane {
    type Err = ClientValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "backlog" => Ok(Self::Backlog),
            "in-progress" => Ok(Self::InProgress),
            "complete" => Ok(Self::Complete),
            other => Err(ClientValidationError::UnknownLane(other.to_string())),
        }
    }
}

/// Validation failures for client input and persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientValidationError {
    /// Name is empty after trimming.
    BlankName,
    /// Lane string is not one of `backlog|in-progress|complete`.
    UnknownLane(String),
    /// Priority is zero or negative.
    NonPositivePriority(i64),
}

impl Display for ClientValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "client name must not be blank"),
            Self::UnknownLane(value) => write!(
                f,
                "unknown status `{value}`; expected one of backlog|in-progress|complete"
            ),
            Self::NonPositivePriority(value) => {
                write!(f, "priority must be a positive integer, got {value}")
            }
        }
    }
}

impl Error for ClientValidationError {}

/// Persisted client record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Stable storage identity.
    pub id: ClientId,
    pub name: String,
    pub description: Option<String>,
    /// Serialized as `status` to match external schema naming.
    #[serde(rename = "status")]
    pub lane: Lane,
    /// 1-based rank within `lane`; 1 is the top of the lane.
    pub priority: i64,
}

impl Client {
    /// Checks field-level invariants of one record.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        validate_priority(self.priority)?;
        validate_name(&self.name)
    }
}

/// Input for creating a client at the end of a lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub name: String,
    pub description: Option<String>,
    pub lane: Lane,
}

impl NewClient {
    /// Builds a creation request with a trimmed name and no description.
    pub fn new(name: impl Into<String>, lane: Lane) -> Self {
        Self {
            name: name.into().trim().to_string(),
            description: None,
            lane,
        }
    }

    /// Attaches a free-form description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<(), ClientValidationError> {
        validate_name(&self.name)
    }
}

/// Rejects names that are empty after trimming.
pub fn validate_name(name: &str) -> Result<(), ClientValidationError> {
    if name.trim().is_empty() {
        return Err(ClientValidationError::BlankName);
    }
    Ok(())
}

/// Rejects zero and negative ranks.
pub fn validate_priority(priority: i64) -> Result<(), ClientValidationError> {
    if priority < 1 {
        return Err(ClientValidationError::NonPositivePriority(priority));
    }
    Ok(())
}

/// Returns whether the ranks of one lane's members are exactly `1..=N`.
///
/// Input order does not matter; all clients are assumed to share one lane.
pub fn ranks_are_contiguous(clients: &[Client]) -> bool {
    let mut ranks: Vec<i64> = clients.iter().map(|client| client.priority).collect();
    ranks.sort_unstable();
    ranks.iter().copied().eq(1..=clients.len() as i64)
}

#[cfg(test)]
mod tests {
    use super::{
        ranks_are_contiguous, validate_name, Client, ClientValidationError, Lane, NewClient,
    };

    fn client(id: i64, priority: i64) -> Client {
        Client {
            id,
            name: format!("client-{id}"),
            description: None,
            lane: Lane::Backlog,
            priority,
        }
    }

    #[test]
    fn lane_parses_wire_names_only() {
        for lane in Lane::ALL {
            assert_eq!(lane.as_str().parse::<Lane>().unwrap(), lane);
        }
        let err = "in_progress".parse::<Lane>().unwrap_err();
        assert_eq!(
            err,
            ClientValidationError::UnknownLane("in_progress".to_string())
        );
    }

    #[test]
    fn contiguity_ignores_input_order() {
        assert!(ranks_are_contiguous(&[]));
        assert!(ranks_are_contiguous(&[client(1, 2), client(2, 1)]));
        assert!(!ranks_are_contiguous(&[client(1, 1), client(2, 1)]));
        assert!(!ranks_are_contiguous(&[client(1, 1), client(2, 3)]));
    }

    #[test]
    fn validate_rejects_non_positive_priority() {
        let err = client(1, 0).validate().unwrap_err();
        assert_eq!(err, ClientValidationError::NonPositivePriority(0));
    }

    #[test]
    fn blank_names_fail_on_stored_and_new_clients_alike() {
        assert_eq!(validate_name(" \t "), Err(ClientValidationError::BlankName));
        assert_eq!(validate_name(" Acme "), Ok(()));

        let mut stored = client(1, 1);
        stored.name = "   ".to_string();
        assert_eq!(stored.validate(), Err(ClientValidationError::BlankName));

        let fresh = NewClient {
            name: "\n".to_string(),
            description: None,
            lane: Lane::Complete,
        };
        assert_eq!(fresh.validate(), Err(ClientValidationError::BlankName));
        assert_eq!(NewClient::new("Acme", Lane::Complete).validate(), Ok(()));
    }
}
