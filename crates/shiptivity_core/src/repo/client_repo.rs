//! Client repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the read/rank-update operations rank maintenance depends on.
//! - Keep SQL details and row decoding inside the persistence boundary.
//!
//! # Invariants
//! - Lane listings are deterministic: `priority ASC, id ASC`.
//! - Full listings follow store order: `id ASC`.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - New clients are appended at the end of their lane.

use crate::db::migrations::latest_version;
use crate::db::{schema_version, DbError};
use crate::model::client::{
    validate_priority, Client, ClientId, ClientValidationError, Lane, NewClient,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CLIENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    status,
    priority
FROM clients";

const REQUIRED_COLUMNS: [&str; 5] = ["id", "name", "description", "status", "priority"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from client persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Write input failed model validation.
    Validation(ClientValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target client does not exist.
    NotFound(ClientId),
    /// Persisted data cannot be converted to a valid client.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "client not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted client data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "client repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "client repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "client repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ClientValidationError> for RepoError {
    fn from(value: ClientValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Store operations used by client use cases and rank maintenance.
pub trait ClientRepository {
    /// Inserts one client at the end of its lane.
    ///
    /// Reading the lane tail and inserting form one atomic unit, so
    /// concurrent creators never share a rank. Must not be called from
    /// inside [`ClientRepository::atomically`].
    fn create_client(&self, new_client: &NewClient) -> RepoResult<Client>;
    /// Loads one client by id.
    fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>>;
    /// Lists every client in store order.
    fn list_clients(&self) -> RepoResult<Vec<Client>>;
    /// Lists one lane ordered by rank.
    fn list_clients_by_lane(&self, lane: Lane) -> RepoResult<Vec<Client>>;
    /// Moves one client to `lane` at `priority`. `lane` may be unchanged.
    fn update_priority_and_lane(
        &self,
        id: ClientId,
        priority: i64,
        lane: Lane,
    ) -> RepoResult<()>;
    /// Re-ranks one client inside its current lane.
    fn update_priority(&self, id: ClientId, priority: i64) -> RepoResult<()>;
    /// Runs `work` as one atomic unit.
    ///
    /// Writes made by `work` are committed only when it returns `Ok`;
    /// any error rolls all of them back.
    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RepoError>;
}

/// SQLite-backed client repository.
pub struct SqliteClientRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteClientRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_client_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ClientRepository for SqliteClientRepository<'_> {
    fn create_client(&self, new_client: &NewClient) -> RepoResult<Client> {
        new_client.validate()?;

        // The tail rank must be read under the write lock, or two writers
        // append at the same rank.
        self.atomically(|| {
            let priority = next_priority(self.conn, new_client.lane)?;
            self.conn.execute(
                "INSERT INTO clients (
                    name,
                    description,
                    status,
                    priority
                ) VALUES (?1, ?2, ?3, ?4);",
                params![
                    new_client.name.as_str(),
                    new_client.description.as_deref(),
                    new_client.lane.as_str(),
                    priority,
                ],
            )?;

            let id = self.conn.last_insert_rowid();
            self.get_client(id)?.ok_or(RepoError::NotFound(id))
        })
    }

    fn get_client(&self, id: ClientId) -> RepoResult<Option<Client>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CLIENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_client_row(row)?));
        }
        Ok(None)
    }

    fn list_clients(&self) -> RepoResult<Vec<Client>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CLIENT_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut clients = Vec::new();
        while let Some(row) = rows.next()? {
            clients.push(parse_client_row(row)?);
        }
        Ok(clients)
    }

    fn list_clients_by_lane(&self, lane: Lane) -> RepoResult<Vec<Client>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CLIENT_SELECT_SQL}
             WHERE status = ?1
             ORDER BY priority ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([lane.as_str()])?;
        let mut clients = Vec::new();
        while let Some(row) = rows.next()? {
            clients.push(parse_client_row(row)?);
        }
        Ok(clients)
    }

    fn update_priority_and_lane(
        &self,
        id: ClientId,
        priority: i64,
        lane: Lane,
    ) -> RepoResult<()> {
        validate_priority(priority)?;

        let changed = self.conn.execute(
            "UPDATE clients
             SET priority = ?2,
                 status = ?3
             WHERE id = ?1;",
            params![id, priority, lane.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn update_priority(&self, id: ClientId, priority: i64) -> RepoResult<()> {
        validate_priority(priority)?;

        let changed = self.conn.execute(
            "UPDATE clients
             SET priority = ?2
             WHERE id = ?1;",
            params![id, priority],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RepoError>,
    {
        // IMMEDIATE takes the write lock up front so reads inside `work`
        // cannot go stale under a concurrent writer.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        let value = work()?;
        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }
}

fn next_priority(conn: &Connection, lane: Lane) -> RepoResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(priority), 0) + 1
         FROM clients
         WHERE status = ?1;",
        [lane.as_str()],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn parse_client_row(row: &Row<'_>) -> RepoResult<Client> {
    let status_text: String = row.get("status")?;
    let lane = status_text.parse::<Lane>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in clients.status"
        ))
    })?;

    let client = Client {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        lane,
        priority: row.get("priority")?,
    };
    client
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("client {}: {err}", client.id)))?;
    Ok(client)
}

fn ensure_client_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "clients")? {
        return Err(RepoError::MissingRequiredTable("clients"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "clients", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "clients",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1
             FROM sqlite_master
             WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(exists.is_some())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
