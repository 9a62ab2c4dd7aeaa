use shiptivity_core::db::open_db_in_memory;
use shiptivity_core::{
    Client, ClientRepository, ClientService, ClientValidationError, Lane, NewClient, RepoError,
    SqliteClientRepository,
};
use rusqlite::Connection;

#[test]
fn create_appends_to_end_of_each_lane() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::try_new(&conn).unwrap();

    let a = repo
        .create_client(&NewClient::new("Acme", Lane::Backlog))
        .unwrap();
    let b = repo
        .create_client(&NewClient::new("Bolt", Lane::Backlog).with_description("freight"))
        .unwrap();
    let c = repo
        .create_client(&NewClient::new("Crate", Lane::Complete))
        .unwrap();

    assert_eq!((a.lane, a.priority), (Lane::Backlog, 1));
    assert_eq!((b.lane, b.priority), (Lane::Backlog, 2));
    assert_eq!((c.lane, c.priority), (Lane::Complete, 1));
    assert_eq!(b.description.as_deref(), Some("freight"));
}

#[test]
fn get_missing_client_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::try_new(&conn).unwrap();

    assert!(repo.get_client(42).unwrap().is_none());
}

#[test]
fn list_by_lane_orders_by_priority_then_id() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO clients (id, name, description, status, priority) VALUES
            (1, 'late', NULL, 'backlog', 3),
            (2, 'tie-high-id', NULL, 'backlog', 1),
            (3, 'other-lane', NULL, 'complete', 1),
            (0, 'tie-low-id', NULL, 'backlog', 1);",
    )
    .unwrap();
    let repo = SqliteClientRepository::try_new(&conn).unwrap();

    let names: Vec<String> = repo
        .list_clients_by_lane(Lane::Backlog)
        .unwrap()
        .into_iter()
        .map(|client| client.name)
        .collect();
    assert_eq!(names, vec!["tie-low-id", "tie-high-id", "late"]);

    let ids: Vec<i64> = repo
        .list_clients()
        .unwrap()
        .into_iter()
        .map(|client| client.id)
        .collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

#[test]
fn update_operations_report_missing_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::try_new(&conn).unwrap();

    let err = repo.update_priority(7, 1).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(7)));

    let err = repo
        .update_priority_and_lane(7, 1, Lane::Complete)
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(7)));
}

#[test]
fn update_rejects_non_positive_priority() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::try_new(&conn).unwrap();
    let client = repo
        .create_client(&NewClient::new("Acme", Lane::Backlog))
        .unwrap();

    let err = repo.update_priority(client.id, 0).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ClientValidationError::NonPositivePriority(0))
    ));
}

#[test]
fn update_priority_and_lane_moves_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::try_new(&conn).unwrap();
    let client = repo
        .create_client(&NewClient::new("Acme", Lane::Backlog))
        .unwrap();

    repo.update_priority_and_lane(client.id, 3, Lane::InProgress)
        .unwrap();

    let loaded = repo.get_client(client.id).unwrap().unwrap();
    assert_eq!(loaded.lane, Lane::InProgress);
    assert_eq!(loaded.priority, 3);
    assert_eq!(loaded.name, "Acme");
}

#[test]
fn invalid_persisted_status_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO clients (name, description, status, priority)
         VALUES ('Legacy', NULL, 'archived', 1);",
        [],
    )
    .unwrap();
    let repo = SqliteClientRepository::try_new(&conn).unwrap();

    let err = repo.list_clients().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("archived")));
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = match SqliteClientRepository::try_new(&conn) {
        Ok(_) => panic!("unmigrated connection must be rejected"),
        Err(err) => err,
    };
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}

#[test]
fn service_lists_by_raw_status_and_rejects_unknown_lane() {
    let conn = open_db_in_memory().unwrap();
    let service = ClientService::new(SqliteClientRepository::try_new(&conn).unwrap());
    service
        .create_client(&NewClient::new("Acme", Lane::InProgress))
        .unwrap();
    service
        .create_client(&NewClient::new("Bolt", Lane::Backlog))
        .unwrap();

    let in_progress = service.list_clients_by_status("in-progress").unwrap();
    assert_eq!(in_progress.len(), 1);
    assert_eq!(in_progress[0].name, "Acme");
    assert_eq!(service.list_clients(None).unwrap().len(), 2);
    assert_eq!(service.list_clients(Some(Lane::Complete)).unwrap().len(), 0);

    let err = service.list_clients_by_status("done").unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ClientValidationError::UnknownLane(lane)) if lane == "done"
    ));
}

#[test]
fn service_get_and_create_surface_semantic_errors() {
    let conn = open_db_in_memory().unwrap();
    let service = ClientService::new(SqliteClientRepository::try_new(&conn).unwrap());

    assert!(matches!(service.get_client(5), Err(RepoError::NotFound(5))));

    let err = service
        .create_client(&NewClient::new("   ", Lane::Backlog))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ClientValidationError::BlankName)
    ));

    let created = service
        .create_client(&NewClient::new("  Acme  ", Lane::Backlog))
        .unwrap();
    assert_eq!(created.name, "Acme");
    assert_eq!(service.get_client(created.id).unwrap(), created);
}

#[test]
fn client_json_uses_external_field_names() {
    let client = Client {
        id: 3,
        name: "Acme".to_string(),
        description: None,
        lane: Lane::InProgress,
        priority: 2,
    };

    let value = serde_json::to_value(&client).unwrap();
    assert_eq!(value["status"], "in-progress");
    assert_eq!(value["priority"], 2);
    assert!(value.get("lane").is_none());

    let parsed: Client = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, client);
}
