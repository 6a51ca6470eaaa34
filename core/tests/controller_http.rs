//! The controller over `HttpTransport`, against the live mock server.

use mock_server::Db;
use todo_sync::{
    ApiError, Filter, HttpTransport, RenameOutcome, SyncConfig, SyncController, SyncError, Transport,
};

const OWNER: i64 = 1414;

/// Start the mock server over `db` on a random port and return its base URL.
async fn serve(db: Db) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run_with_db(listener, db));
    format!("http://{addr}")
}

fn config(base_url: &str) -> SyncConfig {
    SyncConfig {
        owner_id: OWNER,
        base_url: base_url.to_string(),
        ..SyncConfig::default()
    }
}

#[tokio::test]
async fn session_round_trip() {
    let db = Db::default();
    {
        let mut table = db.write().await;
        table.insert("seeded".to_string(), false, OWNER);
        table.insert("someone else's".to_string(), true, OWNER + 1);
    }
    let base_url = serve(db.clone()).await;
    let controller = SyncController::from_config(&config(&base_url));

    assert_eq!(controller.load().await.unwrap(), 1);

    let created = controller.create("  buy milk ").await.unwrap();
    assert_eq!(created.title, "buy milk");
    assert_eq!(created.owner_id, OWNER);

    let toggled = controller.toggle(created.id).await.unwrap();
    assert!(toggled.completed);

    let renamed = controller.rename(created.id, "buy oat milk").await.unwrap();
    assert!(matches!(renamed, RenameOutcome::Renamed(ref t) if t.title == "buy oat milk"));

    let report = controller.toggle_all().await;
    assert!(report.is_success());
    assert!(controller.is_all_completed());

    let report = controller.clear_completed().await;
    assert_eq!(report.succeeded.len(), 2);
    assert!(controller.is_empty());
    assert!(controller.visible_todos(Filter::All).is_empty());

    // Only the other owner's todo is left on the server.
    assert_eq!(db.read().await.len(), 1);
}

#[tokio::test]
async fn todo_deleted_elsewhere_fails_without_losing_siblings() {
    let db = Db::default();
    let base_url = serve(db.clone()).await;
    let controller = SyncController::from_config(&config(&base_url));
    controller.load().await.unwrap();

    let first = controller.create("first").await.unwrap();
    let second = controller.create("second").await.unwrap();

    // Another client removes `first` behind our back.
    HttpTransport::new(&base_url).delete(first.id).await.unwrap();

    let report = controller.toggle_all().await;
    assert_eq!(report.succeeded, vec![second.id]);
    assert_eq!(report.failed_ids(), vec![first.id]);
    assert!(matches!(
        report.failed[0],
        SyncError::Network { source: ApiError::NotFound, .. }
    ));

    let todos = controller.current_todos();
    assert_eq!(todos.len(), 2, "the failed todo stays until a reload");
    assert!(!todos[0].completed);
    assert!(todos[1].completed);
    assert!(controller.busy_ids().is_empty());
}

#[tokio::test]
async fn unreachable_server_is_a_network_failure() {
    // Bind and drop to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let controller = SyncController::from_config(&config(&format!("http://127.0.0.1:{port}")));

    let err = controller.load().await.unwrap_err();
    assert!(matches!(err, SyncError::Network { source: ApiError::Transport(_), .. }));
    assert_eq!(controller.error_message().as_deref(), Some("Unable to load todos"));
}
