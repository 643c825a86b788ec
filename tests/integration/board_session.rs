//! End-to-end tests for the board session controller against a mock
//! sheet endpoint: discovery, optimistic mutations, debounced saves,
//! and failure surfacing.
//!
//! These run on real (unpaused) time with a shortened quiet window,
//! since wiremock does actual socket I/O.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sheetboard::gateway::{GatewayConfig, SheetGateway};
use sheetboard::session::{BoardSession, DropEvent, SessionError};
use sheetboard::store::{StatusSet, TaskDraft};
use sheetboard_proto::TaskId;

/// Quiet window short enough to keep tests fast, long enough to batch.
const QUIET_WINDOW: Duration = Duration::from_millis(100);

fn session_for(server: &MockServer) -> BoardSession {
    let gateway =
        Arc::new(SheetGateway::new(&server.uri(), &GatewayConfig::default()).unwrap());
    BoardSession::new(gateway, StatusSet::default(), QUIET_WINDOW)
}

/// Waits out the quiet window and the write, folding driver events
/// into the session as they arrive.
async fn settle(session: &mut BoardSession) {
    tokio::time::sleep(QUIET_WINDOW * 2).await;
    for _ in 0..40 {
        session.drain_sync_events();
        if !session.is_saving() {
            return;
        }
        tokio::time::sleep(QUIET_WINDOW / 2).await;
    }
    panic!("sync never settled");
}

fn mount_boards(names: &[&str]) -> Mock {
    Mock::given(method("GET"))
        .and(query_param("action", "getSheetNames"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": names,
        })))
}

fn mount_tasks(data: serde_json::Value) -> Mock {
    Mock::given(method("GET"))
        .and(query_param("action", "getTasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": data,
        })))
}

fn mount_save_ok() -> Mock {
    Mock::given(method("POST")).respond_with(
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "success"})),
    )
}

/// Parses the `payload` arrays of all saveTasks POSTs the server saw.
async fn saved_payloads(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["payload"].clone()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Startup and loading
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_discovers_boards_and_loads_the_first() {
    let server = MockServer::start().await;
    mount_boards(&["Projeto A", "Projeto B"]).mount(&server).await;
    mount_tasks(serde_json::json!([
        {"id": "task-1", "Tarefa": "Draft spec", "Status": "A Fazer"},
    ]))
    .mount(&server)
    .await;

    let mut session = session_for(&server);
    session.start().await;

    assert_eq!(session.boards(), ["Projeto A", "Projeto B"]);
    assert_eq!(session.current_board(), Some("Projeto A"));
    assert_eq!(session.tasks().len(), 1);
    assert!(!session.is_loading());
    assert!(session.last_error().is_none());

    // The load went to the first board specifically.
    let requests = server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .any(|r| r.url.query_pairs().any(|(k, v)| k == "sheetName" && v == "Projeto A"))
    );
}

#[tokio::test]
async fn empty_board_list_is_a_valid_quiet_state() {
    let server = MockServer::start().await;
    mount_boards(&[]).mount(&server).await;

    let mut session = session_for(&server);
    session.start().await;

    assert!(session.boards().is_empty());
    assert!(session.current_board().is_none());
    assert!(!session.is_loading());
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn read_failure_leaves_empty_collection_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("action", "getTasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "error",
            "message": "x",
        })))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session.load_board(Some("Projeto A".to_string())).await;

    assert!(session.tasks().is_empty());
    assert!(!session.is_loading());
    assert_eq!(session.last_error(), Some("Falha ao carregar tarefas: x"));

    session.clear_error();
    assert!(session.last_error().is_none());
}

// ---------------------------------------------------------------------------
// Optimistic mutations and the debounced save
// ---------------------------------------------------------------------------

#[tokio::test]
async fn burst_of_creates_persists_once_with_final_state() {
    let server = MockServer::start().await;
    mount_tasks(serde_json::json!([])).mount(&server).await;
    mount_save_ok().expect(1).mount(&server).await;

    let mut session = session_for(&server);
    session.load_board(Some("Projeto A".to_string())).await;

    session.create_task(TaskDraft::new("um")).unwrap();
    session.create_task(TaskDraft::new("dois")).unwrap();
    session.create_task(TaskDraft::new("três")).unwrap();
    assert_eq!(session.tasks().len(), 3);

    session.drain_sync_events();
    settle(&mut session).await;

    let payloads = saved_payloads(&server).await;
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].as_array().unwrap().len(), 3);
    assert_eq!(payloads[0][2]["Tarefa"], "três");
    assert_eq!(payloads[0][2]["Status"], "A Fazer");
}

#[tokio::test]
async fn move_persists_only_the_status_change() {
    let server = MockServer::start().await;
    mount_tasks(serde_json::json!([
        {"id": "task-1", "Tarefa": "Draft spec", "Descrição": "detalhes", "Status": "A Fazer"},
        {"id": "task-2", "Tarefa": "Outra", "Status": "Pronto"},
    ]))
    .mount(&server)
    .await;
    mount_save_ok().mount(&server).await;

    let mut session = session_for(&server);
    session.load_board(Some("Projeto A".to_string())).await;

    session
        .move_task(DropEvent {
            task_id: TaskId::new("task-1"),
            from_status: "A Fazer".to_string(),
            to_status: "Bloqueado".to_string(),
            from_index: 0,
            to_index: 0,
        })
        .unwrap();

    // Optimistic: local state moved before any write.
    assert_eq!(session.tasks()[0].status, "Bloqueado");
    assert_eq!(session.tasks()[0].title, "Draft spec");

    settle(&mut session).await;

    let payloads = saved_payloads(&server).await;
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0][0]["Status"], "Bloqueado");
    assert_eq!(payloads[0][0]["Tarefa"], "Draft spec");
    assert_eq!(payloads[0][0]["Descrição"], "detalhes");
    assert_eq!(payloads[0][1]["Status"], "Pronto");
}

#[tokio::test]
async fn write_failure_keeps_local_state_and_surfaces_message() {
    let server = MockServer::start().await;
    mount_tasks(serde_json::json!([])).mount(&server).await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "error"})),
        )
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session.load_board(Some("Projeto A".to_string())).await;

    session.create_task(TaskDraft::new("fica local")).unwrap();
    let before = session.tasks().to_vec();

    settle(&mut session).await;

    assert!(!session.is_saving());
    assert_eq!(session.tasks(), before.as_slice());
    assert_eq!(session.last_error(), Some("Falha ao salvar: Erro na API."));
}

#[tokio::test]
async fn switching_boards_drops_the_pending_write() {
    let server = MockServer::start().await;
    mount_tasks(serde_json::json!([])).mount(&server).await;
    mount_save_ok().expect(0).mount(&server).await;

    let mut session = session_for(&server);
    session.load_board(Some("Projeto A".to_string())).await;
    session.create_task(TaskDraft::new("nunca salvo")).unwrap();

    // Switch before the quiet window elapses.
    session.load_board(Some("Projeto B".to_string())).await;
    tokio::time::sleep(QUIET_WINDOW * 4).await;

    assert_eq!(saved_payloads(&server).await.len(), 0);
    assert_eq!(session.current_board(), Some("Projeto B"));
}

// ---------------------------------------------------------------------------
// Board creation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_board_name_never_reaches_the_network() {
    let server = MockServer::start().await;
    mount_boards(&["Projeto A"]).mount(&server).await;
    mount_tasks(serde_json::json!([])).mount(&server).await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session.start().await;

    let result = session.create_board("PROJETO a").await;
    assert!(matches!(result, Err(SessionError::DuplicateBoard(_))));
    assert_eq!(session.boards(), ["Projeto A"]);
}

#[tokio::test]
async fn create_board_appends_and_switches() {
    let server = MockServer::start().await;
    mount_boards(&["Projeto A"]).mount(&server).await;
    mount_tasks(serde_json::json!([])).mount(&server).await;
    mount_save_ok().mount(&server).await;

    let mut session = session_for(&server);
    session.start().await;

    session.create_board("Projeto B").await.unwrap();
    assert_eq!(session.boards(), ["Projeto A", "Projeto B"]);
    assert_eq!(session.current_board(), Some("Projeto B"));
}
