use std::time::Duration as StdDuration;

use arraiaware_app_lib::config::AppConfig;
use arraiaware_app_lib::models::panel::{EvaluationStatus, StatusFilter};
use arraiaware_app_lib::models::session::{Session, SessionUser};
use arraiaware_app_lib::services::api_client::ApiClient;
use arraiaware_app_lib::services::directory_service::DirectoryService;
use arraiaware_app_lib::services::evaluations_panel::{fetch_manager_dashboard, EvaluationsPanel};
use httpmock::prelude::*;
use serde_json::json;

fn session() -> Session {
    Session {
        token: "panel-token".to_string(),
        user: SessionUser {
            id: "m-1".to_string(),
            name: "Gestora".to_string(),
            email: None,
            roles: vec!["GESTOR".to_string()],
        },
        expires_at: None,
    }
}

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&AppConfig::with_base_url(server.base_url(), std::env::temp_dir()))
        .expect("client")
}

fn hr_row(id: &str, name: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "collaborator": { "name": name, "jobTitle": "Dev" },
        "cycle": { "name": "2024.1" },
        "status": status
    })
}

#[tokio::test]
async fn hr_panel_uses_hr_endpoint_and_adapter() {
    let server = MockServer::start_async().await;
    let hr = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rh/evaluations")
                .query_param("page", "1")
                .query_param("limit", "10");
            then.status(200).json_body(json!({
                "data": [hr_row("e-1", "Bruno Lima", "Concluída")],
                "pagination": { "totalPages": 4 }
            }));
        })
        .await;

    let panel = EvaluationsPanel::hr();
    assert!(panel.reload(&client_for(&server), &session()).await);

    hr.assert_async().await;
    let view = panel.view();
    assert_eq!(view.total_pages, 4);
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].collaborator_name, "Bruno Lima");
    assert_eq!(view.rows[0].collaborator_role.as_deref(), Some("Dev"));
    assert_eq!(view.rows[0].status, EvaluationStatus::Completed);
    assert!(!view.loading);
    assert!(view.error.is_none());
}

#[tokio::test]
async fn manager_panel_uses_manager_endpoint_and_fixed_cycle() {
    let server = MockServer::start_async().await;
    let manager = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/dashboard/manager/m-1")
                .query_param("cycleId", "c-7")
                .query_param("page", "1");
            then.status(200).json_body(json!({
                "summary": { "totalCollaborators": 4, "completed": 3, "pending": 1, "overdue": 0 },
                "evaluations": [{
                    "id": "e-9",
                    "collaboratorName": "Carla Dias",
                    "jobTitle": "QA",
                    "cycleName": "2024.2",
                    "status": "Em Atraso"
                }],
                "pagination": { "totalPages": 1 },
                "cycleId": "c-7"
            }));
        })
        .await;

    let panel = EvaluationsPanel::for_manager("m-1", Some("c-7".to_string()));
    assert!(panel.reload(&client_for(&server), &session()).await);

    manager.assert_async().await;
    let view = panel.view();
    assert_eq!(view.rows[0].collaborator_name, "Carla Dias");
    assert_eq!(view.rows[0].status, EvaluationStatus::Overdue);
    let dashboard = view.dashboard.expect("dashboard summary");
    assert_eq!(dashboard.completion_percentage, 75);
    assert_eq!(dashboard.cycle_id.as_deref(), Some("c-7"));
}

#[tokio::test]
async fn search_change_resets_page_and_is_sent() {
    let server = MockServer::start_async().await;
    let filtered = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rh/evaluations")
                .query_param("search", "bruno")
                .query_param("status", "Pendente")
                .query_param("page", "1");
            then.status(200).json_body(json!({
                "data": [hr_row("e-1", "Bruno Lima", "Pendente")],
                "pagination": { "totalPages": 1 }
            }));
        })
        .await;

    let panel = EvaluationsPanel::hr();
    panel.set_page(3);
    assert!(panel.set_status(StatusFilter::Only(EvaluationStatus::Pending)));
    assert!(panel.set_search("bruno"));
    assert_eq!(panel.filters().page, 1);

    assert!(panel.reload(&client_for(&server), &session()).await);
    filtered.assert_async().await;
    assert_eq!(panel.view().rows.len(), 1);
}

#[tokio::test]
async fn stale_response_is_discarded() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rh/evaluations")
                .query_param("search", "an");
            then.status(200)
                .delay(StdDuration::from_millis(600))
                .json_body(json!({
                    "data": [hr_row("old", "Resultado Antigo", "Pendente")],
                    "pagination": { "totalPages": 9 }
                }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rh/evaluations")
                .query_param("search", "ana");
            then.status(200).json_body(json!({
                "data": [hr_row("new", "Ana Souza", "Concluída")],
                "pagination": { "totalPages": 1 }
            }));
        })
        .await;

    let client = client_for(&server);
    let session = session();
    let panel = EvaluationsPanel::hr();

    panel.set_search("an");
    let (first, second) = tokio::join!(panel.reload(&client, &session), async {
        tokio::time::sleep(StdDuration::from_millis(50)).await;
        panel.set_search("ana");
        panel.reload(&client, &session).await
    });

    assert!(!first, "older response must be dropped");
    assert!(second);
    let view = panel.view();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].id, "new");
    assert_eq!(view.total_pages, 1);
}

#[tokio::test]
async fn failed_reload_sets_error_and_panel_recovers() {
    let server = MockServer::start_async().await;
    let mut failing = server
        .mock_async(|when, then| {
            when.method(GET).path("/rh/evaluations");
            then.status(500).body("");
        })
        .await;

    let client = client_for(&server);
    let panel = EvaluationsPanel::hr();
    assert!(panel.reload(&client, &session()).await);
    assert_eq!(panel.view().error.as_deref(), Some("Erro ao buscar dados"));

    failing.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rh/evaluations");
            then.status(200).json_body(json!({ "data": [], "pagination": { "totalPages": 0 } }));
        })
        .await;

    assert!(panel.reload(&client, &session()).await);
    let view = panel.view();
    assert!(view.error.is_none());
    assert!(view.rows.is_empty());
}

#[tokio::test]
async fn cycle_options_and_dashboard_summary() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/cycles");
            then.status(200).json_body(json!([
                { "id": "c-1", "name": "2024.1", "startDate": "2024-01-01", "endDate": "2024-06-30", "status": "Fechado" },
                { "id": "c-2", "name": "2024.2", "startDate": "2024-07-01", "endDate": "2024-12-31", "status": "Aberto" }
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/dashboard/manager/m-1");
            then.status(200).json_body(json!({
                "summary": { "totalCollaborators": 3, "completed": 1, "pending": 1, "overdue": 1 },
                "evaluations": [],
                "pagination": { "totalPages": 0 },
                "cycleId": "c-2"
            }));
        })
        .await;

    let client = client_for(&server);
    let panel = EvaluationsPanel::for_manager("m-1", None);
    panel
        .load_cycles(&DirectoryService::new(client.clone()), &session())
        .await;
    let options = panel.view().cycle_options;
    let names: Vec<&str> = options.iter().map(|option| option.name.as_str()).collect();
    assert_eq!(names, vec!["Todos os Ciclos", "2024.1", "2024.2"]);

    let dashboard = fetch_manager_dashboard(&client, &session(), "m-1")
        .await
        .expect("dashboard");
    assert_eq!(dashboard.summary.overdue, 1);
    assert_eq!(dashboard.completion_percentage, 33);
}
