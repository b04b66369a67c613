use std::sync::Arc;

use arraiaware_app_lib::commands::evaluation::{
    evaluation_select_colleague, evaluation_select_section, evaluation_set_answer,
    evaluation_snapshot, evaluation_start, evaluation_submit, evaluation_submit_references,
    AnswerInput,
};
use arraiaware_app_lib::commands::AppState;
use arraiaware_app_lib::config::AppConfig;
use arraiaware_app_lib::models::evaluation::{
    AnswerValue, ReferenceIndication, SectionKey, SectionStatus,
};
use arraiaware_app_lib::models::route::Route;
use arraiaware_app_lib::models::session::{Session, SessionUser};
use arraiaware_app_lib::services::evaluation_session::EvaluationSnapshot;
use arraiaware_app_lib::services::session_store::SessionStore;
use httpmock::prelude::*;
use serde_json::json;
use tempfile::tempdir;

fn session() -> Session {
    Session {
        token: "colab-token".to_string(),
        user: SessionUser {
            id: "u-1".to_string(),
            name: "Ana".to_string(),
            email: None,
            roles: vec!["COLABORADOR".to_string()],
        },
        expires_at: None,
    }
}

fn signed_in_state(server: &MockServer, dir: &std::path::Path) -> AppState {
    let store = Arc::new(SessionStore::in_memory());
    store.login(session()).expect("login");
    AppState::with_store(AppConfig::with_base_url(server.base_url(), dir), store).expect("state")
}

async fn mock_wizard_data(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/criteria");
            then.status(200).json_body(json!([
                { "id": "cr-1", "name": "Entrega", "description": "Cumpre prazos" },
                { "id": "cr-2", "name": "Comunicação" }
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/evaluations/team/u-1")
                .query_param("cycleId", "c-1");
            then.status(200).json_body(json!({
                "peers": [{ "id": "p-1", "name": "Bruno", "role": "Dev", "area": "Produto" }],
                "leaders": [{ "id": "l-1", "name": "Carla" }]
            }));
        })
        .await;
}

fn answer(section: SectionKey, question: &str, value: AnswerValue, colleague: Option<&str>) -> AnswerInput {
    AnswerInput {
        section,
        question_id: question.to_string(),
        value,
        colleague_id: colleague.map(str::to_string),
    }
}

async fn fill_everything(state: &AppState) {
    for question in ["cr-1", "cr-2"] {
        evaluation_set_answer(state, answer(SectionKey::SelfReview, question, AnswerValue::Scale(4), None))
            .await
            .expect("self answer");
    }
    for question in ["deliveryScore", "collaborationScore"] {
        evaluation_set_answer(state, answer(SectionKey::Peer, question, AnswerValue::Scale(5), Some("p-1")))
            .await
            .expect("peer score");
    }
    for question in ["strengths", "improvements"] {
        evaluation_set_answer(
            state,
            answer(SectionKey::Peer, question, AnswerValue::Text("Ótimo".into()), Some("p-1")),
        )
        .await
        .expect("peer text");
    }
    for question in ["deliveryScore", "proactivityScore", "collaborationScore", "skillScore"] {
        evaluation_set_answer(state, answer(SectionKey::Leader, question, AnswerValue::Scale(3), Some("l-1")))
            .await
            .expect("leader score");
    }
    evaluation_set_answer(
        state,
        answer(
            SectionKey::Leader,
            "justification",
            AnswerValue::Text("Boa liderança".into()),
            Some("l-1"),
        ),
    )
    .await
    .expect("leader text");
}

#[tokio::test]
async fn full_wizard_round_trip_over_http() {
    let server = MockServer::start_async().await;
    mock_wizard_data(&server).await;
    let self_post = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/evaluations/self")
                .json_body_partial(r#"{ "cycleId": "c-1", "evaluatorId": "u-1" }"#);
            then.status(201).json_body(json!({ "id": "s-1" }));
        })
        .await;
    let peer_post = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/evaluations/peer")
                .json_body_partial(r#"{ "evaluatedUserId": "p-1" }"#);
            then.status(201).json_body(json!({ "id": "pe-1" }));
        })
        .await;
    let leader_post = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/evaluations/leader")
                .json_body_partial(r#"{ "evaluatedUserId": "l-1" }"#);
            then.status(201).json_body(json!({ "id": "le-1" }));
        })
        .await;
    let references_post = server
        .mock_async(|when, then| {
            when.method(POST).path("/references").json_body(json!({
                "cycleId": "c-1",
                "indicatorId": "u-1",
                "references": [{ "colleagueId": "p-1", "justification": "Referência técnica" }]
            }));
            then.status(201).json_body(json!({ "ok": true }));
        })
        .await;

    let dir = tempdir().expect("temp dir");
    let state = signed_in_state(&server, dir.path());

    let snapshot = evaluation_start(&state, "c-1".to_string()).await.expect("start");
    assert_eq!(snapshot.sections.len(), 4);
    assert_eq!(snapshot.current_section, Some(SectionKey::SelfReview));
    assert_eq!(snapshot.overall_progress, 0);

    let route = evaluation_select_section(&state, 1).await.expect("select");
    assert_eq!(route, Some(Route::Evaluation(SectionKey::Peer)));
    let snapshot = evaluation_select_colleague(&state, Some("p-1".to_string()))
        .await
        .expect("colleague");
    assert_eq!(snapshot.selected_colleague.map(|c| c.name), Some("Bruno".to_string()));

    fill_everything(&state).await;
    let snapshot = evaluation_snapshot(&state).await.expect("snapshot");
    assert_eq!(snapshot.sections[3].status, SectionStatus::NotStarted);
    assert!(!snapshot.can_submit);

    let snapshot = evaluation_submit_references(
        &state,
        vec![ReferenceIndication {
            colleague_id: "p-1".to_string(),
            justification: "Referência técnica".to_string(),
        }],
    )
    .await
    .expect("references");
    assert_eq!(snapshot.sections[3].status, SectionStatus::Complete);
    assert_eq!(snapshot.overall_progress, 100);
    assert!(snapshot.can_submit);

    let route = evaluation_submit(&state).await.expect("submit");
    assert_eq!(route, Route::Home);

    self_post.assert_async().await;
    peer_post.assert_async().await;
    leader_post.assert_async().await;
    // Acknowledged on save, so the final submission does not resend them.
    assert_eq!(references_post.hits_async().await, 1);

    let snapshot = evaluation_snapshot(&state).await.expect("snapshot");
    assert!(snapshot.finished);
    assert!(!snapshot.can_submit);
}

#[tokio::test]
async fn failed_leader_post_is_retried_alone() {
    let server = MockServer::start_async().await;
    mock_wizard_data(&server).await;
    let self_post = server
        .mock_async(|when, then| {
            when.method(POST).path("/evaluations/self");
            then.status(201).json_body(json!({}));
        })
        .await;
    let peer_post = server
        .mock_async(|when, then| {
            when.method(POST).path("/evaluations/peer");
            then.status(201).json_body(json!({}));
        })
        .await;
    let mut leader_down = server
        .mock_async(|when, then| {
            when.method(POST).path("/evaluations/leader");
            then.status(503).json_body(json!({ "message": "Serviço indisponível" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/references");
            then.status(201).json_body(json!({}));
        })
        .await;

    let dir = tempdir().expect("temp dir");
    let state = signed_in_state(&server, dir.path());
    evaluation_start(&state, "c-1".to_string()).await.expect("start");
    fill_everything(&state).await;
    evaluation_submit_references(
        &state,
        vec![ReferenceIndication {
            colleague_id: "l-1".to_string(),
            justification: "Mentora".to_string(),
        }],
    )
    .await
    .expect("references");

    let error = evaluation_submit(&state).await.expect_err("leader down");
    assert_eq!(error.code, "PARTIAL_SUBMISSION");
    assert_eq!(
        error.details.as_ref().and_then(|d| d["failedParts"].as_array()).map(Vec::len),
        Some(1)
    );
    let snapshot = evaluation_snapshot(&state).await.expect("snapshot");
    assert!(!snapshot.finished);
    assert!(snapshot.can_submit);

    leader_down.delete_async().await;
    let leader_up = server
        .mock_async(|when, then| {
            when.method(POST).path("/evaluations/leader");
            then.status(201).json_body(json!({}));
        })
        .await;

    assert_eq!(evaluation_submit(&state).await.expect("retry"), Route::Home);
    assert_eq!(self_post.hits_async().await, 1);
    assert_eq!(peer_post.hits_async().await, 1);
    assert_eq!(leader_up.hits_async().await, 1);
}

async fn mock_two_peer_team(server: &MockServer, team: serde_json::Value) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/criteria");
            then.status(200).json_body(json!([
                { "id": "cr-1", "name": "Entrega" },
                { "id": "cr-2", "name": "Comunicação" }
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/evaluations/team/u-1");
            then.status(200).json_body(team);
        })
        .await;
}

fn colleague_progress(snapshot: &EvaluationSnapshot, id: &str) -> Option<u8> {
    snapshot
        .roster
        .iter()
        .find(|entry| entry.colleague.id == id)
        .map(|entry| entry.progress)
}

async fn answer_peer(state: &AppState, colleague: &str) {
    for question in ["deliveryScore", "collaborationScore"] {
        evaluation_set_answer(state, answer(SectionKey::Peer, question, AnswerValue::Scale(4), Some(colleague)))
            .await
            .expect("peer score");
    }
    for question in ["strengths", "improvements"] {
        evaluation_set_answer(
            state,
            answer(SectionKey::Peer, question, AnswerValue::Text("Colabora bem".into()), Some(colleague)),
        )
        .await
        .expect("peer text");
    }
}

#[tokio::test]
async fn sections_complete_one_step_at_a_time() {
    let server = MockServer::start_async().await;
    mock_two_peer_team(
        &server,
        json!({
            "peers": [{ "id": "p-1", "name": "Bruno" }, { "id": "p-2", "name": "Duda" }],
            "leaders": [{ "id": "l-1", "name": "Carla" }]
        }),
    )
    .await;

    let dir = tempdir().expect("temp dir");
    let state = signed_in_state(&server, dir.path());
    let snapshot = evaluation_start(&state, "c-1".to_string()).await.expect("start");
    assert_eq!(snapshot.sections[0].status, SectionStatus::NotStarted);

    evaluation_set_answer(&state, answer(SectionKey::SelfReview, "cr-1", AnswerValue::Scale(4), None))
        .await
        .expect("first self answer");
    let snapshot = evaluation_snapshot(&state).await.expect("snapshot");
    assert_eq!(snapshot.sections[0].status, SectionStatus::InProgress);

    let snapshot = evaluation_set_answer(
        &state,
        answer(SectionKey::SelfReview, "cr-2", AnswerValue::Scale(5), None),
    )
    .await
    .expect("last self answer");
    assert_eq!(snapshot.sections[0].status, SectionStatus::Complete);
    assert_eq!(snapshot.sections[0].progress, 100);
    assert_eq!(snapshot.sections[1].status, SectionStatus::NotStarted);

    let route = evaluation_select_section(&state, 1).await.expect("advance");
    assert_eq!(route, Some(Route::Evaluation(SectionKey::Peer)));
    evaluation_select_colleague(&state, Some("p-1".to_string()))
        .await
        .expect("colleague");

    answer_peer(&state, "p-1").await;
    let snapshot = evaluation_snapshot(&state).await.expect("snapshot");
    assert_eq!(colleague_progress(&snapshot, "p-1"), Some(100));
    assert_eq!(colleague_progress(&snapshot, "p-2"), Some(0));
    assert_eq!(snapshot.sections[1].status, SectionStatus::InProgress);
    assert_eq!(snapshot.sections[1].progress, 50);

    answer_peer(&state, "p-2").await;
    let snapshot = evaluation_snapshot(&state).await.expect("snapshot");
    assert_eq!(colleague_progress(&snapshot, "p-2"), Some(100));
    assert_eq!(snapshot.sections[1].status, SectionStatus::Complete);
    assert_eq!(snapshot.sections[1].progress, 100);
    assert!(!snapshot.can_submit);
}

#[tokio::test]
async fn backend_availability_limits_navigation() {
    let server = MockServer::start_async().await;
    mock_two_peer_team(
        &server,
        json!({
            "peers": [{ "id": "p-1", "name": "Bruno" }],
            "leaders": [],
            "availableSections": 2
        }),
    )
    .await;

    let dir = tempdir().expect("temp dir");
    let state = signed_in_state(&server, dir.path());
    let snapshot = evaluation_start(&state, "c-1".to_string()).await.expect("start");
    let available: Vec<bool> = snapshot.sections.iter().map(|section| section.available).collect();
    assert_eq!(available, vec![true, true, false, false]);

    assert_eq!(evaluation_select_section(&state, 3).await.expect("blocked"), None);
    assert_eq!(
        evaluation_select_section(&state, 1).await.expect("open"),
        Some(Route::Evaluation(SectionKey::Peer))
    );
}
