use std::sync::{Arc, Mutex};

use arraiaware_app_lib::commands::evaluation::{evaluation_set_answer, evaluation_start, AnswerInput};
use arraiaware_app_lib::commands::history::{history_delete, history_download};
use arraiaware_app_lib::commands::panel::{cycles_list, panel_open, PanelOpenInput};
use arraiaware_app_lib::commands::project::project_form_open;
use arraiaware_app_lib::commands::{AppState, ErrorDisplay};
use arraiaware_app_lib::config::AppConfig;
use arraiaware_app_lib::error::{AppError, AppResult};
use arraiaware_app_lib::models::evaluation::{
    AnswerValue, Colleague, ColleagueEvaluationPayload, ReferenceIndication, ReferencesPayload,
    SectionCatalog, SectionKey, SelfEvaluationPayload,
};
use arraiaware_app_lib::models::session::{Session, SessionUser};
use arraiaware_app_lib::services::evaluation_service::EvaluationGateway;
use arraiaware_app_lib::services::evaluation_session::EvaluationSessionState;
use arraiaware_app_lib::services::session_store::SessionStore;
use async_trait::async_trait;
use httpmock::prelude::*;
use tempfile::tempdir;

#[derive(Default)]
struct CountingGateway {
    calls: Mutex<usize>,
}

impl CountingGateway {
    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn bump(&self) -> AppResult<()> {
        *self.calls.lock().unwrap() += 1;
        Ok(())
    }
}

#[async_trait]
impl EvaluationGateway for CountingGateway {
    async fn submit_self(&self, _: &Session, _: &SelfEvaluationPayload) -> AppResult<()> {
        self.bump()
    }

    async fn submit_peer(&self, _: &Session, _: &ColleagueEvaluationPayload) -> AppResult<()> {
        self.bump()
    }

    async fn submit_leader(&self, _: &Session, _: &ColleagueEvaluationPayload) -> AppResult<()> {
        self.bump()
    }

    async fn submit_references(&self, _: &Session, _: &ReferencesPayload) -> AppResult<()> {
        self.bump()
    }
}

fn session() -> Session {
    Session {
        token: "t".to_string(),
        user: SessionUser {
            id: "u-1".to_string(),
            name: "Ana".to_string(),
            email: None,
            roles: vec![],
        },
        expires_at: None,
    }
}

fn wizard() -> EvaluationSessionState {
    EvaluationSessionState::new(
        "c-1",
        SectionCatalog::default(),
        vec![Colleague {
            id: "p-1".to_string(),
            name: "Bruno".to_string(),
            role: None,
            area: None,
            working_together_since: None,
        }],
        vec![],
    )
}

fn signed_out_state(server: &MockServer, dir: &std::path::Path) -> AppState {
    AppState::with_store(
        AppConfig::with_base_url(server.base_url(), dir),
        Arc::new(SessionStore::in_memory()),
    )
    .expect("state")
}

#[tokio::test]
async fn empty_reference_list_is_rejected_without_a_call() {
    let gateway = CountingGateway::default();
    let mut state = wizard();

    let error = state
        .submit_references(&gateway, &session(), Vec::new())
        .await
        .expect_err("empty list");

    assert!(matches!(error, AppError::Validation { .. }));
    assert_eq!(error.to_string(), "Indique ao menos uma referência.");
    assert_eq!(gateway.calls(), 0);
    assert!(state.references().is_empty());
}

#[tokio::test]
async fn reference_without_justification_is_rejected() {
    let gateway = CountingGateway::default();
    let mut state = wizard();

    let error = state
        .submit_references(
            &gateway,
            &session(),
            vec![ReferenceIndication {
                colleague_id: "p-1".to_string(),
                justification: String::new(),
            }],
        )
        .await
        .expect_err("blank justification");

    assert!(error.is_validation());
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn incomplete_wizard_cannot_be_submitted() {
    let gateway = CountingGateway::default();
    let mut state = wizard();
    state
        .set_answer(SectionKey::SelfReview, "ownership", AnswerValue::Scale(4), None)
        .expect("answer");

    let error = state
        .submit_all(&gateway, &session())
        .await
        .expect_err("incomplete");

    match error {
        AppError::Validation { details, .. } => {
            let details = details.expect("details");
            let sections = details["incompleteSections"]
                .as_array()
                .expect("section list");
            // The leader roster is empty, so only three sections are pending.
            assert_eq!(sections.len(), 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn edits_after_submission_are_rejected() {
    let gateway = CountingGateway::default();
    let mut state = EvaluationSessionState::new("c-1", SectionCatalog::default(), vec![], vec![]);
    for question in ["ownership", "resilience", "teamwork", "learning"] {
        state
            .set_answer(SectionKey::SelfReview, question, AnswerValue::Scale(5), None)
            .expect("scale");
    }
    state
        .set_answer(
            SectionKey::SelfReview,
            "selfJustification",
            AnswerValue::Text("Entreguei tudo".into()),
            None,
        )
        .expect("text");
    state
        .submit_references(
            &gateway,
            &session(),
            vec![ReferenceIndication {
                colleague_id: "x-1".to_string(),
                justification: "Sempre ajuda".to_string(),
            }],
        )
        .await
        .expect("references");

    state.submit_all(&gateway, &session()).await.expect("submitted");
    assert!(state.is_finished());

    let error = state
        .set_answer(SectionKey::SelfReview, "ownership", AnswerValue::Scale(1), None)
        .expect_err("finished");
    assert!(error.is_validation());
}

#[tokio::test]
async fn commands_without_session_fail_locally() {
    let server = MockServer::start_async().await;
    let any_request = server
        .mock_async(|when, then| {
            when.path_contains("/");
            then.status(200).body("[]");
        })
        .await;

    let dir = tempdir().expect("temp dir");
    let state = signed_out_state(&server, dir.path());

    let start = evaluation_start(&state, "c-1".to_string())
        .await
        .expect_err("start");
    assert_eq!(start.code, "UNAUTHENTICATED");

    let panel = panel_open(&state, PanelOpenInput::default())
        .await
        .expect_err("panel");
    assert_eq!(panel.code, "UNAUTHENTICATED");

    let cycles = cycles_list(&state).await.expect_err("cycles");
    assert_eq!(cycles.code, "UNAUTHENTICATED");

    let form = project_form_open(&state, "m-1".to_string(), None)
        .await
        .expect_err("project form");
    assert_eq!(form.code, "UNAUTHENTICATED");

    let delete = history_delete(&state, "h-1".to_string())
        .await
        .expect_err("delete");
    assert_eq!(delete.code, "UNAUTHENTICATED");
    assert_eq!(delete.display, ErrorDisplay::Alert);

    let download = history_download(&state, "h-1".to_string(), dir.path().to_path_buf())
        .await
        .expect_err("download");
    assert_eq!(download.display, ErrorDisplay::Alert);

    assert_eq!(any_request.hits_async().await, 0);
}

#[tokio::test]
async fn wizard_commands_require_a_started_evaluation() {
    let server = MockServer::start_async().await;
    let dir = tempdir().expect("temp dir");
    let state = signed_out_state(&server, dir.path());

    let error = evaluation_set_answer(
        &state,
        AnswerInput {
            section: SectionKey::SelfReview,
            question_id: "ownership".to_string(),
            value: AnswerValue::Scale(3),
            colleague_id: None,
        },
    )
    .await
    .expect_err("no wizard");
    assert_eq!(error.code, "NO_ACTIVE_EVALUATION");
}

#[test]
fn expired_session_counts_as_signed_out() {
    let store = SessionStore::in_memory();
    let mut expired = session();
    expired.expires_at = Some(chrono::Utc::now() - chrono::Duration::minutes(1));
    store.login(expired).expect("login");

    let error = store.require().expect_err("expired");
    assert!(matches!(error, AppError::Unauthenticated));
    assert!(!store.is_authenticated());
}
