use serde::Deserialize;

use crate::models::evaluation::{AnswerValue, ReferenceIndication, SectionKey};
use crate::models::route::Route;
use crate::services::evaluation_session::EvaluationSnapshot;

use super::{AppState, CommandError, CommandResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub section: SectionKey,
    pub question_id: String,
    pub value: AnswerValue,
    #[serde(default)]
    pub colleague_id: Option<String>,
}

/// Loads criteria and team for `cycle_id` and starts a fresh wizard.
pub async fn evaluation_start(
    state: &AppState,
    cycle_id: String,
) -> CommandResult<EvaluationSnapshot> {
    let session = state.require_session()?;
    let wizard = state.evaluations().start_session(&session, &cycle_id).await?;
    let snapshot = wizard.snapshot();
    *state.evaluation_state().lock().await = Some(wizard);
    Ok(snapshot)
}

pub async fn evaluation_snapshot(state: &AppState) -> CommandResult<EvaluationSnapshot> {
    let guard = state.evaluation_state().lock().await;
    let wizard = guard.as_ref().ok_or_else(CommandError::no_active_evaluation)?;
    Ok(wizard.snapshot())
}

/// Returns the route to navigate to, or `None` when the selection was ignored.
pub async fn evaluation_select_section(
    state: &AppState,
    index: usize,
) -> CommandResult<Option<Route>> {
    let mut guard = state.evaluation_state().lock().await;
    let wizard = guard.as_mut().ok_or_else(CommandError::no_active_evaluation)?;
    Ok(wizard.select_section(index))
}

pub async fn evaluation_select_colleague(
    state: &AppState,
    colleague_id: Option<String>,
) -> CommandResult<EvaluationSnapshot> {
    let mut guard = state.evaluation_state().lock().await;
    let wizard = guard.as_mut().ok_or_else(CommandError::no_active_evaluation)?;
    wizard.select_colleague(colleague_id.as_deref());
    Ok(wizard.snapshot())
}

pub async fn evaluation_set_answer(
    state: &AppState,
    input: AnswerInput,
) -> CommandResult<EvaluationSnapshot> {
    let mut guard = state.evaluation_state().lock().await;
    let wizard = guard.as_mut().ok_or_else(CommandError::no_active_evaluation)?;
    wizard.set_answer(
        input.section,
        &input.question_id,
        input.value,
        input.colleague_id.as_deref(),
    )?;
    Ok(wizard.snapshot())
}

pub async fn evaluation_submit_references(
    state: &AppState,
    references: Vec<ReferenceIndication>,
) -> CommandResult<EvaluationSnapshot> {
    let session = state.require_session()?;
    let service = state.evaluations();
    let mut guard = state.evaluation_state().lock().await;
    let wizard = guard.as_mut().ok_or_else(CommandError::no_active_evaluation)?;
    wizard
        .submit_references(service.as_ref(), &session, references)
        .await?;
    Ok(wizard.snapshot())
}

pub async fn evaluation_submit(state: &AppState) -> CommandResult<Route> {
    let session = state.require_session()?;
    let service = state.evaluations();
    let mut guard = state.evaluation_state().lock().await;
    let wizard = guard.as_mut().ok_or_else(CommandError::no_active_evaluation)?;
    let route = wizard.submit_all(service.as_ref(), &session).await?;
    Ok(route)
}
