use serde::Serialize;

use crate::models::project::ProjectRecord;
use crate::models::user::User;
use crate::services::project_service::{ProjectCreationForm, PROJECT_CREATED_NOTICE};

use super::{AppState, CommandError, CommandResult};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFormView {
    pub name: String,
    pub cycle_id: Option<String>,
    pub collaborators: Vec<User>,
    pub selected_ids: Vec<String>,
    pub loading: bool,
    pub success: bool,
    pub error: Option<String>,
}

impl From<&ProjectCreationForm> for ProjectFormView {
    fn from(form: &ProjectCreationForm) -> Self {
        Self {
            name: form.name().to_string(),
            cycle_id: form.cycle_id().map(str::to_string),
            collaborators: form.visible_collaborators().into_iter().cloned().collect(),
            selected_ids: form.selected_ids().to_vec(),
            loading: form.is_loading(),
            success: form.success(),
            error: form.error().map(str::to_string),
        }
    }
}

fn no_form() -> CommandError {
    CommandError::new("NO_ACTIVE_FORM", "Formulário de projeto não carregado.", None)
}

pub async fn project_form_open(
    state: &AppState,
    manager_id: String,
    cycle_id: Option<String>,
) -> CommandResult<ProjectFormView> {
    let session = state.require_session()?;
    let mut form = ProjectCreationForm::new(manager_id, cycle_id);
    form.load(state.directory().as_ref(), &session).await;
    let view = ProjectFormView::from(&form);
    *state.project_form().lock().await = Some(form);
    Ok(view)
}

pub async fn project_form_set_name(state: &AppState, name: String) -> CommandResult<ProjectFormView> {
    let mut guard = state.project_form().lock().await;
    let form = guard.as_mut().ok_or_else(no_form)?;
    form.set_name(&name);
    Ok(ProjectFormView::from(&*form))
}

pub async fn project_form_search(state: &AppState, term: String) -> CommandResult<ProjectFormView> {
    let mut guard = state.project_form().lock().await;
    let form = guard.as_mut().ok_or_else(no_form)?;
    form.set_search_term(&term);
    Ok(ProjectFormView::from(&*form))
}

pub async fn project_form_toggle(
    state: &AppState,
    collaborator_id: String,
) -> CommandResult<ProjectFormView> {
    let mut guard = state.project_form().lock().await;
    let form = guard.as_mut().ok_or_else(no_form)?;
    form.toggle_collaborator(&collaborator_id);
    Ok(ProjectFormView::from(&*form))
}

/// Returns the created record and the confirmation notice.
pub async fn project_form_submit(state: &AppState) -> CommandResult<(ProjectRecord, String)> {
    let session = state.require_session()?;
    let projects = state.projects();
    let mut guard = state.project_form().lock().await;
    let form = guard.as_mut().ok_or_else(no_form)?;
    let record = form.submit(projects.as_ref(), &session).await?;
    Ok((record, PROJECT_CREATED_NOTICE.to_string()))
}
