use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::cycle::latest_by_start_date;
use crate::models::project::{ProjectCreateInput, ProjectRecord};
use crate::models::session::Session;
use crate::models::user::User;
use crate::services::api_client::ApiClient;
use crate::services::directory_service::DirectoryService;

pub const PROJECT_CREATED_NOTICE: &str = "Projeto criado com sucesso!";

#[derive(Clone)]
pub struct ProjectService {
    client: ApiClient,
}

impl ProjectService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn create_project(
        &self,
        session: &Session,
        input: &ProjectCreateInput,
    ) -> AppResult<ProjectRecord> {
        let record: ProjectRecord = self
            .client
            .post_json(session, "/projects", input, "Erro ao criar projeto")
            .await?;
        info!(
            target: "app::api",
            project_id = record.id.as_deref().unwrap_or("-"),
            collaborators = input.collaborator_ids.len(),
            "project created"
        );
        Ok(record)
    }
}

/// Form state of the "new project" screen.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreationForm {
    manager_id: String,
    cycle_id: Option<String>,
    name: String,
    search_term: String,
    collaborators: Vec<User>,
    selected_ids: Vec<String>,
    loading: bool,
    success: bool,
    error: Option<String>,
}

impl ProjectCreationForm {
    /// `cycle_id` skips the cycle lookup when the caller already knows it.
    pub fn new(manager_id: impl Into<String>, cycle_id: Option<String>) -> Self {
        Self {
            manager_id: manager_id.into(),
            cycle_id: cycle_id.filter(|id| !id.trim().is_empty()),
            ..Self::default()
        }
    }

    /// Loads collaborators and, when needed, the active cycle. Each lookup
    /// fails independently and leaves its part empty.
    pub async fn load(&mut self, directory: &DirectoryService, session: &Session) {
        self.loading = true;
        let needs_cycle = self.cycle_id.is_none();

        let (users, cycles) = tokio::join!(directory.list_users(session), async {
            if needs_cycle {
                directory.list_cycles(session).await.map(Some)
            } else {
                Ok(None)
            }
        });

        match users {
            Ok(users) => self.collaborators = users,
            Err(err) => warn!(target: "app::api", error = %err, "failed to load collaborators"),
        }
        match cycles {
            Ok(Some(cycles)) => {
                self.cycle_id = latest_by_start_date(&cycles).map(|cycle| cycle.id.clone());
            }
            Ok(None) => {}
            Err(err) => warn!(target: "app::api", error = %err, "failed to load cycles"),
        }
        self.loading = false;
    }

    pub fn cycle_id(&self) -> Option<&str> {
        self.cycle_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_string();
    }

    pub fn collaborators(&self) -> &[User] {
        &self.collaborators
    }

    pub fn visible_collaborators(&self) -> Vec<&User> {
        self.collaborators
            .iter()
            .filter(|user| user.matches_search(&self.search_term))
            .collect()
    }

    /// Adds the id to the selection, or removes it when already selected.
    pub fn toggle_collaborator(&mut self, id: &str) {
        if let Some(position) = self.selected_ids.iter().position(|selected| selected == id) {
            self.selected_ids.remove(position);
        } else {
            self.selected_ids.push(id.to_string());
        }
    }

    pub fn selected_ids(&self) -> &[String] {
        &self.selected_ids
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn submit(
        &mut self,
        projects: &ProjectService,
        session: &Session,
    ) -> AppResult<ProjectRecord> {
        self.error = None;
        self.success = false;

        let input = match self.validated_input() {
            Ok(input) => input,
            Err(err) => {
                self.error = Some(err.to_string());
                return Err(err);
            }
        };

        match projects.create_project(session, &input).await {
            Ok(record) => {
                self.success = true;
                self.name.clear();
                self.selected_ids.clear();
                Ok(record)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn validated_input(&self) -> AppResult<ProjectCreateInput> {
        let cycle_id = self
            .cycle_id
            .clone()
            .ok_or_else(|| AppError::validation("Ciclo ainda não carregado."))?;
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Informe o nome do projeto."));
        }
        Ok(ProjectCreateInput {
            name: name.to_string(),
            manager_id: self.manager_id.clone(),
            cycle_id,
            collaborator_ids: self.selected_ids.clone(),
        })
    }
}
