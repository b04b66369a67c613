pub mod auth;
pub mod evaluation;
pub mod history;
pub mod panel;
pub mod project;

use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, warn};

use crate::config::AppConfig;
use crate::error::{ApiErrorCode, AppError, AppResult};
use crate::models::session::Session;
use crate::services::api_client::ApiClient;
use crate::services::auth_service::AuthService;
use crate::services::directory_service::DirectoryService;
use crate::services::evaluation_service::EvaluationService;
use crate::services::evaluation_session::EvaluationSessionState;
use crate::services::evaluations_panel::EvaluationsPanel;
use crate::services::history_service::HistoryPanel;
use crate::services::project_service::{ProjectCreationForm, ProjectService};
use crate::services::session_store::SessionStore;

/// Everything the command functions share. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    client: ApiClient,
    session_store: Arc<SessionStore>,
    auth_service: Arc<AuthService>,
    directory_service: Arc<DirectoryService>,
    evaluation_service: Arc<EvaluationService>,
    project_service: Arc<ProjectService>,
    evaluation: Arc<AsyncMutex<Option<EvaluationSessionState>>>,
    evaluations_panel: Arc<RwLock<Option<Arc<EvaluationsPanel>>>>,
    project_form: Arc<AsyncMutex<Option<ProjectCreationForm>>>,
    history: Arc<AsyncMutex<HistoryPanel>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let session_store = Arc::new(SessionStore::with_file(config.session_file())?);
        Self::with_store(config, session_store)
    }

    /// State backed by an existing store, e.g. an in-memory one.
    pub fn with_store(config: AppConfig, session_store: Arc<SessionStore>) -> AppResult<Self> {
        let client = ApiClient::new(&config)?;
        let auth_service = Arc::new(AuthService::new(
            client.clone(),
            Arc::clone(&session_store),
        ));
        let directory_service = Arc::new(DirectoryService::new(client.clone()));
        let evaluation_service = Arc::new(EvaluationService::new(client.clone()));
        let project_service = Arc::new(ProjectService::new(client.clone()));

        Ok(Self {
            config: Arc::new(config),
            client,
            session_store,
            auth_service,
            directory_service,
            evaluation_service,
            project_service,
            evaluation: Arc::new(AsyncMutex::new(None)),
            evaluations_panel: Arc::new(RwLock::new(None)),
            project_form: Arc::new(AsyncMutex::new(None)),
            history: Arc::new(AsyncMutex::new(HistoryPanel::new())),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn sessions(&self) -> Arc<SessionStore> {
        Arc::clone(&self.session_store)
    }

    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth_service)
    }

    pub fn directory(&self) -> Arc<DirectoryService> {
        Arc::clone(&self.directory_service)
    }

    pub fn evaluations(&self) -> Arc<EvaluationService> {
        Arc::clone(&self.evaluation_service)
    }

    pub fn projects(&self) -> Arc<ProjectService> {
        Arc::clone(&self.project_service)
    }

    /// The authenticated session, or `UNAUTHENTICATED` without any request.
    pub fn require_session(&self) -> CommandResult<Session> {
        self.session_store.require().map_err(CommandError::from)
    }

    pub(crate) fn evaluation_state(&self) -> &AsyncMutex<Option<EvaluationSessionState>> {
        &self.evaluation
    }

    pub(crate) fn project_form(&self) -> &AsyncMutex<Option<ProjectCreationForm>> {
        &self.project_form
    }

    pub(crate) fn history(&self) -> &AsyncMutex<HistoryPanel> {
        &self.history
    }

    pub(crate) fn current_panel(&self) -> Option<Arc<EvaluationsPanel>> {
        self.evaluations_panel
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub(crate) fn replace_panel(&self, panel: EvaluationsPanel) -> Arc<EvaluationsPanel> {
        let panel = Arc::new(panel);
        *self
            .evaluations_panel
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::clone(&panel));
        panel
    }

    /// Drops every per-user screen state, used on logout.
    pub(crate) async fn reset_screens(&self) {
        *self.evaluation.lock().await = None;
        *self.project_form.lock().await = None;
        *self.history.lock().await = HistoryPanel::new();
        *self
            .evaluations_panel
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

/// How the shell should surface an error: next to the form, or as a blocking alert.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorDisplay {
    #[default]
    Inline,
    Alert,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
    pub display: ErrorDisplay,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
            display: ErrorDisplay::Inline,
        }
    }

    pub fn as_alert(mut self) -> Self {
        self.display = ErrorDisplay::Alert;
        self
    }

    pub fn no_active_evaluation() -> Self {
        CommandError::new(
            "NO_ACTIVE_EVALUATION",
            "Nenhuma avaliação em andamento.",
            None,
        )
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Unauthenticated => CommandError::new(
                ApiErrorCode::Unauthenticated.as_str(),
                "Você não está autenticado.",
                None,
            ),
            AppError::Validation {
                message, details, ..
            } => CommandError::new("VALIDATION_ERROR", message, details),
            AppError::Api {
                code,
                status,
                message,
                correlation_id,
            } => {
                let mut merged = JsonMap::new();
                if let Some(status) = status {
                    merged.insert("status".to_string(), JsonValue::from(status));
                }
                if let Some(id) = correlation_id {
                    merged.insert("correlationId".to_string(), JsonValue::String(id));
                }
                let detail_value = if merged.is_empty() {
                    None
                } else {
                    Some(JsonValue::Object(merged))
                };
                CommandError::new(code.as_str(), message, detail_value)
            }
            AppError::PartialSubmission {
                failed_parts,
                messages,
            } => {
                warn!(target: "app::command", failed = ?failed_parts, "partial submission in command");
                let message = format!("Falha ao enviar: {}", failed_parts.join(", "));
                CommandError::new(
                    "PARTIAL_SUBMISSION",
                    message,
                    Some(serde_json::json!({
                        "failedParts": failed_parts,
                        "messages": messages,
                    })),
                )
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "Falha ao processar os dados.", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "Falha ao ler ou gravar arquivos.", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}
