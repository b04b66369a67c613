//! Import/export history of the HR screen plus the criteria spreadsheet upload.

use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::history::{DownloadedArtifact, HistoryFromApi, ImportHistoryEntry, Notification};
use crate::models::session::Session;
use crate::services::api_client::{endpoint, ApiClient};

const DEFAULT_DOWNLOAD_NAME: &str = "arquivo";

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    pub entries: Vec<ImportHistoryEntry>,
    pub loading: bool,
    pub error: Option<String>,
    pub downloading_id: Option<String>,
    pub notification: Option<Notification>,
}

#[derive(Debug, Default)]
pub struct HistoryPanel {
    view: HistoryView,
    last_download: Option<DownloadedArtifact>,
}

impl HistoryPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &HistoryView {
        &self.view
    }

    pub fn entries(&self) -> &[ImportHistoryEntry] {
        &self.view.entries
    }

    pub fn last_download(&self) -> Option<&DownloadedArtifact> {
        self.last_download.as_ref()
    }

    /// Reloads the list. Failures land in the view's error string.
    pub async fn refresh(&mut self, client: &ApiClient, session: &Session) -> AppResult<()> {
        self.view.loading = true;
        self.view.error = None;
        let result: AppResult<Vec<HistoryFromApi>> = client
            .get_json(session, "/import-history", &[], "Erro ao buscar histórico")
            .await;
        self.view.loading = false;

        match result {
            Ok(items) => {
                self.view.entries = items.into_iter().map(ImportHistoryEntry::from).collect();
                Ok(())
            }
            Err(err) => {
                self.view.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Deletes an entry, then reloads the list. Once the delete has gone
    /// through, a failed reload is only reported in the view's error string.
    pub async fn delete(&mut self, client: &ApiClient, session: &Session, id: &str) -> AppResult<()> {
        let path = endpoint(&["import-history", id]);
        client
            .delete(session, &path, "Falha ao excluir o registro.")
            .await?;
        info!(target: "app::api", history_id = id, "history entry deleted");
        self.view.entries.retain(|entry| entry.id != id);

        if let Err(err) = self.refresh(client, session).await {
            warn!(target: "app::api", error = %err, "history reload after delete failed");
        }
        Ok(())
    }

    /// Fetches the artifact of an entry. The file name comes from the
    /// response headers, then from the listed entry.
    pub async fn download(
        &mut self,
        client: &ApiClient,
        session: &Session,
        id: &str,
    ) -> AppResult<DownloadedArtifact> {
        self.view.downloading_id = Some(id.to_string());
        let path = endpoint(&["import-history", id, "download"]);
        let result = client
            .get_bytes(session, &path, "Não foi possível baixar o arquivo.")
            .await;
        self.view.downloading_id = None;

        let (bytes, header_name) = result?;
        let file_name = header_name
            .or_else(|| {
                self.view
                    .entries
                    .iter()
                    .find(|entry| entry.id == id)
                    .map(|entry| entry.file.clone())
            })
            .unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string());

        let artifact = DownloadedArtifact { file_name, bytes };
        self.last_download = Some(artifact.clone());
        Ok(artifact)
    }

    /// Writes the last downloaded artifact into `dir` and returns its path.
    pub fn save_download(&self, dir: &Path) -> AppResult<PathBuf> {
        let artifact = self
            .last_download
            .as_ref()
            .ok_or_else(|| AppError::validation("Nenhum arquivo baixado."))?;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(safe_file_name(&artifact.file_name));
        std::fs::write(&path, &artifact.bytes)?;
        info!(target: "app::api", path = %path.display(), "download saved");
        Ok(path)
    }

    /// Uploads a criteria spreadsheet. The outcome is always reported as a
    /// notification, including the missing-session case.
    pub async fn import_criteria(
        &mut self,
        client: &ApiClient,
        session: Option<&Session>,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Notification {
        let notification = match session {
            None => Notification::error(
                "Falha na Autenticação",
                "Por favor, faça login novamente.",
            ),
            Some(session) => match upload_criteria(client, session, file_name, bytes).await {
                Ok(()) => Notification::success("Sucesso!", "Critérios processados com sucesso."),
                Err(err) => {
                    warn!(target: "app::api", error = %err, "criteria import failed");
                    Notification::error("Erro na Importação", err.to_string())
                }
            },
        };
        self.view.notification = Some(notification.clone());
        notification
    }

    pub fn close_notification(&mut self) {
        self.view.notification = None;
    }
}

async fn upload_criteria(
    client: &ApiClient,
    session: &Session,
    file_name: &str,
    bytes: Vec<u8>,
) -> AppResult<()> {
    let part = Part::bytes(bytes).file_name(file_name.to_string());
    let form = Form::new().part("file", part);
    client
        .patch_multipart(session, "/criteria/batch-update", form, "Erro de rede")
        .await
}

fn safe_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|value| value.to_str())
        .map(str::trim)
        .unwrap_or_default();
    if base.is_empty() {
        DEFAULT_DOWNLOAD_NAME.to_string()
    } else {
        base.to_string()
    }
}
