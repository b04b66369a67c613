use std::path::PathBuf;

use crate::models::history::Notification;
use crate::services::history_service::HistoryView;

use super::{AppState, CommandError, CommandResult};

pub async fn history_refresh(state: &AppState) -> CommandResult<HistoryView> {
    let session = state.require_session()?;
    let mut history = state.history().lock().await;
    // A failed refresh is reported through the view's error string.
    let _ = history.refresh(state.client(), &session).await;
    Ok(history.view().clone())
}

/// Deletes an entry and reloads the list. Failures surface as an alert.
pub async fn history_delete(state: &AppState, id: String) -> CommandResult<HistoryView> {
    let session = state
        .require_session()
        .map_err(CommandError::as_alert)?;
    let mut history = state.history().lock().await;
    history
        .delete(state.client(), &session, &id)
        .await
        .map_err(|err| CommandError::from(err).as_alert())?;
    Ok(history.view().clone())
}

/// Downloads an entry's artifact into `target_dir` and returns the written path.
pub async fn history_download(
    state: &AppState,
    id: String,
    target_dir: PathBuf,
) -> CommandResult<PathBuf> {
    let session = state
        .require_session()
        .map_err(CommandError::as_alert)?;
    let mut history = state.history().lock().await;
    history
        .download(state.client(), &session, &id)
        .await
        .map_err(|err| CommandError::from(err).as_alert())?;
    let path = history
        .save_download(&target_dir)
        .map_err(|err| CommandError::from(err).as_alert())?;
    Ok(path)
}

pub async fn criteria_import(state: &AppState, file_name: String, bytes: Vec<u8>) -> Notification {
    let session = state.sessions().require().ok();
    let mut history = state.history().lock().await;
    history
        .import_criteria(state.client(), session.as_ref(), &file_name, bytes)
        .await
}

pub async fn notification_close(state: &AppState) {
    state.history().lock().await.close_notification();
}
