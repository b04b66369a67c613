use std::sync::Arc;

use serde::Deserialize;

use crate::models::cycle::Cycle;
use crate::models::panel::{ManagerDashboard, StatusFilter};
use crate::services::evaluations_panel::{fetch_manager_dashboard, EvaluationsPanel, PanelView};

use super::{AppState, CommandError, CommandResult};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelOpenInput {
    /// Present on the manager screen; absent on the HR screen.
    pub manager_id: Option<String>,
    pub cycle_id: Option<String>,
}

fn active_panel(state: &AppState) -> CommandResult<Arc<EvaluationsPanel>> {
    state.current_panel().ok_or_else(|| {
        CommandError::new("NO_ACTIVE_PANEL", "Painel de avaliações não carregado.", None)
    })
}

/// Opens the panel for the given scope, loads its cycle options and first page.
pub async fn panel_open(state: &AppState, input: PanelOpenInput) -> CommandResult<PanelView> {
    let session = state.require_session()?;
    let panel = state.replace_panel(EvaluationsPanel::new(input.manager_id, input.cycle_id));
    let directory = state.directory();
    tokio::join!(
        panel.load_cycles(directory.as_ref(), &session),
        panel.reload(state.client(), &session)
    );
    Ok(panel.view())
}

pub async fn panel_set_search(state: &AppState, term: String) -> CommandResult<PanelView> {
    let panel = active_panel(state)?;
    refresh_if(state, &panel, panel.set_search(&term)).await
}

pub async fn panel_set_status(state: &AppState, status: StatusFilter) -> CommandResult<PanelView> {
    let panel = active_panel(state)?;
    refresh_if(state, &panel, panel.set_status(status)).await
}

pub async fn panel_set_cycle(
    state: &AppState,
    cycle_id: Option<String>,
) -> CommandResult<PanelView> {
    let panel = active_panel(state)?;
    refresh_if(state, &panel, panel.set_cycle_filter(cycle_id.as_deref())).await
}

pub async fn panel_set_page(state: &AppState, page: u32) -> CommandResult<PanelView> {
    let panel = active_panel(state)?;
    refresh_if(state, &panel, panel.set_page(page)).await
}

pub async fn panel_reload(state: &AppState) -> CommandResult<PanelView> {
    let panel = active_panel(state)?;
    refresh_if(state, &panel, true).await
}

async fn refresh_if(
    state: &AppState,
    panel: &EvaluationsPanel,
    changed: bool,
) -> CommandResult<PanelView> {
    if changed {
        let session = state.require_session()?;
        panel.reload(state.client(), &session).await;
    }
    Ok(panel.view())
}

pub async fn manager_dashboard_fetch(
    state: &AppState,
    manager_id: String,
) -> CommandResult<ManagerDashboard> {
    let session = state.require_session()?;
    let dashboard = fetch_manager_dashboard(state.client(), &session, &manager_id).await?;
    Ok(dashboard)
}

/// Cycles ordered for the dashboard cards.
pub async fn cycles_list(state: &AppState) -> CommandResult<Vec<Cycle>> {
    let session = state.require_session()?;
    let cycles = state.directory().list_cycles_for_dashboard(&session).await?;
    Ok(cycles)
}
