//! Paged evaluations table shared by the HR and manager screens.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::models::panel::{
    cycle_options, EvaluationPage, EvaluationRow, HrEvaluationsPayload, ManagerDashboard,
    ManagerDashboardPayload, SelectOption, StatusFilter, ALL_CYCLES_ID, DEFAULT_PAGE_SIZE,
};
use crate::models::session::Session;
use crate::services::api_client::{endpoint, ApiClient};
use crate::services::directory_service::DirectoryService;

const FETCH_FALLBACK: &str = "Erro ao buscar dados";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PanelFilters {
    pub search: String,
    pub status: StatusFilter,
    /// `None` means every cycle.
    pub cycle_id: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for PanelFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: StatusFilter::All,
            cycle_id: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub filters: PanelFilters,
    pub rows: Vec<EvaluationRow>,
    pub total_pages: u32,
    pub loading: bool,
    pub error: Option<String>,
    pub cycle_options: Vec<SelectOption>,
    pub dashboard: Option<ManagerDashboard>,
}

pub struct EvaluationsPanel {
    manager_id: Option<String>,
    fixed_cycle_id: Option<String>,
    generation: AtomicU64,
    view: Mutex<PanelView>,
}

enum Scope {
    Manager(String),
    Hr,
}

impl EvaluationsPanel {
    pub fn new(manager_id: Option<String>, fixed_cycle_id: Option<String>) -> Self {
        Self {
            manager_id: manager_id.filter(|id| !id.trim().is_empty()),
            fixed_cycle_id: fixed_cycle_id.filter(|id| !id.trim().is_empty()),
            generation: AtomicU64::new(0),
            view: Mutex::new(PanelView {
                cycle_options: cycle_options(&[]),
                ..PanelView::default()
            }),
        }
    }

    pub fn hr() -> Self {
        Self::new(None, None)
    }

    pub fn for_manager(manager_id: impl Into<String>, cycle_id: Option<String>) -> Self {
        Self::new(Some(manager_id.into()), cycle_id)
    }

    pub fn manager_id(&self) -> Option<&str> {
        self.manager_id.as_deref()
    }

    pub fn view(&self) -> PanelView {
        self.lock().clone()
    }

    pub fn filters(&self) -> PanelFilters {
        self.lock().filters.clone()
    }

    /// Each filter setter returns whether the table must be reloaded.
    pub fn set_search(&self, term: &str) -> bool {
        let mut view = self.lock();
        if view.filters.search == term {
            return false;
        }
        view.filters.search = term.to_string();
        view.filters.page = 1;
        true
    }

    pub fn set_status(&self, status: StatusFilter) -> bool {
        let mut view = self.lock();
        if view.filters.status == status {
            return false;
        }
        view.filters.status = status;
        view.filters.page = 1;
        true
    }

    /// `None` or the "all" option clears the cycle filter.
    pub fn set_cycle_filter(&self, cycle_id: Option<&str>) -> bool {
        let cycle_id = cycle_id
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != ALL_CYCLES_ID)
            .map(str::to_string);
        let mut view = self.lock();
        if view.filters.cycle_id == cycle_id {
            return false;
        }
        view.filters.cycle_id = cycle_id;
        view.filters.page = 1;
        true
    }

    pub fn set_page(&self, page: u32) -> bool {
        let page = page.max(1);
        let mut view = self.lock();
        if view.filters.page == page {
            return false;
        }
        view.filters.page = page;
        true
    }

    /// Query parameters for the current filters.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let filters = self.filters();
        build_query(&filters, self.fixed_cycle_id.as_deref())
    }

    /// Fetches the page for the current filters. Returns `false` when a newer
    /// reload was issued meanwhile and this response was dropped.
    pub async fn reload(&self, client: &ApiClient, session: &Session) -> bool {
        let (generation, query, current_page) = {
            let mut view = self.lock();
            view.loading = true;
            view.error = None;
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            (
                generation,
                build_query(&view.filters, self.fixed_cycle_id.as_deref()),
                view.filters.page,
            )
        };

        let scope = match &self.manager_id {
            Some(id) => Scope::Manager(id.clone()),
            None => Scope::Hr,
        };
        let result = fetch_page(client, session, &scope, &query, current_page).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(
                target: "app::api",
                generation,
                "discarding stale evaluations response"
            );
            return false;
        }

        let mut view = self.lock();
        view.loading = false;
        match result {
            Ok((page, dashboard)) => {
                view.rows = page.rows;
                view.total_pages = page.total_pages;
                if dashboard.is_some() {
                    view.dashboard = dashboard;
                }
            }
            Err(err) => {
                warn!(target: "app::api", error = %err, "evaluations reload failed");
                view.error = Some(err.to_string());
            }
        }
        true
    }

    /// Fills the cycle filter options. A failure keeps the "all" option only.
    pub async fn load_cycles(&self, directory: &DirectoryService, session: &Session) {
        match directory.list_cycles(session).await {
            Ok(cycles) => self.lock().cycle_options = cycle_options(&cycles),
            Err(err) => {
                warn!(target: "app::api", error = %err, "failed to load cycle options");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, PanelView> {
        self.view
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn build_query(filters: &PanelFilters, fixed_cycle_id: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    let search = filters.search.trim();
    if !search.is_empty() {
        query.push(("search", search.to_string()));
    }
    if let Some(status) = filters.status.query_value() {
        query.push(("status", status.to_string()));
    }
    if let Some(cycle_id) = filters.cycle_id.as_deref().or(fixed_cycle_id) {
        query.push(("cycleId", cycle_id.to_string()));
    }
    query.push(("page", filters.page.to_string()));
    query.push(("limit", filters.page_size.to_string()));
    query
}

async fn fetch_page(
    client: &ApiClient,
    session: &Session,
    scope: &Scope,
    query: &[(&'static str, String)],
    current_page: u32,
) -> AppResult<(EvaluationPage, Option<ManagerDashboard>)> {
    match scope {
        Scope::Manager(manager_id) => {
            let path = endpoint(&["dashboard", "manager", manager_id.as_str()]);
            let payload: ManagerDashboardPayload = client
                .get_json(session, &path, query, FETCH_FALLBACK)
                .await?;
            let dashboard = ManagerDashboard::from(&payload);
            let page = EvaluationPage {
                rows: payload.evaluations.into_iter().map(Into::into).collect(),
                total_pages: payload.pagination.total_pages,
                current_page,
            };
            Ok((page, Some(dashboard)))
        }
        Scope::Hr => {
            let payload: HrEvaluationsPayload = client
                .get_json(session, "/rh/evaluations", query, FETCH_FALLBACK)
                .await?;
            let page = EvaluationPage {
                rows: payload.data.into_iter().map(Into::into).collect(),
                total_pages: payload.pagination.total_pages,
                current_page,
            };
            Ok((page, None))
        }
    }
}

/// Summary header of the manager dashboard.
pub async fn fetch_manager_dashboard(
    client: &ApiClient,
    session: &Session,
    manager_id: &str,
) -> AppResult<ManagerDashboard> {
    let path = endpoint(&["dashboard", "manager", manager_id]);
    let payload: ManagerDashboardPayload = client
        .get_json(
            session,
            &path,
            &[("page", "1".to_string()), ("limit", DEFAULT_PAGE_SIZE.to_string())],
            "Erro ao carregar o painel do gestor.",
        )
        .await?;
    Ok(ManagerDashboard::from(&payload))
}
