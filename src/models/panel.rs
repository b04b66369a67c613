use serde::{Deserialize, Serialize};

use crate::models::cycle::Cycle;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EvaluationStatus {
    #[serde(rename = "Concluída")]
    Completed,
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Em Atraso")]
    Overdue,
    #[serde(other)]
    Unknown,
}

impl EvaluationStatus {
    pub fn label(self) -> &'static str {
        match self {
            EvaluationStatus::Completed => "Concluída",
            EvaluationStatus::Pending => "Pendente",
            EvaluationStatus::Overdue => "Em Atraso",
            EvaluationStatus::Unknown => "Desconhecido",
        }
    }
}

/// Status filter of the evaluations panel; `All` sends no `status` parameter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StatusFilter {
    #[default]
    All,
    Only(EvaluationStatus),
}

impl StatusFilter {
    pub fn query_value(self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status.label()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    pub id: String,
    pub name: String,
}

pub const ALL_CYCLES_ID: &str = "all";

pub fn cycle_options(cycles: &[Cycle]) -> Vec<SelectOption> {
    std::iter::once(SelectOption {
        id: ALL_CYCLES_ID.to_string(),
        name: "Todos os Ciclos".to_string(),
    })
    .chain(cycles.iter().map(|cycle| SelectOption {
        id: cycle.id.clone(),
        name: cycle.name.clone(),
    }))
    .collect()
}

/// Normalized row rendered by both the HR and the manager panels.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRow {
    pub id: String,
    pub collaborator_name: String,
    pub collaborator_role: Option<String>,
    pub cycle_name: Option<String>,
    pub status: EvaluationStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationPage {
    pub rows: Vec<EvaluationRow>,
    pub total_pages: u32,
    pub current_page: u32,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDto {
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_items: Option<u64>,
    #[serde(default)]
    pub current_page: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagerSummary {
    #[serde(default)]
    pub total_collaborators: u32,
    #[serde(default)]
    pub completed: u32,
    #[serde(default)]
    pub pending: u32,
    #[serde(default)]
    pub overdue: u32,
}

impl ManagerSummary {
    pub fn completion_percentage(&self) -> u8 {
        if self.total_collaborators == 0 {
            return 0;
        }
        let pct = u64::from(self.completed.min(self.total_collaborators)) * 100
            / u64::from(self.total_collaborators);
        pct as u8
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagerEvaluationDto {
    pub id: String,
    pub collaborator_name: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub cycle_name: Option<String>,
    pub status: EvaluationStatus,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagerDashboardPayload {
    #[serde(default)]
    pub summary: ManagerSummary,
    #[serde(default)]
    pub evaluations: Vec<ManagerEvaluationDto>,
    #[serde(default)]
    pub pagination: PaginationDto,
    #[serde(default)]
    pub cycle_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HrCollaboratorDto {
    pub name: String,
    #[serde(default)]
    pub job_title: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HrCycleDto {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HrEvaluationDto {
    pub id: String,
    pub collaborator: HrCollaboratorDto,
    #[serde(default)]
    pub cycle: Option<HrCycleDto>,
    pub status: EvaluationStatus,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HrEvaluationsPayload {
    #[serde(default)]
    pub data: Vec<HrEvaluationDto>,
    #[serde(default)]
    pub pagination: PaginationDto,
}

impl From<ManagerEvaluationDto> for EvaluationRow {
    fn from(dto: ManagerEvaluationDto) -> Self {
        Self {
            id: dto.id,
            collaborator_name: dto.collaborator_name,
            collaborator_role: dto.job_title,
            cycle_name: dto.cycle_name,
            status: dto.status,
        }
    }
}

impl From<HrEvaluationDto> for EvaluationRow {
    fn from(dto: HrEvaluationDto) -> Self {
        Self {
            id: dto.id,
            collaborator_name: dto.collaborator.name,
            collaborator_role: dto.collaborator.job_title,
            cycle_name: dto.cycle.map(|cycle| cycle.name),
            status: dto.status,
        }
    }
}

/// Manager dashboard header data.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManagerDashboard {
    pub summary: ManagerSummary,
    pub completion_percentage: u8,
    pub cycle_id: Option<String>,
}

impl From<&ManagerDashboardPayload> for ManagerDashboard {
    fn from(payload: &ManagerDashboardPayload) -> Self {
        Self {
            summary: payload.summary,
            completion_percentage: payload.summary.completion_percentage(),
            cycle_id: payload.cycle_id.clone(),
        }
    }
}
