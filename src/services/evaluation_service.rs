use async_trait::async_trait;
use tracing::debug;

use crate::error::AppResult;
use crate::models::evaluation::{
    ColleagueEvaluationPayload, Criterion, ReferencesPayload, SectionCatalog,
    SelfEvaluationPayload, TeamRoster,
};
use crate::models::session::Session;
use crate::services::api_client::{endpoint, ApiClient};
use crate::services::evaluation_session::EvaluationSessionState;

/// Persistence seam for the evaluation wizard.
#[async_trait]
pub trait EvaluationGateway: Send + Sync {
    async fn submit_self(&self, session: &Session, payload: &SelfEvaluationPayload)
        -> AppResult<()>;

    async fn submit_peer(
        &self,
        session: &Session,
        payload: &ColleagueEvaluationPayload,
    ) -> AppResult<()>;

    async fn submit_leader(
        &self,
        session: &Session,
        payload: &ColleagueEvaluationPayload,
    ) -> AppResult<()>;

    async fn submit_references(
        &self,
        session: &Session,
        payload: &ReferencesPayload,
    ) -> AppResult<()>;
}

#[derive(Clone)]
pub struct EvaluationService {
    client: ApiClient,
}

impl EvaluationService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn fetch_criteria(&self, session: &Session) -> AppResult<Vec<Criterion>> {
        self.client
            .get_json(session, "/criteria", &[], "Falha ao carregar os critérios.")
            .await
    }

    pub async fn fetch_team(&self, session: &Session, cycle_id: &str) -> AppResult<TeamRoster> {
        let path = endpoint(&["evaluations", "team", session.user.id.as_str()]);
        self.client
            .get_json(
                session,
                &path,
                &[("cycleId", cycle_id.to_string())],
                "Falha ao carregar a equipe.",
            )
            .await
    }

    /// Loads criteria and team concurrently and seeds a fresh wizard state.
    pub async fn start_session(
        &self,
        session: &Session,
        cycle_id: &str,
    ) -> AppResult<EvaluationSessionState> {
        let (criteria, team) = tokio::join!(
            self.fetch_criteria(session),
            self.fetch_team(session, cycle_id)
        );
        let criteria = criteria?;
        let team = team?;
        debug!(
            target: "app::evaluation",
            criteria = criteria.len(),
            peers = team.peers.len(),
            leaders = team.leaders.len(),
            "evaluation session loaded"
        );

        let catalog = SectionCatalog::default().with_self_criteria(&criteria);
        let mut state = EvaluationSessionState::new(cycle_id, catalog, team.peers, team.leaders);
        if let Some(count) = team.available_sections {
            state.set_section_availability(count);
        }
        Ok(state)
    }
}

#[async_trait]
impl EvaluationGateway for EvaluationService {
    async fn submit_self(
        &self,
        session: &Session,
        payload: &SelfEvaluationPayload,
    ) -> AppResult<()> {
        self.client
            .post_unit(
                session,
                "/evaluations/self",
                payload,
                "Erro ao enviar a autoavaliação.",
            )
            .await
    }

    async fn submit_peer(
        &self,
        session: &Session,
        payload: &ColleagueEvaluationPayload,
    ) -> AppResult<()> {
        self.client
            .post_unit(
                session,
                "/evaluations/peer",
                payload,
                "Erro ao enviar a avaliação de pares.",
            )
            .await
    }

    async fn submit_leader(
        &self,
        session: &Session,
        payload: &ColleagueEvaluationPayload,
    ) -> AppResult<()> {
        self.client
            .post_unit(
                session,
                "/evaluations/leader",
                payload,
                "Erro ao enviar a avaliação de líderes.",
            )
            .await
    }

    async fn submit_references(
        &self,
        session: &Session,
        payload: &ReferencesPayload,
    ) -> AppResult<()> {
        self.client
            .post_unit(
                session,
                "/references",
                payload,
                "Erro ao salvar as referências.",
            )
            .await
    }
}
