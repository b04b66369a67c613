use tracing::debug;

use crate::error::AppResult;
use crate::models::cycle::{order_for_dashboard, Cycle};
use crate::models::session::Session;
use crate::models::user::User;
use crate::services::api_client::ApiClient;

/// Read-only lookups shared by the panels and the project form.
#[derive(Clone)]
pub struct DirectoryService {
    client: ApiClient,
}

impl DirectoryService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_users(&self, session: &Session) -> AppResult<Vec<User>> {
        let users: Vec<User> = self
            .client
            .get_json(session, "/users", &[], "Falha ao buscar colaboradores.")
            .await?;
        debug!(target: "app::api", count = users.len(), "users loaded");
        Ok(users)
    }

    pub async fn list_cycles(&self, session: &Session) -> AppResult<Vec<Cycle>> {
        let cycles: Vec<Cycle> = self
            .client
            .get_json(
                session,
                "/cycles",
                &[],
                "Falha ao buscar ciclos de avaliação.",
            )
            .await?;
        debug!(target: "app::api", count = cycles.len(), "cycles loaded");
        Ok(cycles)
    }

    /// Cycles as shown on the dashboard: open first, most recent end date next.
    pub async fn list_cycles_for_dashboard(&self, session: &Session) -> AppResult<Vec<Cycle>> {
        let mut cycles = self.list_cycles(session).await?;
        order_for_dashboard(&mut cycles);
        Ok(cycles)
    }
}
