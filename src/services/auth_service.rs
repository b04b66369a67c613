use std::sync::Arc;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::route::Route;
use crate::models::session::{LoginInput, LoginResponse, ResetPasswordInput, Session};
use crate::services::api_client::ApiClient;
use crate::services::session_store::SessionStore;
use crate::utils::token::decode_claims;

pub const RESET_PASSWORD_NOTICE: &str =
    "Se o e-mail estiver cadastrado, você receberá instruções para redefinir sua senha.";

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
    store: Arc<SessionStore>,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: Session,
    pub route: Route,
}

impl AuthService {
    pub fn new(client: ApiClient, store: Arc<SessionStore>) -> Self {
        Self { client, store }
    }

    /// Exchanges credentials for a token. The session store is only touched
    /// once the backend accepted the credentials and the token decoded.
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginOutcome> {
        let email = input.email.trim().to_string();
        if email.is_empty() || input.password.is_empty() {
            return Err(AppError::validation("Informe e-mail e senha."));
        }

        let payload = LoginInput {
            email,
            password: input.password,
        };
        let response: LoginResponse = self
            .client
            .post_public(
                "/auth/login",
                &payload,
                "Erro desconhecido. Tente novamente.",
            )
            .await?;

        let claims = decode_claims(&response.access_token)?;
        let session = Session::from_claims(response.access_token, claims);
        self.store.login(session.clone())?;
        info!(target: "app::session", user_id = %session.user.id, "login succeeded");

        Ok(LoginOutcome {
            session,
            route: Route::Home,
        })
    }

    pub async fn reset_password(&self, email: &str) -> AppResult<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::validation("Por favor, informe seu e-mail."));
        }

        self.client
            .post_public_unit(
                "/auth/reset-password",
                &ResetPasswordInput {
                    email: email.to_string(),
                },
                "Erro ao solicitar recuperação de senha. Tente novamente mais tarde.",
            )
            .await
    }

    pub fn logout(&self) -> AppResult<Route> {
        self.store.logout()?;
        Ok(Route::Login)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}
