use serde::Serialize;
use tracing::debug;

use crate::models::route::Route;
use crate::models::session::{LoginInput, SessionUser};
use crate::services::auth_service::RESET_PASSWORD_NOTICE;

use super::{AppState, CommandResult};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginView {
    pub user: SessionUser,
    pub route: Route,
}

pub async fn auth_login(state: &AppState, input: LoginInput) -> CommandResult<LoginView> {
    let outcome = state.auth().login(input).await?;
    Ok(LoginView {
        user: outcome.session.user,
        route: outcome.route,
    })
}

/// Returns the notice shown after a successful request.
pub async fn auth_reset_password(state: &AppState, email: String) -> CommandResult<String> {
    state.auth().reset_password(&email).await?;
    Ok(RESET_PASSWORD_NOTICE.to_string())
}

pub async fn auth_logout(state: &AppState) -> CommandResult<Route> {
    let route = state.auth().logout()?;
    state.reset_screens().await;
    debug!(target: "app::command", "screen state cleared after logout");
    Ok(route)
}

/// The signed-in user, if any.
pub fn auth_current_user(state: &AppState) -> Option<SessionUser> {
    state.sessions().require().ok().map(|session| session.user)
}

/// Resolves a path for the shell. Signed-out or expired sessions land on
/// login; routes outside the user's roles land on home.
pub fn route_resolve(state: &AppState, path: &str) -> Route {
    let Ok(session) = state.sessions().require() else {
        return Route::Login;
    };
    match Route::parse(path) {
        Route::Login => Route::Home,
        route if session.user.can_open(&route) => route,
        route => {
            debug!(target: "app::command", %route, user = %session.user.id, "route outside user roles");
            Route::Home
        }
    }
}
