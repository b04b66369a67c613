use std::fmt;

use serde::{Serialize, Serializer};

use crate::models::evaluation::SectionKey;

/// Client-side routes. Unknown paths fall back to the login screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
    Evaluation(SectionKey),
    Rh,
    Committee,
    Manager,
    Dashboard,
    Admin,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Home => "/home".to_string(),
            Route::Evaluation(section) => format!("/avaliacao/{}", section.as_str()),
            Route::Rh => "/RH".to_string(),
            Route::Committee => "/Comite".to_string(),
            Route::Manager => "/Gestor".to_string(),
            Route::Dashboard => "/Dashboard".to_string(),
            Route::Admin => "/admin".to_string(),
        }
    }

    /// Roles allowed to open the route; empty means any signed-in user.
    pub fn allowed_roles(&self) -> &'static [&'static str] {
        match self {
            Route::Login | Route::Home | Route::Evaluation(_) => &[],
            Route::Rh => &["RH", "ADMIN"],
            Route::Committee => &["COMITE", "ADMIN"],
            Route::Manager => &["GESTOR", "ADMIN"],
            Route::Dashboard => &["GESTOR", "RH", "COMITE", "ADMIN"],
            Route::Admin => &["ADMIN"],
        }
    }

    /// Path matching is case-insensitive and ignores a trailing slash.
    pub fn parse(path: &str) -> Self {
        let normalized = path.trim().trim_end_matches('/').to_lowercase();
        let segments: Vec<&str> = normalized
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        match segments.as_slice() {
            ["home"] => Route::Home,
            ["login"] => Route::Login,
            ["avaliacao", section] => SectionKey::parse(section)
                .map(Route::Evaluation)
                .unwrap_or(Route::Login),
            ["rh"] => Route::Rh,
            ["comite"] => Route::Committee,
            ["gestor"] => Route::Manager,
            ["dashboard"] => Route::Dashboard,
            ["admin"] => Route::Admin,
            _ => Route::Login,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path())
    }
}
