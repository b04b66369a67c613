use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::route::Route;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RoleClaim {
    Name(String),
    Object { name: String },
}

impl RoleClaim {
    pub fn name(&self) -> &str {
        match self {
            RoleClaim::Name(name) => name,
            RoleClaim::Object { name } => name,
        }
    }
}

/// Identity carried in the access token's payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleClaim>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(RoleClaim::name).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl SessionUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|value| value.eq_ignore_ascii_case(role))
    }

    pub fn can_open(&self, route: &Route) -> bool {
        let allowed = route.allowed_roles();
        allowed.is_empty() || allowed.iter().any(|role| self.has_role(role))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn from_claims(token: String, claims: TokenClaims) -> Self {
        let roles = claims
            .role_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let name = claims
            .name
            .clone()
            .or_else(|| claims.email.clone())
            .unwrap_or_else(|| claims.sub.clone());
        let expires_at = claims
            .exp
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

        Self {
            token,
            user: SessionUser {
                id: claims.sub,
                name,
                email: claims.email,
                roles,
            },
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInput {
    pub email: String,
}
