use std::time::{Duration as StdDuration, Instant};

use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiErrorCode, AppError, AppResult};
use crate::models::session::Session;
use crate::utils::redact::redact_payload;

/// Thin wrapper over `reqwest` that owns the base URL and maps every
/// failure onto [`AppError::Api`].
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Some(StdDuration::from_secs(90)))
            .build()
            .map_err(|err| AppError::other(format!("falha ao iniciar o cliente HTTP: {err}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        query: &[(&str, String)],
        fallback: &str,
    ) -> AppResult<T> {
        let request = self
            .client
            .get(self.url(path))
            .bearer_auth(&session.token)
            .query(query);
        let response = self.send("GET", path, request, fallback).await?;
        Self::read_json(response, path).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> AppResult<T> {
        self.log_body(path, body);
        let request = self
            .client
            .post(self.url(path))
            .bearer_auth(&session.token)
            .json(body);
        let response = self.send("POST", path, request, fallback).await?;
        Self::read_json(response, path).await
    }

    /// POST whose response body is irrelevant to the caller.
    pub async fn post_unit<B: Serialize>(
        &self,
        session: &Session,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> AppResult<()> {
        self.log_body(path, body);
        let request = self
            .client
            .post(self.url(path))
            .bearer_auth(&session.token)
            .json(body);
        self.send("POST", path, request, fallback).await.map(|_| ())
    }

    /// Unauthenticated POST used by the login and password-reset flows.
    pub async fn post_public<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> AppResult<T> {
        self.log_body(path, body);
        let request = self.client.post(self.url(path)).json(body);
        let response = self.send("POST", path, request, fallback).await?;
        Self::read_json(response, path).await
    }

    pub async fn post_public_unit<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> AppResult<()> {
        self.log_body(path, body);
        let request = self.client.post(self.url(path)).json(body);
        self.send("POST", path, request, fallback).await.map(|_| ())
    }

    pub async fn delete(&self, session: &Session, path: &str, fallback: &str) -> AppResult<()> {
        let request = self
            .client
            .delete(self.url(path))
            .bearer_auth(&session.token);
        self.send("DELETE", path, request, fallback).await.map(|_| ())
    }

    /// Returns the raw body and the file name advertised by `content-disposition`.
    pub async fn get_bytes(
        &self,
        session: &Session,
        path: &str,
        fallback: &str,
    ) -> AppResult<(Vec<u8>, Option<String>)> {
        let request = self.client.get(self.url(path)).bearer_auth(&session.token);
        let response = self.send("GET", path, request, fallback).await?;
        let file_name = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(file_name_from_disposition);
        let bytes = response.bytes().await.map_err(|err| {
            AppError::api(
                ApiErrorCode::Network,
                format!("Falha ao receber o arquivo: {err}"),
            )
        })?;
        Ok((bytes.to_vec(), file_name))
    }

    pub async fn patch_multipart(
        &self,
        session: &Session,
        path: &str,
        form: reqwest::multipart::Form,
        fallback: &str,
    ) -> AppResult<()> {
        let request = self
            .client
            .patch(self.url(path))
            .bearer_auth(&session.token)
            .multipart(form);
        self.send("PATCH", path, request, fallback).await.map(|_| ())
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        request: RequestBuilder,
        fallback: &str,
    ) -> AppResult<Response> {
        let correlation_id = Uuid::new_v4().to_string();
        debug!(
            target: "app::api",
            method,
            path,
            correlation_id = %correlation_id,
            "sending request"
        );

        let start = Instant::now();
        let response = request
            .header("x-request-id", correlation_id.as_str())
            .send()
            .await
            .map_err(|err| error_from_reqwest(err, &correlation_id))?;

        let status = response.status();
        let latency_ms = start.elapsed().as_millis();
        debug!(
            target: "app::api",
            method,
            path,
            status = status.as_u16(),
            latency_ms,
            correlation_id = %correlation_id,
            "backend responded"
        );

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_http_error(status, &body, fallback, Some(&correlation_id)))
    }

    async fn read_json<T: DeserializeOwned>(response: Response, path: &str) -> AppResult<T> {
        let bytes = response.bytes().await.map_err(|err| {
            AppError::api(
                ApiErrorCode::Network,
                format!("Falha ao ler a resposta do servidor: {err}"),
            )
        })?;
        serde_json::from_slice(&bytes).map_err(|err| {
            tracing::error!(target: "app::api", path, error = %err, "unexpected response shape");
            AppError::api(
                ApiErrorCode::InvalidResponse,
                format!("Resposta inesperada do servidor: {err}"),
            )
        })
    }

    fn log_body<B: Serialize>(&self, path: &str, body: &B) {
        if let Ok(value) = serde_json::to_value(body) {
            debug!(target: "app::api", path, payload = %redact_payload(&value), "request body");
        }
    }
}

/// Pulls a user-facing message out of an error body. NestJS-style backends
/// send either a string or a list of strings under `message`.
pub fn extract_message(body: &str) -> Option<String> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    match value.get("message")? {
        JsonValue::String(message) if !message.trim().is_empty() => Some(message.trim().to_string()),
        JsonValue::Array(items) => {
            let joined = items
                .iter()
                .filter_map(JsonValue::as_str)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
                .join("; ");
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}

pub fn map_http_error(
    status: StatusCode,
    body: &str,
    fallback: &str,
    correlation_id: Option<&str>,
) -> AppError {
    let code = match status {
        StatusCode::UNAUTHORIZED => ApiErrorCode::Unauthorized,
        StatusCode::FORBIDDEN => ApiErrorCode::Forbidden,
        StatusCode::NOT_FOUND => ApiErrorCode::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => {
            ApiErrorCode::InvalidRequest
        }
        status if status.is_server_error() => ApiErrorCode::BackendUnavailable,
        _ => ApiErrorCode::Unknown,
    };
    let message = extract_message(body).unwrap_or_else(|| fallback.to_string());
    AppError::api_with_details(code, Some(status.as_u16()), message, correlation_id)
}

fn error_from_reqwest(err: reqwest::Error, correlation_id: &str) -> AppError {
    if err.is_timeout() {
        AppError::api_with_details(
            ApiErrorCode::HttpTimeout,
            None,
            "O servidor demorou demais para responder.",
            Some(correlation_id),
        )
    } else if err.is_connect() {
        AppError::api_with_details(
            ApiErrorCode::Network,
            None,
            "Não foi possível conectar ao servidor.",
            Some(correlation_id),
        )
    } else if let Some(status) = err.status() {
        map_http_error(status, "", "Erro de rede", Some(correlation_id))
    } else {
        AppError::api_with_details(
            ApiErrorCode::Network,
            None,
            format!("Erro de rede: {err}"),
            Some(correlation_id),
        )
    }
}

/// Joins raw path segments into an endpoint path, percent-encoding each one
/// so ids cannot escape their segment.
pub fn endpoint(segments: &[&str]) -> String {
    let mut url = match Url::parse("http://api.local") {
        Ok(url) => url,
        Err(_) => return format!("/{}", segments.join("/")),
    };
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }
    url.path().to_string()
}

fn file_name_from_disposition(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        let value = part.strip_prefix("filename=")?;
        let value = value.trim_matches('"').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}
