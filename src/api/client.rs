//! HTTP client for the week/shift API.
//!
//! Uses reqwest with optional Bearer token auth. Paths are appended to the
//! configured base URL: `/weeks/{id}`, `/weeks/upsert`, `/shifts/{id}`.
//! No retries: a failed request surfaces immediately.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use super::WeekApi;
use crate::config::{ClientConfig, ConfigError};
use crate::error::ApiError;
use crate::types::{Envelope, ErrorBody, PublishWeekPayload, PublishedWeek, ShiftId, Week};
use crate::week::WeekId;

pub struct HttpWeekApi {
    client: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpWeekApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: "URL cannot be a base".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        endpoint(&self.base_url, segments)
    }

    /// Send and return the body of a 2xx response.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let request = match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let err = server_error(status, &body);
            log::warn!("week API error {}: {}", status, err);
            return Err(err);
        }
        Ok(body)
    }
}

#[async_trait]
impl WeekApi for HttpWeekApi {
    async fn get_week_by_id(&self, id: WeekId) -> Result<Week, ApiError> {
        let url = self.endpoint(&["weeks", &id.to_string()]);
        let body = self.send(self.client.get(url)).await?;
        decode_week(&body, id)
    }

    async fn publish_week(&self, payload: &PublishWeekPayload) -> Result<PublishedWeek, ApiError> {
        let url = self.endpoint(&["weeks", "upsert"]);
        let body = self.send(self.client.post(url).json(payload)).await?;
        decode_published_week(&body)
    }

    async fn delete_shift_by_id(&self, id: &ShiftId) -> Result<(), ApiError> {
        let url = self.endpoint(&["shifts", id.as_str()]);
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}

fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    // cannot_be_a_base URLs are rejected in HttpWeekApi::new
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Decode a `GET /weeks/{id}` body, rejecting a week other than the one asked for.
pub fn decode_week(body: &str, requested: WeekId) -> Result<Week, ApiError> {
    let week = serde_json::from_str::<Envelope<Week>>(body)?.results;
    if week.id != requested {
        return Err(ApiError::MalformedResponse(format!(
            "requested week {} but received week {}",
            requested, week.id
        )));
    }
    Ok(week)
}

pub fn decode_published_week(body: &str) -> Result<PublishedWeek, ApiError> {
    Ok(serde_json::from_str::<Envelope<PublishedWeek>>(body)?.results)
}

/// Build the error for a non-2xx response: the body's `message`, else the raw
/// body, else the status reason.
pub fn server_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
        });

    ApiError::Server {
        status: status.as_u16(),
        message,
    }
}
