use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::character::{CharacterRecord, ClassInfo};
use crate::http_client::http_client;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("character {id} not found")]
    NotFound { id: u32 },
    #[error("http {status} from {url}")]
    Status { status: u16, url: String },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Client(#[from] anyhow::Error),
}

pub fn api_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub fn character_url(base: &str, id: u32) -> String {
    api_url(base, &format!("api/characters/{id}"))
}

pub fn fetch_character(base: &str, id: u32) -> Result<CharacterRecord, FetchError> {
    let url = character_url(base, id);
    let body = get_body(&url).map_err(|err| match err {
        FetchError::Status { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
            FetchError::NotFound { id }
        }
        other => other,
    })?;
    Ok(parse_character_json(&body)?)
}

pub fn fetch_classes(base: &str) -> Result<Vec<ClassInfo>, FetchError> {
    let body = get_body(&api_url(base, "api/classes"))?;
    Ok(parse_classes_json(&body)?)
}

/// Looks up one class in `GET /api/classes`.
pub fn fetch_class(base: &str, class_id: u32) -> Result<Option<ClassInfo>, FetchError> {
    let classes = fetch_classes(base)?;
    Ok(classes.into_iter().find(|c| c.id == class_id))
}

pub fn check_health(base: &str) -> Result<String, FetchError> {
    let body = get_body(&api_url(base, "api/health"))?;
    Ok(parse_health_json(&body)?)
}

fn get_body(url: &str) -> Result<String, FetchError> {
    let client = http_client()?;
    let resp = client
        .get(url)
        .send()
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    resp.text().map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })
}

pub fn parse_character_json(raw: &str) -> Result<CharacterRecord, serde_json::Error> {
    serde_json::from_str(raw.trim())
}

pub fn parse_classes_json(raw: &str) -> Result<Vec<ClassInfo>, serde_json::Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed)
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    status: Option<String>,
}

pub fn parse_health_json(raw: &str) -> Result<String, serde_json::Error> {
    let health: HealthResponse = serde_json::from_str(raw.trim())?;
    Ok(health.status.unwrap_or_else(|| "unknown".to_string()))
}
