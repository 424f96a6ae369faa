//! GitHub gist API client.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde_json::Value;
use thiserror::Error;

use crate::app::payload::GistPayload;
use crate::infra::auth::AuthToken;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const GISTS_PATH: &str = "/gists";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GitHub responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("empty JSON response returned by GitHub")]
    EmptyResponse,
    #[error("unexpected JSON result format: {0}")]
    UnexpectedFormat(String),
    #[error("invalid GitHub response, no html_url property: {0}")]
    MissingHtmlUrl(String),
}

/// Something able to create a gist and report its web URL.
pub trait GistTransport: Send + Sync {
    fn create_gist(
        &self,
        payload: &GistPayload,
        auth: Option<&AuthToken>,
    ) -> Result<String, UploadError>;
}

/// Blocking client for the GitHub REST API.
pub struct GithubClient {
    http: Client,
    api_url: String,
}

impl GithubClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self, UploadError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl GistTransport for GithubClient {
    fn create_gist(
        &self,
        payload: &GistPayload,
        auth: Option<&AuthToken>,
    ) -> Result<String, UploadError> {
        let url = format!("{}{GISTS_PATH}", self.api_url);
        let mut request = self
            .http
            .post(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("gistctx/", env!("CARGO_PKG_VERSION")))
            .json(payload);
        if let Some(token) = auth {
            request = request.header(AUTHORIZATION, format!("token {}", token.secret()));
        }

        tracing::debug!(%url, files = payload.file_count(), authenticated = auth.is_some(), "posting gist");
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(UploadError::Status { status, body });
        }
        parse_html_url(&body)
    }
}

/// Extract `html_url` from a create-gist response body.
pub fn parse_html_url(body: &str) -> Result<String, UploadError> {
    if body.trim().is_empty() {
        return Err(UploadError::EmptyResponse);
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|_| UploadError::UnexpectedFormat(body.to_string()))?;
    match value {
        Value::Null => Err(UploadError::EmptyResponse),
        Value::Object(ref object) => object
            .get("html_url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| UploadError::MissingHtmlUrl(value.to_string())),
        other => Err(UploadError::UnexpectedFormat(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_html_url() {
        let url = parse_html_url(r#"{"id":"abc","html_url":"https://gist.github.com/abc"}"#).unwrap();
        assert_eq!(url, "https://gist.github.com/abc");
    }

    #[test]
    fn empty_and_null_bodies_are_empty_responses() {
        assert!(matches!(parse_html_url(""), Err(UploadError::EmptyResponse)));
        assert!(matches!(parse_html_url("null"), Err(UploadError::EmptyResponse)));
    }

    #[test]
    fn non_object_json_is_unexpected() {
        assert!(matches!(parse_html_url("[1, 2]"), Err(UploadError::UnexpectedFormat(_))));
        assert!(matches!(parse_html_url("<html>"), Err(UploadError::UnexpectedFormat(_))));
    }

    #[test]
    fn object_without_url_is_reported() {
        let err = parse_html_url(r#"{"id":"abc"}"#).unwrap_err();
        assert!(matches!(err, UploadError::MissingHtmlUrl(body) if body.contains("abc")));
    }

    #[test]
    fn trims_trailing_slash_from_api_url() {
        let client = GithubClient::new("https://github.example.com/api/v3/").unwrap();
        assert_eq!(client.api_url(), "https://github.example.com/api/v3");
    }
}
