//
//  pampu
//  api/client.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # HTTP Client Wrapper for the Bamboo API
//!
//! This module provides the core HTTP client for interacting with Bamboo.
//! It handles base URL normalization, authentication and request/response
//! serialization.
//!
//! ## Features
//!
//! - REST base at `<bamboo-url>/rest/api/latest/`, keeping any context path
//!   (`https://ci.example.com/bamboo`)
//! - `Accept: application/json` on every request (Bamboo answers XML otherwise)
//! - Bearer token authentication
//! - Error bodies mapped to [`ApiError::Status`] with Bamboo's own message
//! - Custom User-Agent header

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::common::ApiError;
use crate::auth::{AuthCredential, Credentials};

/// Path of the REST API below the Bamboo base URL.
pub const API_PATH: &str = "rest/api/latest";

/// Parses a Bamboo error response and extracts a user-friendly message.
///
/// Bamboo returns errors in the format:
/// ```json
/// {"message": "Human readable message", "status-code": 404}
/// ```
///
/// Some validation failures only carry an `errors` array of strings. If
/// neither is present the canonical reason phrase is used.
///
/// # Parameters
///
/// * `status` - The HTTP status code
/// * `body` - The raw error response body
///
/// # Returns
///
/// Returns an [`ApiError::Status`] carrying status, message and raw body.
pub fn format_api_error(status: StatusCode, body: &str) -> ApiError {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();

    let message = parsed
        .as_ref()
        .and_then(|json| {
            json.get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .or_else(|| {
                    json.get("errors")
                        .and_then(|e| e.as_array())
                        .and_then(|arr| arr.first())
                        .and_then(|e| e.as_str())
                })
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    ApiError::Status {
        status: status.as_u16(),
        message,
        body: body.to_string(),
    }
}

/// The main HTTP client for interacting with Bamboo.
///
/// Resource methods (`list_projects`, `build_status`, `trigger_deploy`, ...)
/// live next to their payload types in [`crate::api::bamboo`] as further
/// `impl BambooClient` blocks.
///
/// # Creating a Client
///
/// ```rust,no_run
/// use pampu::api::BambooClient;
/// use pampu::auth::AuthCredential;
///
/// let client = BambooClient::new("https://bamboo.example.com")?
///     .with_auth(AuthCredential::PersonalAccessToken { token: "token".into() });
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct BambooClient {
    /// The underlying HTTP client
    http: Client,
    /// The Bamboo base URL, without the REST suffix
    base_url: Url,
    /// Optional authentication credentials
    auth: Option<AuthCredential>,
}

impl BambooClient {
    /// Creates a new client for the Bamboo server at `base_url`.
    ///
    /// # Parameters
    ///
    /// * `base_url` - The Bamboo URL as shown in the browser, e.g.
    ///   `https://bamboo.example.com` or `https://ci.example.com/bamboo/`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not an absolute `http(s)` URL or the
    /// HTTP client could not be created.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;

        Ok(Self {
            http: Client::builder()
                .user_agent(format!("pampu/{}", crate::VERSION))
                .build()
                .context("Failed to create HTTP client")?,
            base_url,
            auth: None,
        })
    }

    /// Creates an authenticated client from resolved credentials.
    pub fn from_credentials(credentials: &Credentials) -> Result<Self> {
        Ok(Self::new(&credentials.url)?.with_auth(credentials.auth()))
    }

    /// Sets the authentication credentials for this client.
    pub fn with_auth(mut self, auth: AuthCredential) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Returns the normalized Bamboo base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds an absolute URL below the Bamboo base URL.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use pampu::api::BambooClient;
    ///
    /// let client = BambooClient::new("https://ci.example.com/bamboo/")?;
    /// assert_eq!(
    ///     client.web_url("browse/PROJ-PLAN-1"),
    ///     "https://ci.example.com/bamboo/browse/PROJ-PLAN-1"
    /// );
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn web_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Builds an absolute REST API URL for `path`.
    pub fn api_url(&self, path: &str) -> String {
        self.web_url(&format!("{}/{}", API_PATH, path.trim_start_matches('/')))
    }

    /// Makes an HTTP GET request to a REST API path.
    ///
    /// # Type Parameters
    ///
    /// * `T` - The type to deserialize the response JSON into
    ///
    /// # Parameters
    ///
    /// * `path` - The API path relative to `rest/api/latest` (e.g. `"project"`)
    /// * `query` - Query string pairs
    ///
    /// # Errors
    ///
    /// - [`ApiError::Transport`] if the request could not be sent
    /// - [`ApiError::Status`] if Bamboo answered with a non-2xx status
    /// - [`ApiError::Decode`] if the body does not match `T`
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.api_url(path);
        debug!(method = "GET", %url, "Bamboo request");
        let request = self.http.get(&url).query(query);
        self.execute(request, path).await
    }

    /// Makes an HTTP POST request with a JSON body to a REST API path.
    ///
    /// # Type Parameters
    ///
    /// * `T` - The type to deserialize the response JSON into
    /// * `B` - The type of the request body
    pub async fn post<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.api_url(path);
        debug!(method = "POST", %url, "Bamboo request");
        let request = self.http.post(&url).json(body);
        self.execute(request, path).await
    }

    /// Makes an HTTP POST request whose parameters travel in the query string.
    ///
    /// Bamboo's queue endpoints take their arguments this way and expect an
    /// empty body.
    pub async fn post_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.api_url(path);
        debug!(method = "POST", %url, "Bamboo request");
        let request = self.http.post(&url).query(query);
        self.execute(request, path).await
    }

    /// Downloads a plain-text resource below the Bamboo base URL.
    ///
    /// Used for artifacts served outside the REST API (raw build logs).
    ///
    /// # Returns
    ///
    /// `Ok(Some(text))` for a 200 response with a `text/plain` content type,
    /// `Ok(None)` for any other status or content type (Bamboo serves its
    /// HTML login page when the resource is unavailable).
    pub async fn get_text(&self, path: &str) -> Result<Option<String>, ApiError> {
        let url = self.web_url(path);
        debug!(method = "GET", %url, "Bamboo download");

        let response = self.authorize(self.http.get(&url)).send().await?;
        if response.status() != StatusCode::OK {
            debug!(status = %response.status(), "Download not available");
            return Ok(None);
        }

        let is_text = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("text/plain"))
            .unwrap_or(false);
        if !is_text {
            return Ok(None);
        }

        Ok(Some(response.text().await?))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(auth) => auth.apply_to_request(request),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, ApiError> {
        let request = self.authorize(request.header(ACCEPT, "application/json"));

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(%status, path, "Bamboo error response");
            return Err(format_api_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode(format!("{}: {}", path, e)))
    }
}

/// Parses and validates a Bamboo base URL.
///
/// Query strings and fragments are dropped; the path is kept so Bamboo
/// instances served under a context path work.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let mut url =
        Url::parse(trimmed).with_context(|| format!("Invalid Bamboo URL: '{}'", trimmed))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!(
            "Invalid Bamboo URL: '{}' (expected an http:// or https:// URL)",
            trimmed
        );
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        anyhow::bail!("Invalid Bamboo URL: '{}'", trimmed);
    }

    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Info {
        version: String,
    }

    fn client_for(server: &mockito::ServerGuard) -> BambooClient {
        BambooClient::new(&server.url())
            .unwrap()
            .with_auth(AuthCredential::PersonalAccessToken {
                token: "secret-token".to_string(),
            })
    }

    #[test]
    fn test_api_url_keeps_context_path() {
        let client = BambooClient::new("https://ci.example.com/bamboo/").unwrap();
        assert_eq!(
            client.api_url("/project"),
            "https://ci.example.com/bamboo/rest/api/latest/project"
        );
    }

    #[test]
    fn test_api_url_without_trailing_slash() {
        let client = BambooClient::new("https://bamboo.example.com").unwrap();
        assert_eq!(
            client.api_url("result/PROJ-PLAN-1"),
            "https://bamboo.example.com/rest/api/latest/result/PROJ-PLAN-1"
        );
    }

    #[test]
    fn test_normalize_rejects_non_http() {
        assert!(normalize_base_url("ftp://bamboo.example.com").is_err());
        assert!(normalize_base_url("bamboo.example.com").is_err());
        assert!(normalize_base_url("mailto:ops@example.com").is_err());
    }

    #[test]
    fn test_normalize_drops_query() {
        let url = normalize_base_url(" https://bamboo.example.com/?os_authType=basic ").unwrap();
        assert_eq!(url.as_str(), "https://bamboo.example.com/");
    }

    #[test]
    fn test_format_api_error_message_field() {
        let err = format_api_error(
            StatusCode::NOT_FOUND,
            r#"{"message":"Result PROJ-PLAN-9 not found","status-code":404}"#,
        );
        match err {
            ApiError::Status { status, message, .. } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Result PROJ-PLAN-9 not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_format_api_error_errors_array() {
        let err = format_api_error(
            StatusCode::BAD_REQUEST,
            r#"{"errors":["Version name already exists"],"fieldErrors":{}}"#,
        );
        assert_eq!(
            err.to_string(),
            "Bamboo API error (400): Version name already exists"
        );
    }

    #[test]
    fn test_format_api_error_non_json() {
        let err = format_api_error(StatusCode::BAD_GATEWAY, "<html>proxy</html>");
        match err {
            ApiError::Status { message, body, .. } => {
                assert_eq!(message, "Bad Gateway");
                assert_eq!(body, "<html>proxy</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_sends_accept_and_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/api/latest/info")
            .match_header("accept", "application/json")
            .match_header("authorization", "Bearer secret-token")
            .match_query(Matcher::UrlEncoded("max-result".into(), "5".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"version":"9.6.0"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let info: Info = client
            .get("info", &[("max-result", "5".to_string())])
            .await
            .unwrap();

        assert_eq!(info.version, "9.6.0");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_surfaces_bamboo_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/latest/info")
            .with_status(401)
            .with_body(r#"{"message":"Authentication required","status-code":401}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.get::<Info>("info", &[]).await.unwrap_err();

        assert_eq!(err.status_code(), Some(401));
        assert!(err.to_string().contains("Authentication required"));
    }

    #[tokio::test]
    async fn test_get_schema_mismatch_is_decode() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/latest/info")
            .with_status(200)
            .with_body(r#"{"unexpected":true}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.get::<Info>("info", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_transport_error() {
        // Port 9 (discard) is not listening in test environments
        let client = BambooClient::new("http://127.0.0.1:9").unwrap();
        let err = client.get::<Info>("info", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[tokio::test]
    async fn test_get_text_requires_text_content_type() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/download/PROJ-PLAN-JOB1-7/build_logs/PROJ-PLAN-JOB1-7.log")
            .with_status(200)
            .with_header("content-type", "text/plain;charset=UTF-8")
            .with_body("build started\nbuild finished\n")
            .create_async()
            .await;
        server
            .mock("GET", "/download/PROJ-PLAN-JOB2-7/build_logs/PROJ-PLAN-JOB2-7.log")
            .with_status(200)
            .with_header("content-type", "text/html;charset=UTF-8")
            .with_body("<html>Log in</html>")
            .create_async()
            .await;

        let client = client_for(&server);
        let log = client
            .get_text("download/PROJ-PLAN-JOB1-7/build_logs/PROJ-PLAN-JOB1-7.log")
            .await
            .unwrap();
        assert_eq!(log.as_deref(), Some("build started\nbuild finished\n"));

        let other = client
            .get_text("download/PROJ-PLAN-JOB2-7/build_logs/PROJ-PLAN-JOB2-7.log")
            .await
            .unwrap();
        assert!(other.is_none());
    }
}
