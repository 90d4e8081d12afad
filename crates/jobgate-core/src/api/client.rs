//! API client for the job-board identity backend.
//!
//! This module provides the `ApiClient` struct, which logs users and
//! companies in, registers new accounts, and resolves stored tokens back
//! into profiles.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::{
    AuthError, AuthGrant, Authenticator, Credentials, IdentityKind, Profile, ResolveError,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default base URL when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Login response. The profile is keyed by kind (`user` or `company`).
#[derive(Debug, Deserialize)]
struct LoginResponse<P> {
    token: String,
    #[serde(alias = "user", alias = "company")]
    profile: P,
}

/// "Who am I" response, either wrapped in a kind key or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MeResponse<P> {
    Wrapped {
        #[serde(alias = "user", alias = "company")]
        profile: P,
    },
    Bare(P),
}

impl<P> MeResponse<P> {
    fn into_profile(self) -> P {
        match self {
            MeResponse::Wrapped { profile } => profile,
            MeResponse::Bare(profile) => profile,
        }
    }
}

/// API client for the identity backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for `base_url`
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    /// Page-level collaborators use this to call the job services.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_url(&self, kind: IdentityKind, action: &str) -> String {
        format!("{}{}/{}", self.base_url, kind.auth_path(), action)
    }

    /// Request to an identity endpoint. Only the explicit `bearer` is
    /// attached; the token from `with_token` never goes to `/auth` routes.
    fn auth_request(&self, method: Method, url: &str, bearer: Option<&str>) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        match bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Request to a job-board service path, authorized with the token from
    /// `with_token` if there is one
    pub fn authorized(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let request = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request, retrying with exponential backoff while rate limited
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        bearer: Option<&str>,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = self.auth_request(method.clone(), url, bearer);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            if response.status().as_u16() != 429 {
                return Self::check_response(response).await;
            }

            retries += 1;
            if retries > MAX_RATE_LIMIT_RETRIES {
                return Err(ApiError::RateLimited);
            }
            warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms *= 2;
        }
    }

    async fn json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Authenticate an identity of kind `P::KIND` and return its grant
    pub async fn login<P: Profile>(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthGrant<P>, ApiError> {
        let url = self.auth_url(P::KIND, "login");
        debug!(kind = %P::KIND, url = %url, "Sending login request");
        let response = self.send(Method::POST, &url, None, Some(credentials)).await?;
        let login: LoginResponse<P> = Self::json(response).await?;
        if login.token.is_empty() {
            return Err(ApiError::InvalidResponse(
                "login response carried an empty token".to_string(),
            ));
        }
        Ok(AuthGrant {
            token: login.token,
            profile: login.profile,
        })
    }

    /// Register a new identity of kind `P::KIND`
    pub async fn signup<P: Profile>(&self, fields: &P::Signup) -> Result<(), ApiError> {
        let url = self.auth_url(P::KIND, "signup");
        debug!(kind = %P::KIND, url = %url, "Sending signup request");
        self.send(Method::POST, &url, None, Some(fields)).await?;
        Ok(())
    }

    /// Fetch the profile a token belongs to
    pub async fn whoami<P: Profile>(&self, token: &str) -> Result<P, ApiError> {
        let url = self.auth_url(P::KIND, "me");
        let response = self.send::<()>(Method::GET, &url, Some(token), None).await?;
        let me: MeResponse<P> = Self::json(response).await?;
        Ok(me.into_profile())
    }
}

#[async_trait]
impl<P: Profile> Authenticator<P> for ApiClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthGrant<P>, AuthError> {
        Ok(self.login::<P>(credentials).await?)
    }

    async fn register(&self, fields: &P::Signup) -> Result<(), AuthError> {
        Ok(self.signup::<P>(fields).await?)
    }

    async fn resolve_profile(&self, token: &str) -> Result<P, ResolveError> {
        Ok(self.whoami::<P>(token).await?)
    }
}
