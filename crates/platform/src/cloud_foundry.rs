//! Cloud Foundry v2 implementation of [`PlatformProbe`].
//!
//! Authenticates against UAA with the password grant (public `cf` client) and
//! caches the bearer token until shortly before it expires. A 401 from the API
//! drops the cached token so the next call re-authenticates.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use havoc_core::config::PlatformConfig;

use crate::error::PlatformError;
use crate::probe::{InstanceState, InstanceStates, PlatformProbe};

/// Refresh this long before UAA says the token expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct InstanceInfo {
    state: InstanceState,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

pub struct CloudFoundryClient {
    http: reqwest::Client,
    api_address: String,
    login_address: String,
    username: String,
    password: String,
    token: Mutex<Option<CachedToken>>,
}

impl CloudFoundryClient {
    /// Build a client from resolved platform credentials.
    pub fn new(config: &PlatformConfig) -> Result<Self, PlatformError> {
        if !config.is_configured() {
            return Err(PlatformError::NotConfigured(
                "domain and username are required".to_string(),
            ));
        }
        Self::with_endpoints(
            config.api_address(),
            config.login_address(),
            config.username.clone().unwrap_or_default(),
            config.password.clone().unwrap_or_default(),
            config.skip_ssl_validation,
        )
    }

    /// Build a client against explicit API and login base URLs.
    pub fn with_endpoints(
        api_address: impl Into<String>,
        login_address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        skip_ssl_validation: bool,
    ) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(skip_ssl_validation)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_address: api_address.into().trim_end_matches('/').to_string(),
            login_address: login_address.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, PlatformError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let url = format!("{}/oauth/token", self.login_address);
        debug!("UAA token request to {}", url);
        let response = self
            .http
            .post(&url)
            .basic_auth("cf", Some(""))
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "password"),
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Auth(format!("{}: {}", status.as_u16(), body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Parse(format!("token response: {e}")))?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        info!(expires_in = token.expires_in, "obtained platform access token");

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.token.lock().await.take();
        }
        let body = response.text().await.unwrap_or_default();
        Err(PlatformError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

/// Convert the `/v2/apps/:guid/instances` body into indexed states.
/// Keys that are not integers map to index 0.
fn parse_instance_states(body: HashMap<String, InstanceInfo>) -> InstanceStates {
    body.into_iter()
        .map(|(key, info)| (key.parse().unwrap_or(0), info.state))
        .collect()
}

#[async_trait]
impl PlatformProbe for CloudFoundryClient {
    async fn list_instance_states(&self, app_id: &str) -> Result<InstanceStates, PlatformError> {
        let token = self.access_token().await?;
        let url = format!("{}/v2/apps/{}/instances", self.api_address, app_id);
        debug!("list instances request to {}", url);

        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let response = self.check(response).await?;

        let body: HashMap<String, InstanceInfo> = response
            .json()
            .await
            .map_err(|e| PlatformError::Parse(format!("instances response: {e}")))?;
        Ok(parse_instance_states(body))
    }

    async fn kill_instance(&self, app_id: &str, index: u32) -> Result<(), PlatformError> {
        let token = self.access_token().await?;
        let url = format!("{}/v2/apps/{}/instances/{}", self.api_address, app_id, index);
        debug!("kill instance request to {}", url);

        let response = self.http.delete(&url).bearer_auth(token).send().await?;
        self.check(response).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "cloud-foundry"
    }
}
