//! HTTP seam to the remote catalog API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    error::ErrorBody,
    protocol::{CatalogEntry, Credentials, LoginResponse, NewCatalogEntry},
};
use tracing::debug;
use url::Url;

use crate::error::CatalogError;

pub const DEFAULT_API_URL: &str = "https://backengine-y56e.fly.dev";

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, CatalogError>;
    /// Succeeds only on `204 No Content`.
    async fn signup(&self, credentials: &Credentials) -> Result<(), CatalogError>;
    async fn list_wines(&self, token: &str) -> Result<Vec<CatalogEntry>, CatalogError>;
    async fn create_wine(&self, token: &str, entry: &NewCatalogEntry)
        -> Result<(), CatalogError>;
}

pub struct HttpCatalogApi {
    http: Client,
    base_url: Url,
}

impl HttpCatalogApi {
    pub fn new(base_url: &str) -> Result<Self, CatalogError> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let http = Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, http)
    }

    fn with_client(base_url: &str, http: Client) -> Result<Self, CatalogError> {
        let parsed = Url::parse(base_url.trim()).map_err(|err| CatalogError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(CatalogError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "expected an http(s) url".into(),
            });
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segment: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        url
    }
}

async fn rejection(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let raw = response.text().await.unwrap_or_default();
    let message = ErrorBody::message_from(&raw).unwrap_or_else(|| status.to_string());
    (status, message)
}

async fn authorized_failure(response: Response) -> CatalogError {
    let (status, message) = rejection(response).await;
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        CatalogError::Unauthorized {
            status: status.as_u16(),
            message,
        }
    } else {
        CatalogError::Http {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, CatalogError> {
        let response = self
            .http
            .post(self.endpoint("login"))
            .json(credentials)
            .send()
            .await?;
        if !response.status().is_success() {
            let (status, message) = rejection(response).await;
            debug!(status = status.as_u16(), "api: login rejected");
            return Err(CatalogError::Auth { message });
        }
        Ok(response.json().await?)
    }

    async fn signup(&self, credentials: &Credentials) -> Result<(), CatalogError> {
        let response = self
            .http
            .post(self.endpoint("signup"))
            .json(credentials)
            .send()
            .await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let (status, message) = rejection(response).await;
        debug!(status = status.as_u16(), "api: signup rejected");
        Err(CatalogError::Auth { message })
    }

    async fn list_wines(&self, token: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
        let response = self
            .http
            .get(self.endpoint("wines"))
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(authorized_failure(response).await);
        }
        Ok(response.json().await?)
    }

    async fn create_wine(
        &self,
        token: &str,
        entry: &NewCatalogEntry,
    ) -> Result<(), CatalogError> {
        let response = self
            .http
            .post(self.endpoint("wines"))
            .bearer_auth(token)
            .json(entry)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(authorized_failure(response).await);
        }
        Ok(())
    }
}
