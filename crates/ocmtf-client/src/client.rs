use std::time::Duration;

use ocmtf_core::models::Page;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, OcmError};

/// Page size used when walking collections.
const PAGE_SIZE: u32 = 100;

/// Connection settings for [`OcmClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://api.openshift.com`.
    pub url: String,
    /// Bearer token sent on every request, when present.
    pub token: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "https://api.openshift.com".to_string(),
            token: None,
            timeout: Duration::from_secs(60),
            user_agent: concat!("ocmtf/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// JSON-over-HTTP client for the clusters_mgmt API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct OcmClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl OcmClient {
    pub fn new(config: &ClientConfig) -> Result<Self, OcmError> {
        let base_url = config.url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(OcmError::InvalidUrl(config.url.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let req = self
            .http
            .request(method, url)
            .header("Accept", "application/json");
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, OcmError> {
        let resp = self.request(Method::GET, path).send().await?;
        decode(Method::GET, path, resp).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, OcmError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.request(Method::POST, path).json(body).send().await?;
        decode(Method::POST, path, resp).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, OcmError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.request(Method::PATCH, path).json(body).send().await?;
        decode(Method::PATCH, path, resp).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), OcmError> {
        let resp = self.request(Method::DELETE, path).send().await?;
        let status = resp.status();
        tracing::debug!(method = "DELETE", path, status = status.as_u16(), "API response");
        if !status.is_success() {
            let body = resp.bytes().await.unwrap_or_default();
            return Err(OcmError::Api(ApiError::from_body(status.as_u16(), &body)));
        }
        Ok(())
    }

    /// Fetch a single page of a collection.
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
        size: u32,
    ) -> Result<Page<T>, OcmError> {
        let resp = self
            .request(Method::GET, path)
            .query(&[("page", page), ("size", size)])
            .send()
            .await?;
        decode(Method::GET, path, resp).await
    }

    /// Walk every page of a collection.
    pub async fn list_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, OcmError> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let resp: Page<T> = self.list(path, page, PAGE_SIZE).await?;
            let received = resp.items.len();
            items.extend(resp.items);

            let total_reached = resp.total > 0 && items.len() >= resp.total as usize;
            if received < PAGE_SIZE as usize || total_reached {
                break;
            }
            page += 1;
        }
        Ok(items)
    }
}

async fn decode<T: DeserializeOwned>(
    method: Method,
    path: &str,
    resp: Response,
) -> Result<T, OcmError> {
    let status = resp.status();
    tracing::debug!(method = %method, path, status = status.as_u16(), "API response");

    let body = resp.bytes().await?;
    if !status.is_success() {
        return Err(OcmError::Api(ApiError::from_body(status.as_u16(), &body)));
    }

    if body.is_empty() {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(&body)?)
}
