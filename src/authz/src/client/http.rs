//! HTTP scope clients for the hub and seller services

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::ScopeClient;
use crate::config::ClientSection;
use crate::error::ScopeClientError;

/// Placeholder substituted with the tenant ID in request paths
const TENANT_PLACEHOLDER: &str = "{tenant_id}";

/// Extra query filters sent with seller lookups (`key=v1&key=v2`)
pub type SellerFilters = BTreeMap<String, Vec<String>>;

/// Resource ID as sent by upstream services, which use both strings and numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(id) => id,
            RawId::Number(id) => id.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct HubIds {
    #[serde(default)]
    hub_ids: Vec<RawId>,
}

#[derive(Debug, Deserialize)]
struct SellerRecord {
    id: RawId,
}

fn build_client(timeout: Duration) -> Result<Client, ScopeClientError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ScopeClientError::unavailable(e.to_string()))
}

fn parse_base_url(base_url: &str) -> Result<Url, ScopeClientError> {
    let url = Url::parse(base_url)
        .map_err(|e| ScopeClientError::invalid_url(format!("{}: {}", base_url, e)))?;
    if url.cannot_be_a_base() {
        return Err(ScopeClientError::invalid_url(format!(
            "{}: not a base URL",
            base_url
        )));
    }
    Ok(url)
}

/// Append `path` to `base_url` with the tenant ID substituted.
///
/// Each segment is percent-encoded on its own, so a tenant ID containing
/// `/`, `?` or `#` stays inside its segment.
fn tenant_url(base_url: &Url, path: &str, tenant_id: &str) -> Result<Url, ScopeClientError> {
    if tenant_id == "." || tenant_id == ".." {
        return Err(ScopeClientError::invalid_url(format!(
            "tenant ID {:?} is a relative path segment",
            tenant_id
        )));
    }

    let mut url = base_url.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| ScopeClientError::invalid_url(base_url.as_str()))?;
        segments.pop_if_empty();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            segments.push(&segment.replace(TENANT_PLACEHOLDER, tenant_id));
        }
    }
    Ok(url)
}

async fn decode_body<T: DeserializeOwned>(response: Response) -> Result<T, ScopeClientError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ScopeClientError::Status {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ScopeClientError::decode(e.to_string()))
}

/// Fetches the hubs owned by a tenant
///
/// Expects `{"data": {"hub_ids": [...]}}`.
#[derive(Debug, Clone)]
pub struct HttpHubScopeClient {
    http: Client,
    base_url: Url,
    path: String,
}

impl HttpHubScopeClient {
    pub fn new(
        base_url: impl AsRef<str>,
        path: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ScopeClientError> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: parse_base_url(base_url.as_ref())?,
            path: path.into(),
        })
    }

    pub fn from_config(section: &ClientSection) -> Result<Self, ScopeClientError> {
        Self::new(&section.base_url, &section.path, section.timeout())
    }
}

#[async_trait]
impl ScopeClient for HttpHubScopeClient {
    async fn tenant_resource_ids(&self, tenant_id: &str) -> Result<Vec<String>, ScopeClientError> {
        let url = tenant_url(&self.base_url, &self.path, tenant_id)?;
        debug!("Fetching hub scope from {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ScopeClientError::unavailable(e.to_string()))?;

        let body: Envelope<HubIds> = decode_body(response).await?;
        Ok(body.data.hub_ids.into_iter().map(RawId::into_string).collect())
    }
}

/// Fetches the sellers owned by a tenant
///
/// Expects `{"data": [{"id": ...}, ...]}`.
#[derive(Debug, Clone)]
pub struct HttpSellerScopeClient {
    http: Client,
    base_url: Url,
    path: String,
    filters: SellerFilters,
}

impl HttpSellerScopeClient {
    pub fn new(
        base_url: impl AsRef<str>,
        path: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ScopeClientError> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: parse_base_url(base_url.as_ref())?,
            path: path.into(),
            filters: SellerFilters::new(),
        })
    }

    pub fn from_config(section: &ClientSection) -> Result<Self, ScopeClientError> {
        Self::new(&section.base_url, &section.path, section.timeout())
    }

    /// Query filters sent with every lookup
    pub fn with_filters(mut self, filters: SellerFilters) -> Self {
        self.filters = filters;
        self
    }

    fn query_pairs(&self) -> Vec<(&str, &str)> {
        self.filters
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| (key.as_str(), v.as_str())))
            .collect()
    }
}

#[async_trait]
impl ScopeClient for HttpSellerScopeClient {
    async fn tenant_resource_ids(&self, tenant_id: &str) -> Result<Vec<String>, ScopeClientError> {
        let url = tenant_url(&self.base_url, &self.path, tenant_id)?;
        debug!("Fetching seller scope from {}", url);

        let response = self
            .http
            .get(url)
            .query(&self.query_pairs())
            .send()
            .await
            .map_err(|e| ScopeClientError::unavailable(e.to_string()))?;

        let body: Envelope<Vec<SellerRecord>> = decode_body(response).await?;
        Ok(body
            .data
            .into_iter()
            .map(|seller| seller.id.into_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(base: &str, tenant_id: &str) -> String {
        let base = parse_base_url(base).unwrap();
        tenant_url(&base, "/v1/tenants/{tenant_id}/hubs", tenant_id)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_tenant_url() {
        assert_eq!(url("http://hubs:8080/", "t1"), "http://hubs:8080/v1/tenants/t1/hubs");
        assert_eq!(url("http://hubs:8080", "t1"), "http://hubs:8080/v1/tenants/t1/hubs");
        assert_eq!(
            url("http://gw/inventory/", "t1"),
            "http://gw/inventory/v1/tenants/t1/hubs"
        );
    }

    #[test]
    fn test_tenant_url_encodes_reserved_characters() {
        assert_eq!(
            url("http://hubs", "other/hubs?x="),
            "http://hubs/v1/tenants/other%2Fhubs%3Fx=/hubs"
        );
        assert_eq!(url("http://hubs", "a#b"), "http://hubs/v1/tenants/a%23b/hubs");
        assert_eq!(url("http://hubs", "50%"), "http://hubs/v1/tenants/50%25/hubs");
    }

    #[test]
    fn test_tenant_url_rejects_relative_segments() {
        let base = parse_base_url("http://hubs").unwrap();
        for tenant in [".", ".."] {
            let err = tenant_url(&base, "/tenants/{tenant_id}/hubs", tenant).unwrap_err();
            assert!(matches!(err, ScopeClientError::InvalidUrl(_)));
        }
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpHubScopeClient::new("not a url", "/{tenant_id}", Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, ScopeClientError::InvalidUrl(_)));
    }

    #[test]
    fn test_raw_ids_accept_numbers_and_strings() {
        let body: Envelope<HubIds> =
            serde_json::from_str(r#"{"data": {"hub_ids": [7, "h2"]}}"#).unwrap();
        let ids: Vec<String> = body.data.hub_ids.into_iter().map(RawId::into_string).collect();
        assert_eq!(ids, vec!["7", "h2"]);
    }

    #[test]
    fn test_seller_query_pairs() {
        let filters = SellerFilters::from([(
            "status".to_string(),
            vec!["active".to_string(), "pending".to_string()],
        )]);
        let client = HttpSellerScopeClient::new("http://s", "/sellers", Duration::from_secs(1))
            .unwrap()
            .with_filters(filters);

        assert_eq!(
            client.query_pairs(),
            vec![("status", "active"), ("status", "pending")]
        );
    }
}
