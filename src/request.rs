use urlencoding::encode;

use crate::config::{ProviderConfig, API_HOST_HEADER, API_KEY_HEADER};
use crate::models::ResourceKind;

/// Build a reproducible cache key: `{resource}_{p1}_{p2}...`.
pub fn cache_key<I, P>(resource: &str, params: I) -> String
where
    I: IntoIterator<Item = P>,
    P: ToString,
{
    let mut key = resource.to_string();
    for param in params {
        key.push('_');
        key.push_str(&param.to_string());
    }
    key
}

/// A single logical GET against a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub kind: ResourceKind,
    pub cache_key: String,
    pub ttl_secs: u64,
    /// Critical requests go to the network while the provider is only
    /// approaching its limit.
    pub critical: bool,
    pub base_url: String,
    pub endpoint: String,
    pub path_params: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    /// Request against `provider` with the standard key/host headers, the
    /// kind's default TTL and criticality.
    pub fn new(
        provider: &ProviderConfig,
        api_key: &str,
        kind: ResourceKind,
        endpoint: &str,
        cache_key: String,
    ) -> Self {
        Self {
            kind,
            cache_key,
            ttl_secs: kind.ttl_secs(),
            critical: kind.is_critical(),
            base_url: provider.base_url.clone(),
            endpoint: endpoint.to_string(),
            path_params: Vec::new(),
            query: Vec::new(),
            headers: vec![
                (API_KEY_HEADER.to_string(), api_key.to_string()),
                (API_HOST_HEADER.to_string(), provider.host.clone()),
            ],
        }
    }

    pub fn path_param(mut self, name: &str, value: impl ToString) -> Self {
        self.path_params.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query_param(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Host the request is addressed to: the API host header if present,
    /// otherwise the authority of the resolved URL.
    pub fn api_host(&self) -> String {
        if let Some(host) = self.header(API_HOST_HEADER) {
            return host.to_string();
        }
        let url = self.url();
        let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(&url);
        rest.split(['/', '?', ':']).next().unwrap_or("").to_string()
    }

    /// Full URL. Path params replace whole `:name` path segments and never
    /// reach the query string; the remaining params are appended as a query.
    pub fn url(&self) -> String {
        let full = if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            self.endpoint.clone()
        } else {
            format!("{}{}", self.base_url, self.endpoint)
        };
        let (path, fixed_query) = match full.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (full.as_str(), None),
        };

        let mut url = path
            .split('/')
            .map(|segment| {
                let value = segment.strip_prefix(':').and_then(|name| {
                    self.path_params
                        .iter()
                        .find(|(param, _)| param == name)
                        .map(|(_, value)| value)
                });
                match value {
                    Some(value) => encode(value).into_owned(),
                    None => segment.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join("/");

        let mut query: Vec<String> = fixed_query.into_iter().map(str::to_string).collect();
        query.extend(
            self.query
                .iter()
                .map(|(k, v)| format!("{}={}", encode(k), encode(v))),
        );
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }
}
