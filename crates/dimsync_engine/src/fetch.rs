use std::fmt;
use std::time::Duration;

use dimsync_core::lookup::{int_at, text_at};
use dimsync_logging::{dimsync_debug, dimsync_info, dimsync_warn};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;
use url::Url;

use crate::{FailureKind, FetchCursor, FetchError, Resource};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Wait used when a 429 response carries no usable `Retry-After`.
    pub default_retry_after: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            default_retry_after: Duration::from_secs(1),
        }
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Produces every record of a resource, page by page.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_all(&self, resource: Resource, page_size: u32)
        -> Result<Vec<Value>, FetchError>;
}

/// One decoded `{list, pages}` response.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub list: Vec<Value>,
    pub pages: u64,
}

impl Page {
    fn from_body(body: Value) -> Self {
        let pages = int_at(&body, &["pages"]).max(0) as u64;
        let list = match body {
            Value::Object(mut map) => match map.remove("list") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Self { list, pages }
    }
}

/// Client for the shop `webapi/rest` endpoints.
#[derive(Clone)]
pub struct ShopClient {
    site: Url,
    credentials: Credentials,
    settings: FetchSettings,
    http: reqwest::Client,
    token: Option<String>,
}

impl fmt::Debug for ShopClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopClient")
            .field("site", &self.site.as_str())
            .field("credentials", &self.credentials)
            .field("settings", &self.settings)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl ShopClient {
    pub fn new(
        site_url: &str,
        credentials: Credentials,
        settings: FetchSettings,
    ) -> Result<Self, FetchError> {
        let site = Url::parse(site_url.trim_end_matches('/'))
            .map_err(|err| FetchError::new("site", FailureKind::InvalidUrl, err.to_string()))?;
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new("site", FailureKind::Network, err.to_string()))?;
        Ok(Self {
            site,
            credentials,
            settings,
            http,
            token: None,
        })
    }

    /// Uses an already issued bearer token instead of logging in.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn is_connected(&self) -> bool {
        self.token.is_some()
    }

    pub fn site_url(&self) -> &str {
        self.site.as_str().trim_end_matches('/')
    }

    /// Exchanges the site credentials for a bearer token.
    pub async fn connect(&mut self) -> Result<(), FetchError> {
        let url = self.endpoint("auth")?;
        let response = self
            .http
            .post(url)
            .basic_auth(&self.credentials.login, Some(&self.credentials.password))
            .send()
            .await
            .map_err(|err| map_reqwest_error("auth", err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::new(
                "auth",
                FailureKind::Auth(status.as_u16()),
                body,
            ));
        }

        let body = decode_body("auth", response).await?;
        let token = text_at(&body, &["access_token"]);
        if token.is_empty() {
            return Err(FetchError::new(
                "auth",
                FailureKind::Decode,
                "response carries no access_token",
            ));
        }
        self.token = Some(token);
        dimsync_info!("Authenticated with {}", self.site_url());
        Ok(())
    }

    /// Requests one page. Rate-limit responses are retried transparently.
    pub async fn get_page(
        &self,
        resource: Resource,
        page: u32,
        page_size: u32,
    ) -> Result<Page, FetchError> {
        let url = self.endpoint(resource.path())?;
        let query = [("limit", page_size.to_string()), ("page", page.to_string())];
        let response = self
            .send_with_backoff(resource.path(), || self.http.get(url.clone()).query(&query))
            .await?;
        let body = success_body(resource.path(), response).await?;
        Ok(Page::from_body(body))
    }

    /// Single product by its numeric id.
    pub async fn get_product(&self, product_id: i64) -> Result<Value, FetchError> {
        let url = self.endpoint(&format!("products/{product_id}"))?;
        let response = self
            .send_with_backoff("products", || self.http.get(url.clone()))
            .await?;
        success_body("products", response).await
    }

    /// First product whose stock code equals `code`, if any.
    pub async fn find_product_by_code(&self, code: &str) -> Result<Option<Value>, FetchError> {
        let url = self.endpoint(Resource::Products.path())?;
        let filters = serde_json::json!({ "stock.code": code }).to_string();
        let query = [("filters", filters)];
        let response = self
            .send_with_backoff("products", || self.http.get(url.clone()).query(&query))
            .await?;
        let page = Page::from_body(success_body("products", response).await?);
        if page.list.is_empty() {
            dimsync_info!("Product {} doesn't exist", code);
        }
        Ok(page.list.into_iter().next())
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        let raw = format!("{}/webapi/rest/{}", self.site_url(), path);
        Url::parse(&raw).map_err(|err| FetchError::new(path, FailureKind::InvalidUrl, err.to_string()))
    }

    /// Sends the request built by `build` until the server stops answering
    /// 429. There is no attempt cap; the server's `Retry-After` paces it.
    async fn send_with_backoff<F>(&self, resource: &str, build: F) -> Result<Response, FetchError>
    where
        F: Fn() -> RequestBuilder,
    {
        loop {
            let mut request = build();
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }
            let response = request
                .send()
                .await
                .map_err(|err| map_reqwest_error(resource, err))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }
            let wait = retry_after(response.headers()).unwrap_or(self.settings.default_retry_after);
            dimsync_warn!(
                "Rate limit exceeded on {}. Retrying after {:?}...",
                resource,
                wait
            );
            tokio::time::sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl CatalogSource for ShopClient {
    async fn fetch_all(
        &self,
        resource: Resource,
        page_size: u32,
    ) -> Result<Vec<Value>, FetchError> {
        let mut cursor = FetchCursor::new(resource);
        let mut records = Vec::new();

        dimsync_info!("Downloading all {}.", resource);
        loop {
            let page = self.get_page(resource, cursor.page, page_size).await?;
            cursor.total_pages = page.pages;
            // An empty page ends the run whatever `pages` claimed.
            if page.list.is_empty() {
                break;
            }
            dimsync_info!("Page: {}/{}", cursor.page, cursor.total_pages);
            records.extend(page.list);
            cursor.advance();
        }
        dimsync_debug!("{}: {} records in {} pages", resource, records.len(), cursor.page - 1);
        Ok(records)
    }
}

/// `Retry-After` as delta seconds. HTTP dates are not supported.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

async fn success_body(resource: &str, response: Response) -> Result<Value, FetchError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::new(
            resource,
            FailureKind::HttpStatus(status.as_u16()),
            body,
        ));
    }
    decode_body(resource, response).await
}

async fn decode_body(resource: &str, response: Response) -> Result<Value, FetchError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|err| map_reqwest_error(resource, err))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| FetchError::new(resource, FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(resource: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(resource, FailureKind::Timeout, err.to_string());
    }
    FetchError::new(resource, FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    #[test]
    fn retry_after_parses_seconds_only() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(3)));
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let credentials = Credentials {
            login: "admin".to_string(),
            password: "hunter2".to_string(),
        };
        let client = ShopClient::new(
            "https://shop.example.com",
            credentials.clone(),
            FetchSettings::default(),
        )
        .unwrap()
        .with_token("token-abc");

        for text in [format!("{credentials:?}"), format!("{client:?}")] {
            assert!(text.contains("admin"), "{text}");
            assert!(!text.contains("hunter2"), "{text}");
            assert!(!text.contains("token-abc"), "{text}");
        }
    }

    #[test]
    fn page_body_tolerates_missing_fields() {
        let page = Page::from_body(json!({"pages": "3"}));
        assert!(page.list.is_empty());
        assert_eq!(page.pages, 3);

        let page = Page::from_body(json!({"list": [{"id": 1}], "pages": 1}));
        assert_eq!(page.list.len(), 1);
    }
}
