//! Session-holding HTTP client wrapping reqwest.
//!
//! Not a browser, just HTTP requests that look like one: Chrome user-agent,
//! browser accept headers, a cookie jar shared between the warm-up request
//! and the submit, and `Origin`/`Referer` on form posts. Exactly one attempt
//! per request.

use super::FetchError;
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::debug;

/// Chrome user-agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                              AppleWebKit/537.36 (KHTML, like Gecko) \
                              Chrome/131.0.0.0 Safari/537.36";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Response from a successful (2xx) request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Requested URL.
    pub url: String,
    /// Final URL after redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

/// HTTP client bound to one upstream origin.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    origin: String,
    referer: String,
}

impl HttpClient {
    /// Create a client for `base_url` with a cookie store and browser headers.
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self, FetchError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            origin: parsed.origin().ascii_serialization(),
            referer: parsed.as_str().to_string(),
        })
    }

    /// `Origin` header value sent with form posts.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// GET `url`. Non-2xx responses become errors.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        debug!(url, "GET");
        let resp = self.client.get(url).send().await?;
        read_checked(url, resp).await
    }

    /// POST url-encoded `form_fields` to `url` with browser form headers plus
    /// `extra_headers`. Non-2xx responses become errors.
    pub async fn post_form(
        &self,
        url: &str,
        form_fields: &[(&str, &str)],
        extra_headers: &[(&str, &str)],
    ) -> Result<HttpResponse, FetchError> {
        debug!(url, fields = form_fields.len(), "POST form");
        let mut builder = self
            .client
            .post(url)
            .header(header::ORIGIN, self.origin.as_str())
            .header(header::REFERER, self.referer.as_str());

        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }

        let resp = builder.form(form_fields).send().await?;
        read_checked(url, resp).await
    }
}

/// Classify the status, then read the body.
async fn read_checked(url: &str, resp: reqwest::Response) -> Result<HttpResponse, FetchError> {
    let status = resp.status().as_u16();
    let final_url = resp.url().to_string();

    check_status(status, &final_url)?;

    let body = resp.text().await?;
    debug!(status, bytes = body.len(), final_url = %final_url, "response read");

    Ok(HttpResponse {
        url: url.to_string(),
        final_url,
        status,
        body,
    })
}

/// Map a status code to success, `Blocked` (403) or `HttpStatus`.
pub fn check_status(status: u16, url: &str) -> Result<(), FetchError> {
    match status {
        200..=299 => Ok(()),
        403 => Err(FetchError::Blocked {
            url: url.to_string(),
        }),
        _ => Err(FetchError::HttpStatus {
            status,
            url: url.to_string(),
        }),
    }
}
