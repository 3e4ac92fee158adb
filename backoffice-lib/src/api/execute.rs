//! Collection calls and request plumbing
//!
//! Every collection call ends up in a single `request` method. There is no
//! retry: every failure is returned to the caller as-is.

use reqwest::Method;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use serde::de::DeserializeOwned;
use url::Url;

use crate::BackofficeClient;
use crate::error::ApiError;
use crate::error::Error;
use crate::model::Record;
use crate::model::RecordId;

impl BackofficeClient {
    /// Fetches every record of a collection, in backend order.
    pub async fn list_records(&self, collection: &str) -> Result<Vec<Record>, Error> {
        self.get_json(&[collection]).await
    }

    /// Creates a record and returns it if the backend echoes it back.
    ///
    /// Any identifier on `record` is dropped; the backend assigns one.
    pub async fn create_record(
        &self,
        collection: &str,
        mut record: Record,
    ) -> Result<Option<Record>, Error> {
        record.id = None;
        let url = self.endpoint(&[collection])?;
        self.send_record(Method::POST, url, &record).await
    }

    /// Replaces a record with a full payload.
    pub async fn update_record(
        &self,
        collection: &str,
        id: RecordId,
        record: Record,
    ) -> Result<Option<Record>, Error> {
        let id = id.to_string();
        let url = self.endpoint(&[collection, &id])?;
        self.send_record(Method::PUT, url, &record).await
    }

    /// Deletes a record. The response body is ignored.
    pub async fn delete_record(&self, collection: &str, id: RecordId) -> Result<(), Error> {
        let id = id.to_string();
        let url = self.endpoint(&[collection, &id])?;
        self.request(Method::DELETE, url, None).await?;
        Ok(())
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    async fn send_record(
        &self,
        method: Method,
        url: Url,
        record: &Record,
    ) -> Result<Option<Record>, Error> {
        let body = serde_json::to_string(record)?;
        let response = self.request(method, url, Some(body)).await?;
        let text = response.text().await.map_err(ApiError::from)?;
        parse_optional_record(&text)
    }

    /// GETs a resource and deserializes its JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let url = self.endpoint(segments)?;
        let response = self.request(Method::GET, url, None).await?;
        let text = response.text().await.map_err(ApiError::from)?;
        parse_body(&text)
    }

    fn default_headers(&self, with_body: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if with_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers
    }

    /// Sends one request and maps non-success statuses to [`ApiError::Http`].
    ///
    /// This is the low-level request method used by all API operations.
    pub(crate) async fn request(
        &self,
        method: Method,
        url: Url,
        body: Option<String>,
    ) -> Result<reqwest::Response, Error> {
        let token = self.inner.token_provider.get_token().await?;

        log::debug!("{} {}", method, url);

        let mut request = self
            .inner
            .http_client
            .request(method.clone(), url.clone())
            .headers(self.default_headers(body.is_some()));

        if let Some(token) = token {
            if token.is_expired() {
                log::warn!("Sending request with an expired token");
            }
            request = request.bearer_auth(&token.access_token);
        }

        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        log::warn!("{} {} failed with HTTP {}", method, url, status.as_u16());
        Err(Error::Api(ApiError::from_body(status.as_u16(), &body)))
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        match self.inner.timeout {
            Some(timeout) if err.is_timeout() => Error::Api(ApiError::Timeout(timeout)),
            _ => Error::Api(ApiError::Network(err)),
        }
    }
}

/// Deserializes a JSON body, keeping the raw text on failure.
fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, Error> {
    serde_json::from_str(text)
        .map_err(|e| Error::Api(ApiError::parse_with_body(e.to_string(), text)))
}

/// An empty or `null` body means the backend did not echo the record.
fn parse_optional_record(text: &str) -> Result<Option<Record>, Error> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(_)) => parse_body(trimmed).map(Some),
        Ok(_) => Ok(None),
        Err(e) => Err(Error::Api(ApiError::parse_with_body(e.to_string(), text))),
    }
}
