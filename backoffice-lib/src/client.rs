//! Main BackofficeClient

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::auth::TokenProvider;
use crate::error::ApiError;

/// The client for the back-office REST backend.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across tasks. The credential is handed in once, at construction, through
/// a [`TokenProvider`]; nothing is read from ambient storage per call.
///
/// # Example
///
/// ```ignore
/// use backoffice_lib::{BackofficeClient, auth::StaticTokenProvider};
///
/// let client = BackofficeClient::builder()
///     .url("https://api.example.com")
///     .token_provider(StaticTokenProvider::new("my-token"))
///     .build()?;
///
/// let prices = client.list_records("prices").await?;
/// ```
#[derive(Clone)]
pub struct BackofficeClient {
    pub(crate) inner: Arc<BackofficeClientInner>,
}

pub(crate) struct BackofficeClientInner {
    pub(crate) base_url: Url,
    pub(crate) token_provider: Arc<dyn TokenProvider>,
    pub(crate) http_client: Client,
    pub(crate) timeout: Option<Duration>,
}

impl BackofficeClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> BackofficeClientBuilder<Missing, Missing> {
        BackofficeClientBuilder::new()
    }

    /// Returns the base URL of the backend.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Returns the per-request timeout, if one is set.
    pub fn timeout(&self) -> Option<Duration> {
        self.inner.timeout
    }

    /// Builds the URL of a resource below the base URL.
    ///
    /// Segments are percent-encoded, so an identifier or slug can never
    /// escape its path position.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.inner.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}

impl std::fmt::Debug for BackofficeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackofficeClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`BackofficeClient`].
///
/// Uses the typestate pattern to ensure required fields are set at compile time.
///
/// # Required Fields
///
/// - `url` - The backend base URL
/// - `token_provider` - A [`TokenProvider`] implementation
///
/// # Example
///
/// ```ignore
/// let client = BackofficeClient::builder()
///     .url("https://api.example.com")
///     .token_provider(my_provider)
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub struct BackofficeClientBuilder<Url, Provider> {
    url: Url,
    token_provider: Provider,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
}

impl BackofficeClientBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            token_provider: Missing,
            timeout: None,
            connect_timeout: None,
            http_client: None,
        }
    }
}

impl Default for BackofficeClientBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> BackofficeClientBuilder<Missing, P> {
    /// Sets the backend base URL.
    ///
    /// # Example
    ///
    /// ```ignore
    /// .url("https://api.example.com")
    /// ```
    pub fn url(self, url: impl Into<String>) -> BackofficeClientBuilder<Set<String>, P> {
        BackofficeClientBuilder {
            url: Set(url.into()),
            token_provider: self.token_provider,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
        }
    }
}

impl<U> BackofficeClientBuilder<U, Missing> {
    /// Sets the token provider for authentication.
    pub fn token_provider<T: TokenProvider + 'static>(
        self,
        provider: T,
    ) -> BackofficeClientBuilder<U, Set<Arc<dyn TokenProvider>>> {
        self.shared_token_provider(Arc::new(provider))
    }

    /// Sets a token provider that is shared with other clients.
    pub fn shared_token_provider(
        self,
        provider: Arc<dyn TokenProvider>,
    ) -> BackofficeClientBuilder<U, Set<Arc<dyn TokenProvider>>> {
        BackofficeClientBuilder {
            url: self.url,
            token_provider: Set(provider),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
        }
    }
}

impl<U, P> BackofficeClientBuilder<U, P> {
    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl BackofficeClientBuilder<Set<String>, Set<Arc<dyn TokenProvider>>> {
    /// Builds the [`BackofficeClient`].
    ///
    /// This method is only available when both `url` and `token_provider`
    /// have been set. Fails if the URL is not an absolute `http(s)` URL.
    pub fn build(self) -> Result<BackofficeClient, ApiError> {
        let raw = self.url.0;
        let base_url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(raw));
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(BackofficeClient {
            inner: Arc::new(BackofficeClientInner {
                base_url,
                token_provider: self.token_provider.0,
                http_client,
                timeout: self.timeout,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AnonymousTokenProvider;

    fn client(url: &str) -> BackofficeClient {
        BackofficeClient::builder()
            .url(url)
            .token_provider(AnonymousTokenProvider)
            .build()
            .unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let client = client("https://api.example.com/v1/");
        let url = client.endpoint(&["prices", "7"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/prices/7");
    }

    #[test]
    fn test_endpoint_without_trailing_slash() {
        let client = client("http://localhost:8000");
        let url = client.endpoint(&["sss"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/sss");
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let client = client("http://localhost:8000");
        let url = client.endpoint(&["content", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/content/a%2Fb");
    }

    #[test]
    fn test_build_rejects_non_http_url() {
        let result = BackofficeClient::builder()
            .url("mailto:admin@example.com")
            .token_provider(AnonymousTokenProvider)
            .build();
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }
}
