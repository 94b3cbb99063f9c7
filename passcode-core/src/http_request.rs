use reqwest::{Method, RequestBuilder, Response};

use crate::{config::AuthorityConfig, error::PasscodeError};

/// A simple wrapper on an HTTP client for making requests. Sets sensible defaults such as
/// timeouts and user-agent. Requests are sent once; failures are never retried.
#[derive(Debug)]
pub struct Request {
    client: reqwest::Client,
    config: AuthorityConfig,
}

impl Request {
    /// Initializes a new `Request` instance.
    pub(crate) fn new(config: AuthorityConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub(crate) const fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    /// Creates a request builder with defaults applied.
    pub(crate) fn req(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .timeout(self.config.timeout())
            .header(
                "User-Agent",
                format!("passcode-core/{}", env!("CARGO_PKG_VERSION")),
            )
    }

    /// Creates a POST request builder with defaults applied.
    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        self.req(Method::POST, url)
    }

    /// Sends a request built by `req`/`post`.
    ///
    /// Any response, whatever its status, is returned as-is. Only failures to obtain a
    /// response at all become [`PasscodeError::Transport`].
    pub(crate) async fn handle(
        &self,
        request_builder: RequestBuilder,
    ) -> Result<Response, PasscodeError> {
        let (client, request) = request_builder.build_split();
        let request = request.map_err(|err| PasscodeError::Transport {
            url: err
                .url()
                .map(|url| url.to_string())
                .unwrap_or_else(|| "<unknown>".to_string()),
            error: format!("request build failed: {err}"),
        })?;
        let url = request.url().to_string();

        client.execute(request).await.map_err(|err| {
            let error = if err.is_timeout() || err.is_connect() {
                format!("request timeout/connect error: {err}")
            } else {
                format!("request failed: {err}")
            };
            log::warn!("authority call to {url} failed: {error}");
            PasscodeError::Transport { url, error }
        })
    }
}
