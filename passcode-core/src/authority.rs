//! Client for the passcode authority, the remote service that mints and validates passcodes.

use chrono::{DateTime, Utc};
use reqwest::Response;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthorityConfig,
    defaults::{
        GENERATE_PATH, GENERATION_FALLBACK_REASON, REJECTED_FALLBACK_REASON, VALIDATE_PATH,
    },
    error::PasscodeError,
    expiry::parse_timestamp,
    http_request::Request,
};

/// A passcode freshly minted by the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedPasscode {
    /// The opaque passcode.
    pub code: String,
    /// When the authority will stop accepting it.
    pub expires_at: DateTime<Utc>,
}

/// The authority's confirmation that a passcode is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPasscode {
    /// Name of the person the passcode was issued for.
    pub name: String,
    /// When the passcode expires.
    pub expires_at: DateTime<Utc>,
}

/// The two operations the sessions need from a passcode authority.
#[allow(async_fn_in_trait)]
pub trait PasscodeAuthority {
    /// Mints a new passcode.
    ///
    /// # Errors
    /// [`PasscodeError::AuthorityRejected`] on a non-success response,
    /// [`PasscodeError::Transport`] when no usable response arrived.
    async fn generate(&self) -> Result<IssuedPasscode, PasscodeError>;

    /// Checks `code`, which the caller has already trimmed.
    ///
    /// # Errors
    /// [`PasscodeError::AuthorityRejected`] when the authority says the code is not valid,
    /// [`PasscodeError::Transport`] when no usable response arrived.
    async fn validate(&self, code: &str) -> Result<ValidatedPasscode, PasscodeError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    code: String,
    expires_at: String,
}

#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateResponse {
    name: String,
    expires_at: String,
}

/// Failure bodies are free-form; only an optional `message` is ever looked at.
#[derive(Debug, Default, Deserialize)]
struct FailureBody {
    #[serde(default)]
    message: Option<String>,
}

impl FailureBody {
    fn reason(body: &str, fallback: &str) -> String {
        serde_json::from_str::<Self>(body)
            .unwrap_or_default()
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Passcode authority reached over HTTP.
#[derive(Debug)]
pub struct HttpAuthority {
    request: Request,
}

impl HttpAuthority {
    /// Creates a client for the authority described by `config`.
    #[must_use]
    pub fn new(config: AuthorityConfig) -> Self {
        Self {
            request: Request::new(config),
        }
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &AuthorityConfig {
        self.request.config()
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(
        url: &str,
        response: Response,
    ) -> Result<T, PasscodeError> {
        response.json::<T>().await.map_err(|e| PasscodeError::Transport {
            url: url.to_string(),
            error: format!("failed to parse authority response: {e}"),
        })
    }

    async fn rejected(url: String, response: Response, fallback: &str) -> PasscodeError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let reason = FailureBody::reason(&body, fallback);
        log::info!("authority rejected request to {url} with status {status}");
        PasscodeError::AuthorityRejected {
            url,
            status,
            reason,
        }
    }
}

impl PasscodeAuthority for HttpAuthority {
    async fn generate(&self) -> Result<IssuedPasscode, PasscodeError> {
        let url = self.config().endpoint(GENERATE_PATH);
        let response = self.request.handle(self.request.post(&url)).await?;

        if !response.status().is_success() {
            return Err(Self::rejected(url, response, GENERATION_FALLBACK_REASON).await);
        }

        let body: GenerateResponse = Self::read_json(&url, response).await?;
        let expires_at =
            parse_timestamp(&body.expires_at).map_err(|e| PasscodeError::Transport {
                url,
                error: format!("invalid expiresAt {:?}: {e}", body.expires_at),
            })?;

        Ok(IssuedPasscode {
            code: body.code,
            expires_at,
        })
    }

    async fn validate(&self, code: &str) -> Result<ValidatedPasscode, PasscodeError> {
        let url = self.config().endpoint(VALIDATE_PATH);
        let request_builder = self.request.post(&url).json(&ValidateRequest { code });
        let response = self.request.handle(request_builder).await?;

        if !response.status().is_success() {
            return Err(Self::rejected(url, response, REJECTED_FALLBACK_REASON).await);
        }

        let body: ValidateResponse = Self::read_json(&url, response).await?;
        let expires_at =
            parse_timestamp(&body.expires_at).map_err(|e| PasscodeError::Transport {
                url,
                error: format!("invalid expiresAt {:?}: {e}", body.expires_at),
            })?;

        Ok(ValidatedPasscode {
            name: body.name,
            expires_at,
        })
    }
}

#[cfg(test)]
impl HttpAuthority {
    /// Create an authority client with a custom base URL (for testing).
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        Self::new(AuthorityConfig::new(base_url).unwrap())
    }
}
