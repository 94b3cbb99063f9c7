//! Settings for talking to the passcode authority and rendering its answers.

use std::{net::IpAddr, time::Duration};

use chrono::{FixedOffset, Offset, Utc};
use reqwest::Url;

use crate::{
    defaults::{DEFAULT_AUTHORITY_URL, DEFAULT_SHARE_BASE_URL, DEFAULT_TIMEOUT},
    error::PasscodeError,
};

/// Environment variable overriding the authority address.
pub const AUTHORITY_URL_ENV: &str = "PASSCODE_AUTHORITY_URL";
/// Environment variable overriding the request timeout, in whole seconds.
pub const AUTHORITY_TIMEOUT_ENV: &str = "PASSCODE_AUTHORITY_TIMEOUT_SECS";

/// Where the authority lives and how its responses are presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityConfig {
    base_url: Url,
    timeout: Duration,
    share_base_url: Url,
    display_offset: FixedOffset,
}

impl AuthorityConfig {
    /// Builds a config for the authority at `base_url`, keeping every other default.
    ///
    /// # Errors
    /// Returns [`PasscodeError::InvalidConfig`] if the address does not parse, or if it
    /// uses plain `http` for anything other than a loopback host.
    pub fn new(base_url: &str) -> Result<Self, PasscodeError> {
        Ok(Self {
            base_url: parse_url("base_url", base_url)?,
            timeout: DEFAULT_TIMEOUT,
            share_base_url: parse_url("share_base_url", DEFAULT_SHARE_BASE_URL)?,
            display_offset: Utc.fix(),
        })
    }

    /// Reads the authority address and timeout from the process environment.
    ///
    /// Unset variables fall back to the defaults.
    ///
    /// # Errors
    /// Returns [`PasscodeError::InvalidConfig`] if a variable is set but unusable.
    pub fn from_env() -> Result<Self, PasscodeError> {
        let base_url = std::env::var(AUTHORITY_URL_ENV)
            .unwrap_or_else(|_| DEFAULT_AUTHORITY_URL.to_string());
        let mut config = Self::new(&base_url)?;

        if let Ok(raw) = std::env::var(AUTHORITY_TIMEOUT_ENV) {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                PasscodeError::InvalidConfig {
                    attribute: AUTHORITY_TIMEOUT_ENV.to_string(),
                    reason: format!("expected whole seconds: {e}"),
                }
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the deep-link base the share message is attached to.
    ///
    /// # Errors
    /// Returns [`PasscodeError::InvalidConfig`] if the address does not parse.
    pub fn with_share_base_url(mut self, share_base_url: &str) -> Result<Self, PasscodeError> {
        self.share_base_url = parse_url("share_base_url", share_base_url)?;
        Ok(self)
    }

    /// Sets the offset used when rendering a point in time as a time of day.
    #[must_use]
    pub const fn with_display_offset(mut self, offset: FixedOffset) -> Self {
        self.display_offset = offset;
        self
    }

    /// Address of the authority.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Deep-link base for share messages.
    #[must_use]
    pub const fn share_base_url(&self) -> &Url {
        &self.share_base_url
    }

    /// Offset used to render times of day.
    #[must_use]
    pub const fn display_offset(&self) -> FixedOffset {
        self.display_offset
    }

    /// Full URL of an authority endpoint.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_AUTHORITY_URL)
                .unwrap_or_else(|_| unreachable!("default authority url is valid")),
            timeout: DEFAULT_TIMEOUT,
            share_base_url: Url::parse(DEFAULT_SHARE_BASE_URL)
                .unwrap_or_else(|_| unreachable!("default share url is valid")),
            display_offset: Utc.fix(),
        }
    }
}

fn parse_url(attribute: &str, raw: &str) -> Result<Url, PasscodeError> {
    let url = Url::parse(raw.trim()).map_err(|e| PasscodeError::InvalidConfig {
        attribute: attribute.to_string(),
        reason: format!("{raw:?} is not a valid url: {e}"),
    })?;

    match url.scheme() {
        "https" => Ok(url),
        "http" if is_loopback(&url) => Ok(url),
        scheme => Err(PasscodeError::InvalidConfig {
            attribute: attribute.to_string(),
            reason: format!("scheme {scheme:?} is not allowed, use https"),
        }),
    }
}

fn is_loopback(url: &Url) -> bool {
    url.host_str().is_some_and(|host| {
        host.eq_ignore_ascii_case("localhost")
            || host
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse::<IpAddr>()
                .is_ok_and(|ip| ip.is_loopback())
    })
}
