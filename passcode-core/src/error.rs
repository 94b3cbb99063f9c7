use strum::Display;
use thiserror::Error;

/// Fields that must be filled in before an operation may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RequiredField {
    /// The passcode issued by the authority.
    Code,
    /// The name of the person the passcode is shared with.
    RecipientName,
    /// Either a custom expiry or the one returned by the authority.
    Expiry,
    /// The code typed in by the verifier.
    QueryCode,
}

/// Error outputs from `passcode-core`
#[derive(Debug, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum PasscodeError {
    /// A required local field is empty. Raised before any request is made.
    #[error("missing_required_field: {field}")]
    Validation {
        /// The field that is missing.
        field: RequiredField,
    },
    /// The authority answered with a definite negative.
    #[error("authority_rejected: {status} {reason}")]
    AuthorityRejected {
        /// The URL that was called.
        url: String,
        /// The HTTP status code returned.
        status: u16,
        /// Human-readable reason extracted from the response, or a fallback.
        reason: String,
    },
    /// No interpretable response reached the client.
    #[error("transport_failure: {url}: {error}")]
    Transport {
        /// The URL that was called.
        url: String,
        /// Details of the failure, for logs.
        error: String,
    },
    /// A configuration value is not usable.
    #[error("invalid_config: {attribute}: {reason}")]
    InvalidConfig {
        /// The offending setting.
        attribute: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl PasscodeError {
    pub(crate) const fn missing(field: RequiredField) -> Self {
        Self::Validation { field }
    }

    /// Whether the error was raised locally, without contacting the authority.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
