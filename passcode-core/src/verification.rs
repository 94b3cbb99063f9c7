//! The verifier side: submit a code and hold the authority's verdict.

use chrono::{DateTime, FixedOffset, Utc};

use crate::{
    authority::{PasscodeAuthority, ValidatedPasscode},
    defaults::TRANSPORT_FALLBACK_REASON,
    error::{PasscodeError, RequiredField},
    expiry::render_time_of_day,
    Ticket,
};

/// Why a code ended up `Invalid`. Both causes show the user a reason string, but hosts
/// and tests can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidCause {
    /// The authority answered and said no.
    Rejected {
        /// HTTP status of the answer.
        status: u16,
    },
    /// No usable answer arrived.
    Transport,
}

/// Where a verification stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    /// Nothing submitted yet.
    Idle,
    /// Waiting for the authority.
    Pending,
    /// The authority accepted the code.
    Valid {
        /// Who the code was issued for.
        owner_name: String,
        /// When the code expires.
        expires_at: DateTime<Utc>,
    },
    /// The code was not accepted, or could not be checked.
    Invalid {
        /// Text to show the user.
        reason: String,
        /// What produced the verdict.
        cause: InvalidCause,
    },
}

/// The code that was submitted together with its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    query_code: String,
    status: VerificationStatus,
}

impl VerificationOutcome {
    const fn idle() -> Self {
        Self {
            query_code: String::new(),
            status: VerificationStatus::Idle,
        }
    }

    /// The trimmed code that was submitted.
    #[must_use]
    pub fn query_code(&self) -> &str {
        &self.query_code
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> &VerificationStatus {
        &self.status
    }

    /// Whether the authority accepted the code.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self.status, VerificationStatus::Valid { .. })
    }

    /// The expiry of a valid code as a time of day, or `N/A`.
    #[must_use]
    pub fn expires_at_display(&self, offset: FixedOffset) -> String {
        match &self.status {
            VerificationStatus::Valid { expires_at, .. } => {
                render_time_of_day(*expires_at, offset)
            }
            _ => "N/A".to_string(),
        }
    }
}

/// A verification that has been started but not completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    /// Identifies this request to [`VerificationSession::complete_verify`].
    pub ticket: Ticket,
    /// The trimmed code to send to the authority.
    pub code: String,
}

/// Submits candidate codes and keeps the verdict for the latest one.
///
/// A new submission while another is pending supersedes it: the older answer is dropped
/// when it arrives.
#[derive(Debug, Clone)]
pub struct VerificationSession {
    outcome: VerificationOutcome,
    latest: Ticket,
}

impl VerificationSession {
    /// Creates a session with nothing submitted.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            outcome: VerificationOutcome::idle(),
            latest: Ticket::START,
        }
    }

    /// The latest outcome.
    #[must_use]
    pub const fn outcome(&self) -> &VerificationOutcome {
        &self.outcome
    }

    /// Whether a verification is waiting for the authority.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.outcome.status, VerificationStatus::Pending)
    }

    /// Trims `query_code` and, if anything is left, moves the session to `Pending`.
    ///
    /// # Errors
    /// [`PasscodeError::Validation`] for blank input. The session is left untouched.
    pub fn begin_verify(&mut self, query_code: &str) -> Result<PendingVerification, PasscodeError> {
        let code = query_code.trim();
        if code.is_empty() {
            return Err(PasscodeError::missing(RequiredField::QueryCode));
        }

        if self.is_pending() {
            log::debug!("verification {} superseded", self.latest);
        }
        self.latest = self.latest.next();
        self.outcome = VerificationOutcome {
            query_code: code.to_string(),
            status: VerificationStatus::Pending,
        };

        Ok(PendingVerification {
            ticket: self.latest,
            code: code.to_string(),
        })
    }

    /// Records the authority's answer for `ticket`. Returns `false` if the ticket was
    /// superseded or already answered, and the answer dropped.
    pub fn complete_verify(
        &mut self,
        ticket: Ticket,
        result: Result<ValidatedPasscode, PasscodeError>,
    ) -> bool {
        if ticket != self.latest {
            log::debug!("ignoring verification {ticket}, superseded by {}", self.latest);
            return false;
        }
        if !self.is_pending() {
            log::debug!("ignoring verification {ticket}, already answered");
            return false;
        }

        self.outcome.status = match result {
            Ok(validated) => VerificationStatus::Valid {
                owner_name: validated.name,
                expires_at: validated.expires_at,
            },
            Err(PasscodeError::AuthorityRejected { status, reason, .. }) => {
                VerificationStatus::Invalid {
                    reason,
                    cause: InvalidCause::Rejected { status },
                }
            }
            Err(e) => {
                log::warn!("verification {ticket} could not reach the authority: {e}");
                VerificationStatus::Invalid {
                    reason: TRANSPORT_FALLBACK_REASON.to_string(),
                    cause: InvalidCause::Transport,
                }
            }
        };
        true
    }

    /// Checks `query_code` with the authority and records the verdict.
    ///
    /// Authority and transport failures become an `Invalid` outcome, never an error.
    ///
    /// # Errors
    /// [`PasscodeError::Validation`] for blank input; no request is made.
    pub async fn verify<A: PasscodeAuthority>(
        &mut self,
        authority: &A,
        query_code: &str,
    ) -> Result<&VerificationOutcome, PasscodeError> {
        let pending = self.begin_verify(query_code)?;
        let result = authority.validate(&pending.code).await;
        self.complete_verify(pending.ticket, result);
        Ok(&self.outcome)
    }
}

impl Default for VerificationSession {
    fn default() -> Self {
        Self::new()
    }
}
