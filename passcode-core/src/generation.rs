//! The operator side: obtain a passcode, attach a recipient and expiry, and share it.

use chrono::{DateTime, FixedOffset, Utc};
use reqwest::Url;

use crate::{
    authority::{IssuedPasscode, PasscodeAuthority},
    config::AuthorityConfig,
    error::{PasscodeError, RequiredField},
    expiry::{render_time_of_day, resolve_expiry},
    share::SharePayload,
    Ticket,
};

/// Holds one passcode-to-be-shared.
///
/// Calls to the authority are split in two halves so a host can drive them from its own
/// event loop: [`begin_generate`](Self::begin_generate) hands out a [`Ticket`], and
/// [`complete_generate`](Self::complete_generate) applies the authority's answer only if
/// no newer request was started in the meantime.
#[derive(Debug, Clone)]
pub struct GenerationSession {
    code: String,
    recipient_name: String,
    auto_expires_at: Option<DateTime<Utc>>,
    custom_expires_at: String,
    share_base_url: Url,
    display_offset: FixedOffset,
    latest: Ticket,
    in_flight: bool,
}

impl GenerationSession {
    /// Creates an empty session that renders with the given settings.
    #[must_use]
    pub fn new(config: &AuthorityConfig) -> Self {
        Self {
            code: String::new(),
            recipient_name: String::new(),
            auto_expires_at: None,
            custom_expires_at: String::new(),
            share_base_url: config.share_base_url().clone(),
            display_offset: config.display_offset(),
            latest: Ticket::default(),
            in_flight: false,
        }
    }

    /// The passcode, empty until one has been generated.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Who the passcode will be sent to.
    #[must_use]
    pub fn recipient_name(&self) -> &str {
        &self.recipient_name
    }

    /// Expiry reported by the authority for the current passcode.
    #[must_use]
    pub const fn auto_expires_at(&self) -> Option<DateTime<Utc>> {
        self.auto_expires_at
    }

    /// Operator-entered expiry text.
    #[must_use]
    pub fn custom_expires_at(&self) -> &str {
        &self.custom_expires_at
    }

    /// Whether a generation request is waiting for the authority.
    #[must_use]
    pub const fn is_generating(&self) -> bool {
        self.in_flight
    }

    /// Sets the recipient's name.
    pub fn set_recipient_name(&mut self, name: impl Into<String>) {
        self.recipient_name = name.into();
    }

    /// Sets the free-text expiry that overrides the authority's.
    pub fn set_custom_expiry(&mut self, text: impl Into<String>) {
        self.custom_expires_at = text.into();
    }

    /// Marks a generation request as started and returns its ticket.
    ///
    /// Any earlier ticket is superseded.
    pub fn begin_generate(&mut self) -> Ticket {
        self.latest = self.latest.next();
        self.in_flight = true;
        log::debug!("generation {} started", self.latest);
        self.latest
    }

    /// Applies the authority's answer to the request identified by `ticket`.
    ///
    /// A superseded or already answered ticket is ignored and `Ok(false)` is returned. On
    /// success the new code and expiry replace the old ones and any custom expiry is
    /// dropped.
    ///
    /// # Errors
    /// Returns the authority's error for the current ticket; the session state is left as
    /// it was before the request.
    pub fn complete_generate(
        &mut self,
        ticket: Ticket,
        result: Result<IssuedPasscode, PasscodeError>,
    ) -> Result<bool, PasscodeError> {
        if ticket != self.latest {
            log::debug!("ignoring generation {ticket}, superseded by {}", self.latest);
            return Ok(false);
        }
        if !self.in_flight {
            log::debug!("ignoring generation {ticket}, already answered");
            return Ok(false);
        }
        self.in_flight = false;

        let issued = result.inspect_err(|e| {
            log::warn!("passcode generation failed: {e}");
        })?;
        self.code = issued.code;
        self.auto_expires_at = Some(issued.expires_at);
        self.custom_expires_at.clear();
        log::info!("passcode generated, expires at {}", issued.expires_at);
        Ok(true)
    }

    /// Requests a fresh passcode and applies it.
    ///
    /// # Errors
    /// Whatever the authority call failed with. Nothing is retried.
    pub async fn generate<A: PasscodeAuthority>(
        &mut self,
        authority: &A,
    ) -> Result<(), PasscodeError> {
        let ticket = self.begin_generate();
        let result = authority.generate().await;
        self.complete_generate(ticket, result).map(|_| ())
    }

    /// Clears every field. In-flight requests are superseded.
    pub fn reset(&mut self) {
        self.code.clear();
        self.recipient_name.clear();
        self.auto_expires_at = None;
        self.custom_expires_at.clear();
        self.latest = self.latest.next();
        self.in_flight = false;
    }

    /// The expiry text a share message would carry.
    #[must_use]
    pub fn resolved_expiry(&self) -> Option<String> {
        resolve_expiry(
            &self.custom_expires_at,
            self.auto_expires_at,
            self.display_offset,
        )
    }

    /// The authority's expiry, rendered, while no custom expiry overrides it.
    #[must_use]
    pub fn auto_expiry_hint(&self) -> Option<String> {
        if !self.custom_expires_at.is_empty() {
            return None;
        }
        self.auto_expires_at
            .map(|at| render_time_of_day(at, self.display_offset))
    }

    /// Whether every field needed for a share payload is present.
    #[must_use]
    pub fn is_share_ready(&self) -> bool {
        self.share_payload().is_ok()
    }

    /// Builds the message and link for the current state.
    ///
    /// # Errors
    /// [`PasscodeError::Validation`] naming the first missing field.
    pub fn share_payload(&self) -> Result<SharePayload, PasscodeError> {
        let expiry = self.resolved_expiry().unwrap_or_default();
        SharePayload::new(&self.share_base_url, &self.recipient_name, &self.code, &expiry)
    }

    /// `"Hello {name}. Your one time accesscode is: {code}, and expires at: {expiry}"`
    ///
    /// # Errors
    /// [`PasscodeError::Validation`] unless code, recipient name and an expiry are present.
    pub fn build_share_message(&self) -> Result<String, PasscodeError> {
        self.share_payload()
            .map(|payload| payload.message().to_string())
    }

    /// The deep link carrying the share message.
    ///
    /// # Errors
    /// Same preconditions as [`build_share_message`](Self::build_share_message).
    pub fn build_share_link(&self) -> Result<String, PasscodeError> {
        self.share_payload().map(|payload| payload.link().to_string())
    }

    /// The text to encode as a QR code; always identical to the share link.
    ///
    /// # Errors
    /// Same preconditions as [`build_share_message`](Self::build_share_message).
    pub fn qr_payload(&self) -> Result<String, PasscodeError> {
        self.share_payload()
            .map(|payload| payload.qr_payload().to_string())
    }

    /// Names the first field that keeps a share payload from being built.
    #[must_use]
    pub fn missing_field(&self) -> Option<RequiredField> {
        match self.share_payload() {
            Err(PasscodeError::Validation { field }) => Some(field),
            _ => None,
        }
    }
}

impl Default for GenerationSession {
    fn default() -> Self {
        Self::new(&AuthorityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn issued(code: &str) -> IssuedPasscode {
        IssuedPasscode {
            code: code.to_string(),
            expires_at: Utc.with_ymd_and_hms(2024, 1, 1, 16, 0, 0).unwrap(),
        }
    }

    fn generated() -> GenerationSession {
        let mut session = GenerationSession::default();
        let ticket = session.begin_generate();
        session.complete_generate(ticket, Ok(issued("A1B2C3"))).unwrap();
        session
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = GenerationSession::default();
        assert_eq!(session.code(), "");
        assert_eq!(session.recipient_name(), "");
        assert_eq!(session.auto_expires_at(), None);
        assert_eq!(session.custom_expires_at(), "");
        assert!(!session.is_generating());
        assert_eq!(session.missing_field(), Some(RequiredField::Code));
    }

    #[test]
    fn test_auto_expiry_message() {
        let mut session = generated();
        session.set_recipient_name("Jane");
        assert_eq!(
            session.build_share_message().unwrap(),
            "Hello Jane. Your one time accesscode is: A1B2C3, and expires at: 4:00:00 PM"
        );
    }

    #[test]
    fn test_custom_expiry_overrides_auto() {
        let mut session = generated();
        session.set_recipient_name("Jane");
        session.set_custom_expiry("5:00 PM");
        assert_eq!(
            session.build_share_message().unwrap(),
            "Hello Jane. Your one time accesscode is: A1B2C3, and expires at: 5:00 PM"
        );
        assert_eq!(session.auto_expiry_hint(), None);
    }

    #[test]
    fn test_generation_drops_custom_expiry() {
        let mut session = GenerationSession::default();
        session.set_recipient_name("Jane");
        session.set_custom_expiry("noon");
        assert_eq!(session.missing_field(), Some(RequiredField::Code));

        let ticket = session.begin_generate();
        session.complete_generate(ticket, Ok(issued("Q9"))).unwrap();
        // generation drops the override, the auto expiry takes over
        assert_eq!(session.custom_expires_at(), "");
        assert_eq!(session.resolved_expiry().as_deref(), Some("4:00:00 PM"));
    }

    #[test]
    fn test_missing_name_blocks_share() {
        let session = generated();
        assert!(!session.is_share_ready());
        assert_eq!(session.missing_field(), Some(RequiredField::RecipientName));
        assert!(session.build_share_link().unwrap_err().is_validation());
    }

    #[test]
    fn test_failed_generation_keeps_state() {
        let mut session = generated();
        session.set_custom_expiry("5:00 PM");
        let ticket = session.begin_generate();
        assert!(session.is_generating());

        let err = session
            .complete_generate(
                ticket,
                Err(PasscodeError::Transport {
                    url: "https://authority.test".to_string(),
                    error: "timed out".to_string(),
                }),
            )
            .unwrap_err();

        assert!(matches!(err, PasscodeError::Transport { .. }));
        assert!(!session.is_generating());
        assert_eq!(session.code(), "A1B2C3");
        assert_eq!(session.custom_expires_at(), "5:00 PM");
    }

    #[test]
    fn test_superseded_generation_is_ignored() {
        let mut session = GenerationSession::default();
        let first = session.begin_generate();
        let second = session.begin_generate();

        assert!(session.complete_generate(second, Ok(issued("NEW"))).unwrap());
        assert!(!session.complete_generate(first, Ok(issued("OLD"))).unwrap());
        assert_eq!(session.code(), "NEW");
    }

    #[test]
    fn test_answered_ticket_is_retired() {
        let mut session = GenerationSession::default();
        let ticket = session.begin_generate();
        assert!(session.complete_generate(ticket, Ok(issued("FIRST"))).unwrap());
        session.set_custom_expiry("5:00 PM");

        let repeat = session.complete_generate(
            ticket,
            Err(PasscodeError::Transport {
                url: String::new(),
                error: "duplicate".to_string(),
            }),
        );
        assert!(matches!(repeat, Ok(false)));
        assert!(!session.complete_generate(ticket, Ok(issued("SECOND"))).unwrap());
        assert_eq!(session.code(), "FIRST");
        assert_eq!(session.custom_expires_at(), "5:00 PM");
    }

    #[test]
    fn test_stale_failure_does_not_surface() {
        let mut session = GenerationSession::default();
        let first = session.begin_generate();
        let _second = session.begin_generate();
        let applied = session.complete_generate(
            first,
            Err(PasscodeError::Transport {
                url: String::new(),
                error: "late".to_string(),
            }),
        );
        assert!(matches!(applied, Ok(false)));
        assert!(session.is_generating());
    }

    #[test]
    fn test_reset_clears_everything_and_supersedes() {
        let mut session = generated();
        session.set_recipient_name("Jane");
        session.set_custom_expiry("5:00 PM");
        let pending = session.begin_generate();

        session.reset();

        assert_eq!(session.code(), "");
        assert_eq!(session.recipient_name(), "");
        assert_eq!(session.auto_expires_at(), None);
        assert_eq!(session.custom_expires_at(), "");
        assert!(!session.is_generating());
        assert!(session.build_share_message().is_err());
        assert!(session.build_share_link().is_err());
        assert!(!session.complete_generate(pending, Ok(issued("LATE"))).unwrap());
        assert_eq!(session.code(), "");

        session.reset();
        assert!(session.qr_payload().is_err());
    }

    #[test]
    fn test_qr_payload_matches_link() {
        let mut session = generated();
        session.set_recipient_name("Jane");
        assert_eq!(session.qr_payload().unwrap(), session.build_share_link().unwrap());
    }

    #[test]
    fn test_auto_expiry_hint_follows_display_offset() {
        let config = AuthorityConfig::default()
            .with_display_offset(FixedOffset::west_opt(5 * 3600).unwrap());
        let mut session = GenerationSession::new(&config);
        let ticket = session.begin_generate();
        session.complete_generate(ticket, Ok(issued("A1B2C3"))).unwrap();
        assert_eq!(session.auto_expiry_hint().as_deref(), Some("11:00:00 AM"));
    }
}
