//! Defaults for the hosted passcode authority and the texts shown when it gives no reason.

use std::time::Duration;

/// Address of the hosted passcode authority.
pub const DEFAULT_AUTHORITY_URL: &str = "https://passcode-generator-app.onrender.com";

/// Deep-link base that pre-fills a WhatsApp message.
pub const DEFAULT_SHARE_BASE_URL: &str = "https://wa.me/";

/// Per-request timeout applied by the transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) const GENERATE_PATH: &str = "/api/passcodes/generate";
pub(crate) const VALIDATE_PATH: &str = "/api/passcodes/validate";

/// Shown when the authority rejects a code without saying why.
pub const REJECTED_FALLBACK_REASON: &str =
    "An error occurred while verifying the passcode.";

/// Used when the authority refuses to mint a passcode without saying why.
pub const GENERATION_FALLBACK_REASON: &str = "Passcode generation failed.";

/// Shown when the authority could not be reached or its answer was unreadable.
pub const TRANSPORT_FALLBACK_REASON: &str = "An unexpected error occurred.";
