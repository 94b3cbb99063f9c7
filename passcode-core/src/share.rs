//! Turns a passcode into the message, deep link and QR payload handed to the recipient.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;

use crate::{
    config::AuthorityConfig,
    error::{PasscodeError, RequiredField},
};

/// Everything `encodeURIComponent` escapes.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Query parameter the messaging app reads the pre-filled text from.
const TEXT_PARAM: &str = "text";

/// The message and the link that carries it. The link doubles as the QR payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    message: String,
    link: String,
}

impl SharePayload {
    /// Builds the payload for the given fields.
    ///
    /// # Errors
    /// [`PasscodeError::Validation`] naming the first empty field.
    pub fn new(
        share_base_url: &Url,
        recipient_name: &str,
        code: &str,
        expiry: &str,
    ) -> Result<Self, PasscodeError> {
        let message = share_message(recipient_name, code, expiry)?;
        let link = deep_link(share_base_url, &message);
        Ok(Self { message, link })
    }

    /// The human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The deep link with the message percent-encoded into it.
    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }

    /// The exact text to encode as a QR code.
    #[must_use]
    pub fn qr_payload(&self) -> &str {
        &self.link
    }
}

/// Renders the share template.
///
/// # Errors
/// [`PasscodeError::Validation`] naming the first empty field.
pub fn share_message(
    recipient_name: &str,
    code: &str,
    expiry: &str,
) -> Result<String, PasscodeError> {
    if code.is_empty() {
        return Err(PasscodeError::missing(RequiredField::Code));
    }
    if recipient_name.is_empty() {
        return Err(PasscodeError::missing(RequiredField::RecipientName));
    }
    if expiry.is_empty() {
        return Err(PasscodeError::missing(RequiredField::Expiry));
    }

    Ok(format!(
        "Hello {recipient_name}. Your one time accesscode is: {code}, and expires at: {expiry}"
    ))
}

fn deep_link(base: &Url, message: &str) -> String {
    let separator = if base.query().is_some() { '&' } else { '?' };
    format!(
        "{base}{separator}{TEXT_PARAM}={}",
        utf8_percent_encode(message, URI_COMPONENT)
    )
}

/// Builds the default share link for already-resolved fields.
///
/// # Errors
/// [`PasscodeError::Validation`] naming the first empty field.
#[uniffi::export]
pub fn share_link_for(
    recipient_name: &str,
    code: &str,
    expiry: &str,
) -> Result<String, PasscodeError> {
    let config = AuthorityConfig::default();
    SharePayload::new(config.share_base_url(), recipient_name, code, expiry)
        .map(|payload| payload.link)
}

/// Turns a share payload into a visual code.
///
/// QR drawing happens outside the session logic; hosts plug in whatever renderer suits them.
pub trait QrRenderer {
    /// The rendered output, e.g. an SVG document.
    type Output;
    /// Why rendering failed.
    type Error: std::error::Error;

    /// Renders `payload` as a QR code.
    ///
    /// # Errors
    /// When the payload cannot be encoded, typically because it is too long.
    fn render(&self, payload: &str) -> Result<Self::Output, Self::Error>;
}

#[cfg(feature = "qr")]
pub use qr::{SvgQrRenderer, TerminalQrRenderer};

#[cfg(feature = "qr")]
mod qr {
    use qrcode::{
        render::{svg, unicode},
        types::QrError,
        QrCode,
    };

    use super::QrRenderer;

    /// SVG renderer backed by the `qrcode` crate.
    #[derive(Debug, Clone)]
    pub struct SvgQrRenderer {
        /// Minimum width and height of the image, in pixels.
        pub min_size: u32,
        /// Dark color (hex format)
        pub dark_color: String,
        /// Light color (hex format)
        pub light_color: String,
    }

    impl Default for SvgQrRenderer {
        fn default() -> Self {
            Self {
                min_size: 180,
                dark_color: "#000000".to_string(),
                light_color: "#FFFFFF".to_string(),
            }
        }
    }

    impl QrRenderer for SvgQrRenderer {
        type Output = String;
        type Error = QrError;

        fn render(&self, payload: &str) -> Result<String, QrError> {
            Ok(QrCode::new(payload)?
                .render::<svg::Color>()
                .min_dimensions(self.min_size, self.min_size)
                .dark_color(svg::Color(&self.dark_color))
                .light_color(svg::Color(&self.light_color))
                .build())
        }
    }

    /// Renders with half-block characters for display in a terminal.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct TerminalQrRenderer;

    impl QrRenderer for TerminalQrRenderer {
        type Output = String;
        type Error = QrError;

        fn render(&self, payload: &str) -> Result<String, QrError> {
            Ok(QrCode::new(payload)?
                .render::<unicode::Dense1x2>()
                .dark_color(unicode::Dense1x2::Light)
                .light_color(unicode::Dense1x2::Dark)
                .build())
        }
    }
}
