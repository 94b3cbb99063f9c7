//! Client-side core for sharing and verifying one-time passcodes.
//!
//! A [`GenerationSession`] obtains a passcode from the passcode authority, pairs it with a
//! recipient and an expiry, and derives the share message and the deep link (which is
//! also the QR payload). A [`VerificationSession`] submits a typed code to the authority
//! and keeps the verdict. The two sessions share nothing.
//!
//! ```rust,no_run
//! use passcode_core::{AuthorityConfig, GenerationSession, HttpAuthority, PasscodeError};
//!
//! # async fn share() -> Result<(), PasscodeError> {
//! let config = AuthorityConfig::from_env()?;
//! let authority = HttpAuthority::new(config.clone());
//!
//! let mut session = GenerationSession::new(&config);
//! session.generate(&authority).await?;
//! session.set_recipient_name("Jane");
//! println!("{}", session.build_share_link()?);
//! # Ok(())
//! # }
//! ```
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

mod authority;
pub use authority::*;

mod config;
pub use config::*;

pub mod defaults;

mod error;
pub use error::*;

pub mod expiry;

mod generation;
pub use generation::*;

pub mod logger;

mod share;
pub use share::*;

mod ticket;
pub use ticket::*;

mod verification;
pub use verification::*;

// private modules
mod http_request;

uniffi::setup_scaffolding!("passcode_core");
