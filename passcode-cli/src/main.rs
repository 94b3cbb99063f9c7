//! `passcode`: generate, share and verify one-time passcodes from a terminal.

use std::{path::PathBuf, process::ExitCode, time::Duration};

use chrono::{FixedOffset, Local, Offset};
use clap::{Parser, Subcommand};
use eyre::Result;
use passcode_core::{AuthorityConfig, HttpAuthority};
use tracing_subscriber::EnvFilter;

mod generate;
mod verify;

/// Log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser)]
#[command(name = "passcode", about = "Share and verify one-time passcodes", version)]
struct Cli {
    /// Address of the passcode authority. Defaults to $PASSCODE_AUTHORITY_URL, then the hosted authority.
    #[arg(long, global = true)]
    authority_url: Option<String>,

    /// Request timeout in seconds. Defaults to $PASSCODE_AUTHORITY_TIMEOUT_SECS, then 10.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Offset used to show expiry times, e.g. "+01:00". Defaults to the local offset.
    #[arg(long, global = true, allow_hyphen_values = true)]
    utc_offset: Option<FixedOffset>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the authority for a passcode and print the share message, link and QR code.
    Generate {
        /// Name of the person receiving the passcode.
        #[arg(long)]
        name: String,

        /// Free-text expiry shown instead of the authority's, e.g. "4:00 PM".
        #[arg(long)]
        custom_expiry: Option<String>,

        /// Print the QR code for the share link.
        #[arg(long)]
        qr: bool,

        /// Also write the QR code as an SVG file.
        #[arg(long)]
        svg: Option<PathBuf>,
    },
    /// Check a passcode with the authority.
    Verify {
        /// The passcode to check.
        code: String,
    },
}

impl Cli {
    fn config(&self) -> Result<AuthorityConfig> {
        let mut config = AuthorityConfig::from_env()?;
        if let Some(url) = &self.authority_url {
            config = AuthorityConfig::new(url)?.with_timeout(config.timeout());
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        let offset = self
            .utc_offset
            .unwrap_or_else(|| Local::now().offset().fix());
        Ok(config.with_display_offset(offset))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;
    tracing::debug!(authority = %config.base_url(), "using passcode authority");
    let authority = HttpAuthority::new(config.clone());

    match cli.command {
        Command::Generate {
            name,
            custom_expiry,
            qr,
            svg,
        } => {
            let options = generate::Options {
                name,
                custom_expiry,
                qr,
                svg,
            };
            generate::run(&config, &authority, options).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { code } => {
            let valid = verify::run(&config, &authority, &code).await?;
            Ok(if valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_log_filter_is_info() {
        let filter = EnvFilter::new(DEFAULT_LOG_FILTER);
        assert_eq!(
            filter.max_level_hint(),
            Some(tracing_subscriber::filter::LevelFilter::INFO)
        );
    }

    #[test]
    fn test_parse_generate_with_negative_offset() {
        let cli = Cli::parse_from([
            "passcode",
            "--utc-offset",
            "-05:00",
            "generate",
            "--name",
            "Jane",
            "--custom-expiry",
            "5:00 PM",
        ]);
        assert_eq!(cli.utc_offset, FixedOffset::west_opt(5 * 3600));
        match cli.command {
            Command::Generate {
                name,
                custom_expiry,
                qr,
                svg,
            } => {
                assert_eq!(name, "Jane");
                assert_eq!(custom_expiry.as_deref(), Some("5:00 PM"));
                assert!(!qr);
                assert!(svg.is_none());
            }
            Command::Verify { .. } => panic!("expected generate"),
        }
    }

    #[test]
    fn test_authority_flag_overrides_default() {
        let cli = Cli::parse_from([
            "passcode",
            "verify",
            "A1B2C3",
            "--authority-url",
            "http://localhost:5000",
            "--timeout-secs",
            "3",
        ]);
        let config = cli.config().unwrap();
        assert_eq!(config.base_url().as_str(), "http://localhost:5000/");
        assert_eq!(config.timeout(), Duration::from_secs(3));
    }
}
