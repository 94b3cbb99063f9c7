use std::path::PathBuf;

use eyre::{Result, WrapErr};
use passcode_core::{
    AuthorityConfig, GenerationSession, PasscodeAuthority, QrRenderer, SvgQrRenderer,
    TerminalQrRenderer,
};

pub struct Options {
    pub name: String,
    pub custom_expiry: Option<String>,
    pub qr: bool,
    pub svg: Option<PathBuf>,
}

pub async fn run<A: PasscodeAuthority>(
    config: &AuthorityConfig,
    authority: &A,
    options: Options,
) -> Result<()> {
    let mut session = GenerationSession::new(config);
    session
        .generate(authority)
        .await
        .wrap_err("could not generate a passcode")?;

    session.set_recipient_name(options.name);
    if let Some(custom_expiry) = options.custom_expiry {
        session.set_custom_expiry(custom_expiry);
    }

    println!("{}", summary(&session)?);

    let payload = session.qr_payload()?;
    if options.qr {
        println!("\n{}", TerminalQrRenderer.render(&payload)?);
    }
    if let Some(path) = options.svg {
        let svg = SvgQrRenderer::default().render(&payload)?;
        std::fs::write(&path, svg)
            .wrap_err_with(|| format!("could not write {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote QR code");
    }

    Ok(())
}

fn summary(session: &GenerationSession) -> Result<String> {
    let payload = session.share_payload()?;
    let mut lines = vec![format!("Passcode:    {}", session.code())];
    if let Some(hint) = session.auto_expiry_hint() {
        lines.push(format!("Auto expiry: {hint}"));
    }
    lines.push(format!("Message:     {}", payload.message()));
    lines.push(format!("Link:        {}", payload.link()));
    Ok(lines.join("\n"))
}
