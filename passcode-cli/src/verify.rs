use chrono::FixedOffset;
use eyre::Result;
use passcode_core::{
    AuthorityConfig, PasscodeAuthority, VerificationOutcome, VerificationSession,
    VerificationStatus,
};

pub async fn run<A: PasscodeAuthority>(
    config: &AuthorityConfig,
    authority: &A,
    code: &str,
) -> Result<bool> {
    let mut session = VerificationSession::new();
    let outcome = session.verify(authority, code).await?;

    println!("{}", describe(outcome, config.display_offset()));

    Ok(outcome.is_valid())
}

fn describe(outcome: &VerificationOutcome, offset: FixedOffset) -> String {
    match outcome.status() {
        VerificationStatus::Valid { owner_name, .. } => format!(
            "Valid passcode\nName: {owner_name}\nExpires At: {}",
            outcome.expires_at_display(offset)
        ),
        VerificationStatus::Invalid { reason, .. } => format!("Invalid passcode: {reason}"),
        VerificationStatus::Idle | VerificationStatus::Pending => "Checking...".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Offset, TimeZone, Utc};
    use passcode_core::{IssuedPasscode, PasscodeError, ValidatedPasscode};

    struct Answering(Result<(), u16>);

    impl PasscodeAuthority for Answering {
        async fn generate(&self) -> Result<IssuedPasscode, PasscodeError> {
            unreachable!("verification never generates")
        }

        async fn validate(&self, code: &str) -> Result<ValidatedPasscode, PasscodeError> {
            match self.0 {
                Ok(()) => Ok(ValidatedPasscode {
                    name: format!("owner of {code}"),
                    expires_at: Utc.with_ymd_and_hms(2024, 1, 1, 16, 0, 0).unwrap(),
                }),
                Err(status) => Err(PasscodeError::AuthorityRejected {
                    url: "https://authority.test/api/passcodes/validate".to_string(),
                    status,
                    reason: "code expired".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_valid_description() {
        let mut session = VerificationSession::new();
        let outcome = session.verify(&Answering(Ok(())), "A1B2C3").await.unwrap();
        assert_eq!(
            describe(outcome, Utc.fix()),
            "Valid passcode\nName: owner of A1B2C3\nExpires At: 4:00:00 PM"
        );
    }

    #[tokio::test]
    async fn test_invalid_description_and_exit_code() {
        let mut session = VerificationSession::new();
        let outcome = session.verify(&Answering(Err(400)), "ZZZZZZ").await.unwrap();
        assert_eq!(describe(outcome, Utc.fix()), "Invalid passcode: code expired");

        let valid = run(&AuthorityConfig::default(), &Answering(Err(400)), "ZZZZZZ")
            .await
            .unwrap();
        assert!(!valid);
    }

    #[tokio::test]
    async fn test_blank_code_is_an_error() {
        let err = run(&AuthorityConfig::default(), &Answering(Ok(())), "   ")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("query_code"));
    }
}
