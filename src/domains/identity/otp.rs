use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const DEFAULT_OTP_DIGITS: u32 = 6;
pub const DEFAULT_OTP_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Registration,
    PasswordReset,
}

/// An outstanding passcode. Only a digest of the code is kept so stored
/// documents and event logs never contain the code itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneTimePasscode {
    pub code_digest: String,
    pub purpose: OtpPurpose,
    pub expires_at: DateTime<Utc>,
}

impl OneTimePasscode {
    pub fn new(code: &str, purpose: OtpPurpose, expires_at: DateTime<Utc>) -> Self {
        Self {
            code_digest: digest_code(code),
            purpose,
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn matches(&self, code: &str, purpose: OtpPurpose, now: DateTime<Utc>) -> bool {
        self.purpose == purpose && !self.is_expired(now) && self.code_digest == digest_code(code.trim())
    }
}

/// Produces numeric passcodes and their expiry.
#[derive(Debug, Clone)]
pub struct OtpGenerator {
    digits: u32,
    ttl: Duration,
}

impl OtpGenerator {
    pub fn new(digits: u32, ttl_minutes: i64) -> Self {
        Self {
            digits: digits.clamp(4, 10),
            ttl: Duration::minutes(ttl_minutes.max(1)),
        }
    }

    pub fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.digits)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }

    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.ttl
    }
}

impl Default for OtpGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_OTP_DIGITS, DEFAULT_OTP_TTL_MINUTES)
    }
}

fn digest_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_numeric_with_configured_length() {
        let generator = OtpGenerator::new(6, 10);
        for _ in 0..20 {
            let code = generator.generate();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn passcode_checks_code_purpose_and_expiry() {
        let now = Utc::now();
        let otp = OneTimePasscode::new("123456", OtpPurpose::Registration, now + Duration::minutes(10));

        assert!(otp.matches("123456", OtpPurpose::Registration, now));
        assert!(!otp.matches("654321", OtpPurpose::Registration, now));
        assert!(!otp.matches("123456", OtpPurpose::PasswordReset, now));
        assert!(!otp.matches("123456", OtpPurpose::Registration, now + Duration::minutes(11)));
        assert_ne!(otp.code_digest, "123456");
    }
}
