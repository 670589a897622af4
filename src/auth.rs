//! Credential digest check.
//!
//! Non-admin callers present `SHA-512(account + login + shared_secret)`.
//! The admin presents `SHA-512(YYYYMMDDHH + admin_secret)` built from local
//! wall time, so an admin token is valid for the current hour only, with no
//! grace period across the boundary.

use chrono::NaiveDateTime;
use sha2::{Digest, Sha512};

use crate::config::AuthConfig;
use crate::schemas::MethodRequest;

/// Hour window format of the admin digest.
pub const ADMIN_HOUR_FORMAT: &str = "%Y%m%d%H";

/// Hex-encoded SHA-512 of `input`.
pub fn sha512_hex(input: &str) -> String {
    hex::encode(Sha512::digest(input.as_bytes()))
}

#[derive(Debug, Clone)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn is_admin(&self, request: &MethodRequest) -> bool {
        request.is_admin(&self.config.admin_login)
    }

    /// Digest the request's token must equal at `now`.
    pub fn expected_digest(&self, request: &MethodRequest, now: NaiveDateTime) -> String {
        if self.is_admin(request) {
            let hour = now.format(ADMIN_HOUR_FORMAT).to_string();
            sha512_hex(&format!("{}{}", hour, self.config.admin_secret))
        } else {
            sha512_hex(&format!(
                "{}{}{}",
                request.account.as_deref().unwrap_or_default(),
                request.login.as_deref().unwrap_or_default(),
                self.config.shared_secret
            ))
        }
    }

    pub fn check_auth(&self, request: &MethodRequest, now: NaiveDateTime) -> bool {
        let Some(token) = request.token.as_deref() else {
            return false;
        };
        constant_time_compare(token, &self.expected_digest(request, now))
    }
}

/// Constant-time string comparison
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn authenticator() -> Authenticator {
        Authenticator::new(AuthConfig {
            shared_secret: "Otus".into(),
            admin_secret: "42".into(),
            admin_login: "admin".into(),
        })
    }

    fn request(account: Option<&str>, login: &str, token: Option<String>) -> MethodRequest {
        MethodRequest {
            account: account.map(str::to_owned),
            login: Some(login.to_owned()),
            token,
            arguments: None,
            method: "online_score".into(),
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(17, 45, 12)
            .unwrap()
    }

    #[test]
    fn test_user_digest() {
        let auth = authenticator();
        let expected = sha512_hex("horns&hoofsh&fOtus");
        assert_eq!(expected.len(), 128);

        let ok = request(Some("horns&hoofs"), "h&f", Some(expected.clone()));
        assert_eq!(auth.expected_digest(&ok, now()), expected);
        assert!(auth.check_auth(&ok, now()));

        let bad = request(Some("horns&hoofs"), "h&f", Some(sha512_hex("nope")));
        assert!(!auth.check_auth(&bad, now()));

        let missing = request(Some("horns&hoofs"), "h&f", None);
        assert!(!auth.check_auth(&missing, now()));
    }

    #[test]
    fn test_missing_account_is_empty_string() {
        let auth = authenticator();
        let req = request(None, "h&f", Some(sha512_hex("h&fOtus")));
        assert!(auth.check_auth(&req, now()));
    }

    #[test]
    fn test_admin_digest_is_hour_scoped() {
        let auth = authenticator();
        let token = sha512_hex("202403091742");
        let req = request(None, "admin", Some(token));

        assert!(auth.is_admin(&req));
        assert!(auth.check_auth(&req, now()));

        let same_hour = now().date().and_hms_opt(17, 0, 0).unwrap();
        assert!(auth.check_auth(&req, same_hour));

        let next_hour = now().date().and_hms_opt(18, 0, 0).unwrap();
        assert!(!auth.check_auth(&req, next_hour));
    }

    #[test]
    fn test_admin_cannot_use_user_digest() {
        let auth = authenticator();
        let req = request(None, "admin", Some(sha512_hex("adminOtus")));
        assert!(!auth.check_auth(&req, now()));
    }
}
