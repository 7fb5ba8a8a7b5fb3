//! Salted SHA-512 token check.
//!
//! Admin tokens are derived from the current local hour, so they rotate every
//! hour. Every other token is derived from the account and login.
//!
//! # Example
//!
//! ```
//! use scoring_core::{auth, check_auth, MethodRequest};
//!
//! let mut request = MethodRequest {
//!     account: Some("horns&hoofs".into()),
//!     login: "h&f".into(),
//!     ..MethodRequest::default()
//! };
//! assert!(!check_auth(&request));
//!
//! request.token = auth::user_token(request.account.as_deref(), &request.login);
//! assert!(check_auth(&request));
//! ```

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};
use sha2::{Digest, Sha512};

use crate::request::MethodRequest;

/// Salt appended to admin tokens.
pub const ADMIN_SALT: &str = "42";

/// Salt appended to account tokens.
pub const SALT: &str = "Otus";

/// Hour bucket format of admin tokens.
const HOUR_FORMAT: &str = "%Y%m%d%H";

/// Checks the request token against the current local time.
#[must_use]
pub fn check_auth(request: &MethodRequest) -> bool {
    check_auth_at(request, &Local::now())
}

/// Checks the request token against the given instant.
#[must_use]
pub fn check_auth_at<Tz>(request: &MethodRequest, now: &DateTime<Tz>) -> bool
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let expected = if request.is_admin() {
        admin_token(now)
    } else {
        user_token(request.account.as_deref(), &request.login)
    };
    expected == request.token
}

/// Returns the admin token valid during the hour containing `now`.
#[must_use]
pub fn admin_token<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    digest(&format!("{}{ADMIN_SALT}", now.format(HOUR_FORMAT)))
}

/// Returns the token of a non-admin caller.
#[must_use]
pub fn user_token(account: Option<&str>, login: &str) -> String {
    digest(&format!("{}{login}{SALT}", account.unwrap_or_default()))
}

fn digest(input: &str) -> String {
    hex::encode(Sha512::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 7, 20, hour, minute, 0).unwrap()
    }

    fn admin(token: String) -> MethodRequest {
        MethodRequest {
            login: "admin".into(),
            token,
            ..MethodRequest::default()
        }
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            digest("abc"),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    #[test]
    fn test_user_token_concatenation() {
        assert_eq!(user_token(Some("acc"), "log"), digest("acclogOtus"));
        assert_eq!(user_token(None, "log"), digest("logOtus"));
    }

    #[test]
    fn test_admin_token_uses_hour_bucket() {
        assert_eq!(admin_token(&at(13, 5)), digest("201707201342"));
    }

    #[test]
    fn test_admin_token_stable_within_hour() {
        let token = admin_token(&at(13, 0));
        assert!(check_auth_at(&admin(token.clone()), &at(13, 59)));
        assert!(!check_auth_at(&admin(token), &at(14, 0)));
    }

    #[test]
    fn test_admin_token_follows_local_offset() {
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let moscow = at(13, 5).with_timezone(&offset);
        assert_eq!(admin_token(&moscow), digest("201707201642"));
    }

    #[test]
    fn test_user_token_ignores_clock() {
        let request = MethodRequest {
            account: Some("horns&hoofs".into()),
            login: "h&f".into(),
            token: user_token(Some("horns&hoofs"), "h&f"),
            ..MethodRequest::default()
        };
        assert!(check_auth_at(&request, &at(1, 0)));
        assert!(check_auth_at(&request, &at(23, 0)));
    }

    #[test]
    fn test_token_comparison_is_exact() {
        let token = user_token(None, "h&f").to_uppercase();
        let request = MethodRequest {
            login: "h&f".into(),
            token,
            ..MethodRequest::default()
        };
        assert!(!check_auth(&request));
    }

    #[test]
    fn test_empty_token_is_rejected() {
        assert!(!check_auth(&admin(String::new())));
        assert!(!check_auth(&MethodRequest::default()));
    }
}
