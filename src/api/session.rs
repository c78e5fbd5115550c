//! Signed, time-bounded cookies carrying a validated identity.
//!
//! Signing is done with the `cookie` crate's signed jar (HMAC-SHA256) and is
//! usable without a request; the web layer only moves the resulting
//! [`Cookie`]s in and out of an axum [`CookieJar`].

use axum_extra::extract::CookieJar;
use chrono::{DateTime, TimeDelta, Utc};
use cookie::{Cookie, Key, SameSite};
use rand::Rng;
use sha2::{Digest, Sha256, Sha512};
use std::sync::Arc;

use crate::constants::cookies::{ADMIN_COOKIE, ADMIN_MAX_AGE_MS, SESSION_MAX_AGE_MS, SITE_COOKIE};
use crate::services::Clock;

const ADMIN_MARKER: &str = "granted";

/// Separates the value from its expiry (unix millis) inside the signed payload.
const EXPIRY_SEPARATOR: char = '|';

/// Signs and verifies cookie values with a process-wide key.
#[derive(Clone)]
pub struct CookieSigner {
    key: Key,
}

impl CookieSigner {
    /// Derives the 64-byte signing key from an arbitrary-length secret.
    #[must_use]
    pub fn from_secret(secret: &str) -> Self {
        let digest = Sha512::digest(secret.as_bytes());
        Self {
            key: Key::from(digest.as_slice()),
        }
    }

    /// Random key; cookies signed with it die with the process.
    #[must_use]
    pub fn random() -> Self {
        let mut bytes = [0u8; 64];
        rand::rng().fill(&mut bytes);
        Self {
            key: Key::from(&bytes[..]),
        }
    }

    /// Returns the signed form of `value` for a cookie called `name`.
    #[must_use]
    pub fn sign(&self, name: &str, value: &str) -> String {
        let mut jar = cookie::CookieJar::new();
        jar.signed_mut(&self.key)
            .add(Cookie::new(name.to_string(), value.to_string()));
        jar.get(name)
            .map(|c| c.value().to_string())
            .unwrap_or_default()
    }

    /// Returns the original value when `signed` carries a valid signature for `name`.
    #[must_use]
    pub fn verify(&self, name: &str, signed: &str) -> Option<String> {
        let mut jar = cookie::CookieJar::new();
        jar.add_original(Cookie::new(name.to_string(), signed.to_string()));
        jar.signed(&self.key)
            .get(name)
            .map(|c| c.value().to_string())
    }

    /// Signs `value` together with the instant it stops being accepted.
    #[must_use]
    pub fn sign_until(&self, name: &str, value: &str, expires_at: DateTime<Utc>) -> String {
        let payload = format!(
            "{value}{EXPIRY_SEPARATOR}{}",
            expires_at.timestamp_millis()
        );
        self.sign(name, &payload)
    }

    /// Value signed by [`Self::sign_until`], as long as `now` is not past its expiry.
    /// Payloads without an expiry are rejected.
    #[must_use]
    pub fn verify_at(&self, name: &str, signed: &str, now: DateTime<Utc>) -> Option<String> {
        let payload = self.verify(name, signed)?;
        let (value, expires_ms) = payload.rsplit_once(EXPIRY_SEPARATOR)?;
        let expires_ms: i64 = expires_ms.parse().ok()?;

        (now.timestamp_millis() <= expires_ms).then(|| value.to_string())
    }
}

fn base_cookie(name: &'static str, value: String, secure: bool, max_age_ms: i64) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(time::Duration::milliseconds(max_age_ms))
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::from(name);
    cookie.set_path("/");
    cookie
}

/// End-user session cookie (`site_auth`), value = `username|expires_ms`.
#[derive(Clone)]
pub struct SessionCookies {
    signer: CookieSigner,
    secure: bool,
    clock: Arc<dyn Clock>,
}

impl SessionCookies {
    #[must_use]
    pub fn new(signer: CookieSigner, secure: bool, clock: Arc<dyn Clock>) -> Self {
        Self {
            signer,
            secure,
            clock,
        }
    }

    /// Max age is `min(remaining_ms, 7 days)` so even long-lived accounts
    /// log in again weekly. The same bound is signed into the value and
    /// enforced by [`Self::read`], so a replayed cookie dies with it.
    ///
    /// A `remaining_ms` of zero yields `Max-Age=0`, which browsers drop at
    /// once; the login handler refuses to issue one.
    #[must_use]
    pub fn issue(&self, username: &str, remaining_ms: i64) -> Cookie<'static> {
        let max_age_ms = remaining_ms.clamp(0, SESSION_MAX_AGE_MS);
        let expires_at = self.clock.now() + TimeDelta::milliseconds(max_age_ms);

        base_cookie(
            SITE_COOKIE,
            self.signer.sign_until(SITE_COOKIE, username, expires_at),
            self.secure,
            max_age_ms,
        )
    }

    /// Username carried by a correctly signed, unexpired cookie; `None` otherwise.
    #[must_use]
    pub fn read(&self, jar: &CookieJar) -> Option<String> {
        let now = self.clock.now();
        jar.get(SITE_COOKIE)
            .and_then(|c| self.signer.verify_at(SITE_COOKIE, c.value(), now))
            .filter(|username| !username.is_empty())
    }

    #[must_use]
    pub fn clear(&self) -> Cookie<'static> {
        removal_cookie(SITE_COOKIE)
    }
}

/// Admin cookie (`admin_auth`) granted by the shared admin secret.
#[derive(Clone)]
pub struct AdminSession {
    signer: CookieSigner,
    secure: bool,
    password_digest: Option<[u8; 32]>,
    clock: Arc<dyn Clock>,
}

impl AdminSession {
    #[must_use]
    pub fn new(
        signer: CookieSigner,
        secure: bool,
        admin_password: &str,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let password_digest = if admin_password.is_empty() {
            None
        } else {
            Some(Sha256::digest(admin_password.as_bytes()).into())
        };

        Self {
            signer,
            secure,
            password_digest,
            clock,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.password_digest.is_some()
    }

    /// Constant-time comparison of SHA-256 digests.
    #[must_use]
    pub fn check_password(&self, candidate: &str) -> bool {
        let Some(expected) = self.password_digest else {
            return false;
        };
        let actual = Sha256::digest(candidate.as_bytes());

        expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    #[must_use]
    pub fn issue(&self) -> Cookie<'static> {
        let expires_at = self.clock.now() + TimeDelta::milliseconds(ADMIN_MAX_AGE_MS);
        base_cookie(
            ADMIN_COOKIE,
            self.signer.sign_until(ADMIN_COOKIE, ADMIN_MARKER, expires_at),
            self.secure,
            ADMIN_MAX_AGE_MS,
        )
    }

    #[must_use]
    pub fn read(&self, jar: &CookieJar) -> bool {
        let now = self.clock.now();
        jar.get(ADMIN_COOKIE)
            .and_then(|c| self.signer.verify_at(ADMIN_COOKIE, c.value(), now))
            .is_some_and(|value| value == ADMIN_MARKER)
    }

    #[must_use]
    pub fn clear(&self) -> Cookie<'static> {
        removal_cookie(ADMIN_COOKIE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ManualClock;
    use chrono::TimeZone;

    fn jar_with(name: &'static str, value: String) -> CookieJar {
        CookieJar::new().add(Cookie::new(name, value))
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        ))
    }

    fn session_cookies(secure: bool, clock: &Arc<ManualClock>) -> SessionCookies {
        SessionCookies::new(CookieSigner::from_secret("s"), secure, clock.clone())
    }

    fn admin_session(password: &str, clock: &Arc<ManualClock>) -> AdminSession {
        AdminSession::new(CookieSigner::from_secret("s"), true, password, clock.clone())
    }

    #[test]
    fn sign_then_verify() {
        let signer = CookieSigner::from_secret("test-secret");
        let signed = signer.sign(SITE_COOKIE, "alice");

        assert_ne!(signed, "alice");
        assert_eq!(signer.verify(SITE_COOKIE, &signed).as_deref(), Some("alice"));
    }

    #[test]
    fn verify_rejects_tampering() {
        let signer = CookieSigner::from_secret("test-secret");
        let signed = signer.sign(SITE_COOKIE, "alice");
        let tampered = signed.replace("alice", "admin");

        assert_eq!(signer.verify(SITE_COOKIE, &tampered), None);
        assert_eq!(signer.verify(SITE_COOKIE, "alice"), None);
    }

    #[test]
    fn verify_rejects_other_key() {
        let signed = CookieSigner::from_secret("one").sign(SITE_COOKIE, "alice");
        assert_eq!(CookieSigner::from_secret("two").verify(SITE_COOKIE, &signed), None);
        assert_eq!(CookieSigner::random().verify(SITE_COOKIE, &signed), None);
    }

    #[test]
    fn verify_at_honours_embedded_expiry() {
        let signer = CookieSigner::from_secret("s");
        let expires_at = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let signed = signer.sign_until(SITE_COOKIE, "alice", expires_at);

        assert_eq!(
            signer.verify_at(SITE_COOKIE, &signed, expires_at).as_deref(),
            Some("alice")
        );
        assert_eq!(
            signer.verify_at(SITE_COOKIE, &signed, expires_at + TimeDelta::milliseconds(1)),
            None
        );

        let without_expiry = signer.sign(SITE_COOKIE, "alice");
        assert_eq!(signer.verify_at(SITE_COOKIE, &without_expiry, expires_at), None);
    }

    #[test]
    fn usernames_may_contain_the_separator() {
        let signer = CookieSigner::from_secret("s");
        let expires_at = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let signed = signer.sign_until(SITE_COOKIE, "a|b", expires_at);

        assert_eq!(
            signer.verify_at(SITE_COOKIE, &signed, expires_at).as_deref(),
            Some("a|b")
        );
    }

    #[test]
    fn session_cookie_flags_and_ceiling() {
        let cookies = session_cookies(true, &clock());
        let thirty_days = 30 * 24 * 60 * 60 * 1000;
        let cookie = cookies.issue("alice", thirty_days);

        assert_eq!(cookie.name(), SITE_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
    }

    #[test]
    fn session_cookie_follows_shorter_account_lifetime() {
        let cookies = session_cookies(false, &clock());
        let cookie = cookies.issue("alice", 60 * 60 * 1000);

        assert_eq!(cookie.max_age(), Some(time::Duration::hours(1)));
        assert_eq!(cookie.secure(), Some(false));
    }

    #[test]
    fn session_read_round_trip() {
        let cookies = session_cookies(false, &clock());
        let issued = cookies.issue("alice", 1000);
        let jar = jar_with(SITE_COOKIE, issued.value().to_string());

        assert_eq!(cookies.read(&jar).as_deref(), Some("alice"));
        assert_eq!(cookies.read(&CookieJar::new()), None);
        assert_eq!(
            cookies.read(&jar_with(SITE_COOKIE, "alice".to_string())),
            None
        );
    }

    #[test]
    fn session_cookie_is_refused_after_its_lifetime() {
        let clock = clock();
        let cookies = session_cookies(false, &clock);
        let jar = jar_with(SITE_COOKIE, cookies.issue("alice", 1).value().to_string());

        clock.advance(TimeDelta::milliseconds(50));
        assert_eq!(cookies.read(&jar), None);
    }

    #[test]
    fn session_ceiling_is_enforced_on_read() {
        let clock = clock();
        let cookies = session_cookies(false, &clock);
        let thirty_days = 30 * 24 * 60 * 60 * 1000;
        let jar = jar_with(
            SITE_COOKIE,
            cookies.issue("alice", thirty_days).value().to_string(),
        );

        clock.advance(TimeDelta::days(7));
        assert_eq!(cookies.read(&jar).as_deref(), Some("alice"));

        clock.advance(TimeDelta::milliseconds(1));
        assert_eq!(cookies.read(&jar), None);
    }

    #[test]
    fn admin_cookie_is_capped_at_two_hours() {
        let clock = clock();
        let admin = admin_session("hunter22", &clock);
        let cookie = admin.issue();
        let jar = jar_with(ADMIN_COOKIE, cookie.value().to_string());

        assert_eq!(cookie.name(), ADMIN_COOKIE);
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(2)));
        assert!(admin.read(&jar));

        clock.advance(TimeDelta::hours(2) + TimeDelta::milliseconds(1));
        assert!(!admin.read(&jar));
    }

    #[test]
    fn admin_cookie_rejects_other_values() {
        let clock = clock();
        let signer = CookieSigner::from_secret("s");
        let admin = AdminSession::new(signer.clone(), true, "hunter22", clock.clone());
        let later = clock.now() + TimeDelta::hours(1);

        assert!(!admin.read(&jar_with(ADMIN_COOKIE, ADMIN_MARKER.to_string())));
        assert!(!admin.read(&jar_with(ADMIN_COOKIE, signer.sign(ADMIN_COOKIE, ADMIN_MARKER))));
        assert!(!admin.read(&jar_with(
            ADMIN_COOKIE,
            signer.sign_until(ADMIN_COOKIE, "alice", later)
        )));
        assert!(!admin.read(&CookieJar::new()));
    }

    #[test]
    fn admin_password_check() {
        let clock = clock();
        let admin = admin_session("hunter22", &clock);
        assert!(admin.is_enabled());
        assert!(admin.check_password("hunter22"));
        assert!(!admin.check_password("hunter2"));
        assert!(!admin.check_password(""));

        let disabled = admin_session("", &clock);
        assert!(!disabled.is_enabled());
        assert!(!disabled.check_password(""));
    }
}
