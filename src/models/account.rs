use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// One authorized user as persisted in the account document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub id: String,

    /// Always stored lower-cased.
    pub username: String,

    /// Argon2id PHC string. Never leaves the service layer.
    pub credential_hash: String,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    pub created_by: String,

    /// `false` means soft-deleted.
    pub active: bool,
}

impl AccountRecord {
    #[must_use]
    pub fn matches(&self, normalized_username: &str) -> bool {
        normalize_username(&self.username) == normalized_username
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Account projection returned to callers, without the credential hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_by: String,
    pub active: bool,
}

impl From<&AccountRecord> for AccountSummary {
    fn from(record: &AccountRecord) -> Self {
        Self {
            id: record.id.clone(),
            username: record.username.clone(),
            created_at: record.created_at,
            expires_at: record.expires_at,
            created_by: record.created_by.clone(),
            active: record.active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Inactive,
    Expired,
    ExpiringSoon,
    Active,
}

impl AccountStatus {
    /// First match wins: inactive flag, then expiry, then the expiring-soon window.
    #[must_use]
    pub fn derive(record: &AccountRecord, now: DateTime<Utc>, expiring_soon: TimeDelta) -> Self {
        if !record.active {
            Self::Inactive
        } else if record.is_expired_at(now) {
            Self::Expired
        } else if record.expires_at - now <= expiring_soon {
            Self::ExpiringSoon
        } else {
            Self::Active
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Expired => "expired",
            Self::ExpiringSoon => "expiring_soon",
            Self::Active => "active",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountView {
    #[serde(flatten)]
    pub account: AccountSummary,
    pub status: AccountStatus,
    pub days_until_expiry: i64,
}

impl AccountView {
    #[must_use]
    pub fn new(record: &AccountRecord, now: DateTime<Utc>, expiring_soon: TimeDelta) -> Self {
        Self {
            account: AccountSummary::from(record),
            status: AccountStatus::derive(record, now, expiring_soon),
            days_until_expiry: days_until_expiry(record.expires_at, now),
        }
    }
}

/// Result of a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedSession {
    pub username: String,
    pub expires_at: DateTime<Utc>,
    /// `expires_at - now`; bounds the session cookie lifetime.
    pub remaining_ms: i64,
}

#[must_use]
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Ceiling of the fractional day count; negative once expired.
#[must_use]
pub fn days_until_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let remaining_ms = (expires_at - now).num_milliseconds();
    let days = remaining_ms.div_euclid(MS_PER_DAY);
    if remaining_ms.rem_euclid(MS_PER_DAY) == 0 {
        days
    } else {
        days + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(active: bool, expires_at: DateTime<Utc>) -> AccountRecord {
        let created_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        AccountRecord {
            id: "1".to_string(),
            username: "alice".to_string(),
            credential_hash: "hash".to_string(),
            created_at,
            expires_at,
            created_by: "admin".to_string(),
            active,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(normalize_username("  Alice "), "alice");
        assert_eq!(normalize_username("BOB"), "bob");
    }

    #[test]
    fn status_inactive_wins_over_expired() {
        let r = record(false, now() - TimeDelta::days(3));
        assert_eq!(
            AccountStatus::derive(&r, now(), TimeDelta::days(2)),
            AccountStatus::Inactive
        );
    }

    #[test]
    fn status_expired_when_past_expiry() {
        let r = record(true, now() - TimeDelta::seconds(1));
        assert_eq!(
            AccountStatus::derive(&r, now(), TimeDelta::days(2)),
            AccountStatus::Expired
        );
    }

    #[test]
    fn status_at_exact_expiry_is_not_expired() {
        let r = record(true, now());
        assert_eq!(
            AccountStatus::derive(&r, now(), TimeDelta::days(2)),
            AccountStatus::ExpiringSoon
        );
    }

    #[test]
    fn status_expiring_soon_includes_two_day_boundary() {
        let r = record(true, now() + TimeDelta::days(2));
        assert_eq!(
            AccountStatus::derive(&r, now(), TimeDelta::days(2)),
            AccountStatus::ExpiringSoon
        );

        let r = record(true, now() + TimeDelta::days(2) + TimeDelta::seconds(1));
        assert_eq!(
            AccountStatus::derive(&r, now(), TimeDelta::days(2)),
            AccountStatus::Active
        );
    }

    #[test]
    fn days_until_expiry_rounds_up() {
        assert_eq!(days_until_expiry(now() + TimeDelta::days(7), now()), 7);
        assert_eq!(days_until_expiry(now() + TimeDelta::hours(25), now()), 2);
        assert_eq!(days_until_expiry(now() + TimeDelta::minutes(1), now()), 1);
        assert_eq!(days_until_expiry(now(), now()), 0);
    }

    #[test]
    fn days_until_expiry_negative_when_expired() {
        assert_eq!(days_until_expiry(now() - TimeDelta::hours(36), now()), -1);
        assert_eq!(days_until_expiry(now() - TimeDelta::hours(12), now()), 0);
        assert_eq!(days_until_expiry(now() - TimeDelta::days(3), now()), -3);
    }

    #[test]
    fn record_serializes_camel_case() {
        let r = record(true, now());
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("credentialHash").is_some());
        assert!(json.get("expiresAt").is_some());
        assert!(json.get("createdBy").is_some());
    }

    #[test]
    fn view_omits_credential_hash() {
        let view = AccountView::new(&record(true, now() + TimeDelta::days(5)), now(), TimeDelta::days(2));
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("credential_hash").is_none());
        assert!(json.get("credentialHash").is_none());
        assert_eq!(json["status"], "active");
        assert_eq!(json["days_until_expiry"], 5);
        assert_eq!(json["username"], "alice");
    }
}
