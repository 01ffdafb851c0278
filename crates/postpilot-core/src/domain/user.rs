use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Credits granted at the start of every calendar month.
pub const DEFAULT_MONTHLY_CREDITS: i32 = 5;

/// First instant of the calendar month (UTC) containing `now`.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "Free",
            SubscriptionTier::Premium => "Premium",
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Free" => Ok(SubscriptionTier::Free),
            "Premium" => Ok(SubscriptionTier::Premium),
            other => Err(format!("unknown subscription tier '{other}'")),
        }
    }
}

/// LinkedIn OAuth credential, stored verbatim from the token exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedInCredential {
    pub access_token: String,
    pub id_token: String,
    pub expires_at: DateTime<Utc>,
}

impl LinkedInCredential {
    /// Returns `None` when `expires_in_secs` puts the expiry out of range.
    pub fn from_exchange(
        access_token: String,
        id_token: String,
        expires_in_secs: i64,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let expires_at = chrono::TimeDelta::try_seconds(expires_in_secs)
            .and_then(|ttl| now.checked_add_signed(ttl))?;
        Some(Self {
            access_token,
            id_token,
            expires_at,
        })
    }

    /// A credential can be used when both tokens are present and it has not expired.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && !self.id_token.is_empty() && self.expires_at >= now
    }
}

/// User entity - the account that owns posts and a monthly credit balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub credits: i32,
    pub last_credit_reset: Option<DateTime<Utc>>,
    pub linkedin: Option<LinkedInCredential>,
    pub tier: SubscriptionTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user holding a full monthly allowance.
    pub fn new(email: String, username: String, credits: i32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            username,
            credits,
            last_credit_reset: Some(now),
            linkedin: None,
            tier: SubscriptionTier::Free,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when the last reset happened in an earlier calendar month than `now`.
    pub fn needs_credit_reset(&self, now: DateTime<Utc>) -> bool {
        match self.last_credit_reset {
            None => true,
            Some(last) => last.year() != now.year() || last.month() != now.month(),
        }
    }

    pub fn has_usable_credential(&self, now: DateTime<Utc>) -> bool {
        self.linkedin.as_ref().is_some_and(|c| c.is_usable(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_needs_reset_across_months_and_years() {
        let mut user = User::new("a@b.co".into(), "a".into(), 5, at(2025, 1, 31));

        assert!(!user.needs_credit_reset(at(2025, 1, 1)));
        assert!(user.needs_credit_reset(at(2025, 2, 1)));
        assert!(user.needs_credit_reset(at(2026, 1, 15)));

        user.last_credit_reset = None;
        assert!(user.needs_credit_reset(at(2025, 1, 31)));
    }

    #[test]
    fn test_month_start() {
        let start = month_start(at(2025, 7, 19));
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_credential_usability() {
        let now = at(2025, 3, 10);
        let credential =
            LinkedInCredential::from_exchange("tok".into(), "id".into(), 3600, now).unwrap();
        assert!(credential.is_usable(now));
        assert!(credential.is_usable(now + chrono::Duration::seconds(3600)));
        assert!(!credential.is_usable(now + chrono::Duration::seconds(3601)));

        let empty = LinkedInCredential {
            access_token: String::new(),
            ..credential
        };
        assert!(!empty.is_usable(now));
    }

    #[test]
    fn test_out_of_range_expiry_is_rejected() {
        let now = at(2025, 3, 10);
        assert!(LinkedInCredential::from_exchange("tok".into(), "id".into(), i64::MAX, now).is_none());
        assert!(LinkedInCredential::from_exchange("tok".into(), "id".into(), i64::MIN, now).is_none());
    }
}
