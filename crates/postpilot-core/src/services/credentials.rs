//! LinkedIn credential store: connect through the OAuth code exchange, or disconnect.
//!
//! Each authorization round trip carries a single-use `state` bound to the
//! user who started it. A callback whose state was not issued to that user,
//! or was issued more than [`STATE_TTL_MINUTES`] ago, is refused.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use crate::domain::LinkedInCredential;
use crate::error::DomainError;
use crate::ports::{Clock, OAuthClient, UserRepository};

/// How long an issued OAuth state stays redeemable.
pub const STATE_TTL_MINUTES: i64 = 10;

struct PendingState {
    state: String,
    issued_at: DateTime<Utc>,
}

/// Authorization URL together with the state it embeds.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

pub struct CredentialService {
    users: Arc<dyn UserRepository>,
    oauth: Arc<dyn OAuthClient>,
    clock: Arc<dyn Clock>,
    pending: Mutex<HashMap<Uuid, PendingState>>,
}

impl CredentialService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        oauth: Arc<dyn OAuthClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            oauth,
            clock,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a fresh state for `user_id`, replacing any earlier one.
    pub fn begin_authorization(&self, user_id: Uuid) -> AuthorizationRequest {
        let state = Uuid::new_v4().simple().to_string();
        let url = self.oauth.authorization_url(&state);
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                user_id,
                PendingState {
                    state: state.clone(),
                    issued_at: self.clock.now(),
                },
            );
        AuthorizationRequest { url, state }
    }

    /// Consume the pending state for `user_id`; it matches at most once.
    fn redeem_state(&self, user_id: Uuid, state: Option<&str>) -> Result<(), DomainError> {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&user_id);
        let ttl = TimeDelta::minutes(STATE_TTL_MINUTES);

        match (pending, state) {
            (Some(p), Some(s)) if p.state == s && self.clock.now() <= p.issued_at + ttl => Ok(()),
            _ => {
                tracing::warn!(%user_id, "LinkedIn callback state rejected");
                Err(DomainError::NotAuthorized(
                    "LinkedIn authorization state is missing, unknown or expired".to_string(),
                ))
            }
        }
    }

    /// Exchange an authorization code and store the resulting tokens verbatim.
    pub async fn connect(
        &self,
        user_id: Uuid,
        code: &str,
        state: Option<&str>,
    ) -> Result<LinkedInCredential, DomainError> {
        if code.trim().is_empty() {
            return Err(DomainError::Validation("missing authorization code".to_string()));
        }
        self.redeem_state(user_id, state)?;

        let grant = self.oauth.exchange_code(code).await.map_err(|e| {
            tracing::warn!(%user_id, error = %e, "LinkedIn code exchange failed");
            DomainError::NotAuthorized(format!("LinkedIn code exchange failed: {e}"))
        })?;

        if grant.access_token.is_empty() || grant.id_token.is_empty() {
            return Err(DomainError::NotAuthorized(
                "LinkedIn did not return both an access token and an identity token".to_string(),
            ));
        }

        let expires_in = grant.expires_in;
        let credential = LinkedInCredential::from_exchange(
            grant.access_token,
            grant.id_token,
            expires_in,
            self.clock.now(),
        )
        .ok_or_else(|| {
            tracing::warn!(%user_id, expires_in, "LinkedIn returned an unusable token lifetime");
            DomainError::NotAuthorized(format!(
                "LinkedIn returned an invalid token lifetime: {expires_in}"
            ))
        })?;
        self.users
            .set_linkedin_credential(user_id, Some(credential.clone()))
            .await?;

        tracing::info!(%user_id, expires_at = %credential.expires_at, "LinkedIn tokens saved");
        Ok(credential)
    }

    pub async fn disconnect(&self, user_id: Uuid) -> Result<(), DomainError> {
        self.users.set_linkedin_credential(user_id, None).await?;
        tracing::info!(%user_id, "LinkedIn credential removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::ports::TokenGrant;
    use crate::services::fakes::{FakeOAuth, FakeUsers, FixedClock, at};

    struct Harness {
        service: CredentialService,
        users: Arc<FakeUsers>,
        clock: Arc<FixedClock>,
        id: Uuid,
    }

    fn harness(grant: Option<TokenGrant>) -> Harness {
        let user = User::new("ada@example.com".into(), "ada".into(), 5, at(2025, 6, 1));
        let id = user.id;
        let users = Arc::new(FakeUsers::with(user));
        let clock = Arc::new(FixedClock::new(at(2025, 6, 10)));
        let service = CredentialService::new(
            users.clone(),
            Arc::new(FakeOAuth { grant }),
            clock.clone(),
        );
        Harness {
            service,
            users,
            clock,
            id,
        }
    }

    fn grant(expires_in: i64) -> Option<TokenGrant> {
        Some(TokenGrant {
            access_token: "access".into(),
            id_token: "id".into(),
            expires_in,
        })
    }

    #[tokio::test]
    async fn test_connect_stores_expiry_from_expires_in() {
        let h = harness(grant(5_184_000));
        let auth = h.service.begin_authorization(h.id);

        h.service
            .connect(h.id, "code-1", Some(&auth.state))
            .await
            .unwrap();

        let stored = h.users.get(h.id).linkedin.unwrap();
        assert_eq!(stored.access_token, "access");
        assert_eq!(stored.expires_at, at(2025, 6, 10) + chrono::Duration::days(60));
    }

    #[tokio::test]
    async fn test_authorization_url_embeds_issued_state() {
        let h = harness(None);

        let auth = h.service.begin_authorization(h.id);

        assert!(auth.url.contains(&auth.state));
    }

    #[tokio::test]
    async fn test_failed_exchange_leaves_user_untouched() {
        let h = harness(None);
        let auth = h.service.begin_authorization(h.id);

        let result = h.service.connect(h.id, "code-1", Some(&auth.state)).await;

        assert!(matches!(result, Err(DomainError::NotAuthorized(_))));
        assert!(h.users.get(h.id).linkedin.is_none());
    }

    #[tokio::test]
    async fn test_mismatched_or_missing_state_is_refused() {
        let h = harness(grant(3600));
        h.service.begin_authorization(h.id);

        let wrong = h.service.connect(h.id, "code-1", Some("forged")).await;
        assert!(matches!(wrong, Err(DomainError::NotAuthorized(_))));

        h.service.begin_authorization(h.id);
        let missing = h.service.connect(h.id, "code-1", None).await;
        assert!(matches!(missing, Err(DomainError::NotAuthorized(_))));

        assert!(h.users.get(h.id).linkedin.is_none());
    }

    #[tokio::test]
    async fn test_state_is_single_use_and_per_user() {
        let h = harness(grant(3600));
        let auth = h.service.begin_authorization(h.id);

        let stranger = h.service.connect(Uuid::new_v4(), "code-1", Some(&auth.state)).await;
        assert!(matches!(stranger, Err(DomainError::NotAuthorized(_))));

        h.service
            .connect(h.id, "code-1", Some(&auth.state))
            .await
            .unwrap();
        let replay = h.service.connect(h.id, "code-2", Some(&auth.state)).await;
        assert!(matches!(replay, Err(DomainError::NotAuthorized(_))));
    }

    #[tokio::test]
    async fn test_expired_state_is_refused() {
        let h = harness(grant(3600));
        let auth = h.service.begin_authorization(h.id);
        h.clock.set(at(2025, 6, 10) + TimeDelta::minutes(STATE_TTL_MINUTES + 1));

        let result = h.service.connect(h.id, "code-1", Some(&auth.state)).await;

        assert!(matches!(result, Err(DomainError::NotAuthorized(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_lifetime_is_not_authorized() {
        let h = harness(grant(i64::MAX));
        let auth = h.service.begin_authorization(h.id);

        let result = h.service.connect(h.id, "code-1", Some(&auth.state)).await;

        assert!(matches!(result, Err(DomainError::NotAuthorized(_))));
        assert!(h.users.get(h.id).linkedin.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_clears_credential() {
        let h = harness(grant(60));
        let auth = h.service.begin_authorization(h.id);
        h.service
            .connect(h.id, "code", Some(&auth.state))
            .await
            .unwrap();

        h.service.disconnect(h.id).await.unwrap();

        assert!(h.users.get(h.id).linkedin.is_none());
    }

    #[tokio::test]
    async fn test_blank_code_is_rejected() {
        let h = harness(None);
        assert!(matches!(
            h.service.connect(h.id, " ", None).await,
            Err(DomainError::Validation(_))
        ));
    }
}
