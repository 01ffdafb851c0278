//! Accounts: resolving the identity-provider principal to a user, onboarding,
//! and profile maintenance.

use std::sync::Arc;

use crate::domain::{NewProfile, Principal, ProfilePatch, User, UserProfile};
use crate::error::DomainError;
use crate::ports::{Clock, ProfileRepository, UserRepository};
use crate::services::QuotaLedger;

/// A user together with their profile, credits already reset for the month.
#[derive(Debug, Clone)]
pub struct Account {
    pub user: User,
    pub profile: Option<UserProfile>,
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    quota: Arc<QuotaLedger>,
    clock: Arc<dyn Clock>,
}

fn is_valid_email(email: &str) -> bool {
    match email.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        profiles: Arc<dyn ProfileRepository>,
        quota: Arc<QuotaLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            profiles,
            quota,
            clock,
        }
    }

    /// Map an authenticated principal to a stored user.
    pub async fn resolve(&self, principal: &Principal) -> Result<User, DomainError> {
        self.users
            .find_by_email(&principal.email)
            .await?
            .ok_or_else(|| DomainError::not_found("user", &principal.email))
    }

    /// Create the profile, and the user on first contact.
    pub async fn onboard(
        &self,
        principal: &Principal,
        input: NewProfile,
    ) -> Result<Account, DomainError> {
        if !is_valid_email(&principal.email) {
            return Err(DomainError::Validation(
                "please enter a valid email address".to_string(),
            ));
        }

        let user = match self.users.find_by_email(&principal.email).await? {
            Some(user) => {
                if self.profiles.find_by_user_id(user.id).await?.is_some() {
                    return Err(DomainError::Conflict(
                        "profile already exists; use the update profile page to make changes"
                            .to_string(),
                    ));
                }
                user
            }
            None => {
                let user = User::new(
                    principal.email.clone(),
                    principal.username.clone(),
                    self.quota.allowance(),
                    self.clock.now(),
                );
                self.users.save(user).await?
            }
        };

        let profile = UserProfile::create(user.id, user.email.clone(), input)?;
        let profile = self.profiles.save(profile).await?;

        tracing::info!(user_id = %user.id, "User onboarded");
        Ok(Account {
            user,
            profile: Some(profile),
        })
    }

    pub async fn account(&self, principal: &Principal) -> Result<Account, DomainError> {
        let user = self.resolve(principal).await?;
        let user = self.quota.refresh(user.id).await?;
        let profile = self.profiles.find_by_user_id(user.id).await?;
        Ok(Account { user, profile })
    }

    pub async fn update_profile(
        &self,
        principal: &Principal,
        patch: ProfilePatch,
    ) -> Result<UserProfile, DomainError> {
        let user = self.resolve(principal).await?;
        let mut profile = self
            .profiles
            .find_by_user_id(user.id)
            .await?
            .ok_or_else(|| DomainError::not_found("profile", user.id))?;

        profile.apply(patch)?;
        let profile = self.profiles.save(profile).await?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tone;
    use crate::services::fakes::{FakeProfiles, FakeUsers, FixedClock, at};

    fn service() -> AccountService {
        let users = Arc::new(FakeUsers::default());
        let clock = Arc::new(FixedClock::new(at(2025, 6, 10)));
        let quota = Arc::new(QuotaLedger::new(users.clone(), clock.clone(), 5));
        AccountService::new(users, Arc::new(FakeProfiles::default()), quota, clock)
    }

    fn principal() -> Principal {
        Principal {
            email: "ada@example.com".into(),
            username: "ada".into(),
        }
    }

    fn profile() -> NewProfile {
        NewProfile {
            full_name: "Ada".into(),
            profession_title: "Engineer".into(),
            linkedin_url: "https://www.linkedin.com/in/ada".into(),
            bio: "bio".into(),
            tone: Some(Tone::Educational),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_onboard_creates_user_with_allowance() {
        let service = service();

        let account = service.onboard(&principal(), profile()).await.unwrap();

        assert_eq!(account.user.credits, 5);
        assert_eq!(account.profile.unwrap().tone, Tone::Educational);
        assert_eq!(service.resolve(&principal()).await.unwrap().id, account.user.id);
    }

    #[tokio::test]
    async fn test_onboard_twice_conflicts() {
        let service = service();
        service.onboard(&principal(), profile()).await.unwrap();

        let result = service.onboard(&principal(), profile()).await;

        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_onboard_rejects_bad_email() {
        let service = service();
        let bad = Principal {
            email: "not-an-email".into(),
            username: "x".into(),
        };

        assert!(matches!(
            service.onboard(&bad, profile()).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_principal_is_not_found() {
        let service = service();
        assert!(matches!(
            service.account(&principal()).await,
            Err(DomainError::NotFound { entity_type: "user", .. })
        ));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let service = service();
        service.onboard(&principal(), profile()).await.unwrap();

        let updated = service
            .update_profile(
                &principal(),
                ProfilePatch {
                    profession_title: Some("Mathematician".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.profession_title, "Mathematician");
        assert_eq!(updated.linkedin_url, "https://www.linkedin.com/in/ada");
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
    }
}
