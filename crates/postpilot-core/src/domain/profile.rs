use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Voice the generation agent writes in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    Formal,
    #[default]
    Friendly,
    Inspirational,
    Educational,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Formal => "Formal",
            Tone::Friendly => "Friendly",
            Tone::Inspirational => "Inspirational",
            Tone::Educational => "Educational",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Formal" => Ok(Tone::Formal),
            "Friendly" => Ok(Tone::Friendly),
            "Inspirational" => Ok(Tone::Inspirational),
            "Educational" => Ok(Tone::Educational),
            other => Err(DomainError::Validation(format!("unknown tone '{other}'"))),
        }
    }
}

/// Profile built during onboarding. One per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub profession_title: String,
    pub linkedin_url: String,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub interests: Vec<String>,
    pub bio: String,
    pub tone: Tone,
}

/// Onboarding input.
#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub full_name: String,
    pub profession_title: String,
    pub linkedin_url: String,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub interests: Vec<String>,
    pub bio: String,
    pub tone: Option<Tone>,
}

/// Fields a user may change after onboarding. Email and LinkedIn URL are fixed.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub full_name: Option<String>,
    pub profession_title: Option<String>,
    pub bio: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub interests: Option<Vec<String>>,
    pub tone: Option<Tone>,
}

fn require(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    Ok(())
}

impl UserProfile {
    pub fn create(user_id: Uuid, email: String, input: NewProfile) -> Result<Self, DomainError> {
        require("full name", &input.full_name)?;
        require("profession title", &input.profession_title)?;
        require("LinkedIn URL", &input.linkedin_url)?;
        require("bio", &input.bio)?;

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            email,
            full_name: input.full_name,
            profession_title: input.profession_title,
            linkedin_url: input.linkedin_url,
            github_url: input.github_url,
            portfolio_url: input.portfolio_url,
            interests: input.interests,
            bio: input.bio,
            tone: input.tone.unwrap_or_default(),
        })
    }

    pub fn apply(&mut self, patch: ProfilePatch) -> Result<(), DomainError> {
        if let Some(full_name) = patch.full_name {
            require("full name", &full_name)?;
            self.full_name = full_name;
        }
        if let Some(title) = patch.profession_title {
            require("profession title", &title)?;
            self.profession_title = title;
        }
        if let Some(bio) = patch.bio {
            require("bio", &bio)?;
            self.bio = bio;
        }
        if let Some(github_url) = patch.github_url {
            self.github_url = Some(github_url).filter(|u| !u.is_empty());
        }
        if let Some(portfolio_url) = patch.portfolio_url {
            self.portfolio_url = Some(portfolio_url).filter(|u| !u.is_empty());
        }
        if let Some(interests) = patch.interests {
            self.interests = interests;
        }
        if let Some(tone) = patch.tone {
            self.tone = tone;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewProfile {
        NewProfile {
            full_name: "Ada Lovelace".into(),
            profession_title: "Engineer".into(),
            linkedin_url: "https://www.linkedin.com/in/ada".into(),
            bio: "Writes about engines".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_defaults_tone_to_friendly() {
        let profile = UserProfile::create(Uuid::new_v4(), "ada@example.com".into(), input()).unwrap();
        assert_eq!(profile.tone, Tone::Friendly);
    }

    #[test]
    fn test_create_requires_bio() {
        let mut bad = input();
        bad.bio = "  ".into();
        let result = UserProfile::create(Uuid::new_v4(), "ada@example.com".into(), bad);
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_patch_keeps_linkedin_url() {
        let mut profile =
            UserProfile::create(Uuid::new_v4(), "ada@example.com".into(), input()).unwrap();
        profile
            .apply(ProfilePatch {
                bio: Some("New bio".into()),
                tone: Some(Tone::Formal),
                github_url: Some(String::new()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(profile.bio, "New bio");
        assert_eq!(profile.tone, Tone::Formal);
        assert_eq!(profile.github_url, None);
        assert_eq!(profile.linkedin_url, "https://www.linkedin.com/in/ada");
    }

    #[test]
    fn test_tone_parse() {
        assert_eq!("Educational".parse::<Tone>().unwrap(), Tone::Educational);
        assert!("Sarcastic".parse::<Tone>().is_err());
    }
}
