use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// What the user asked for when the post was created. Fixed for the life of the post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSpec {
    pub topic: String,
    pub brief: String,
    pub link: Option<String>,
}

impl PromptSpec {
    pub fn new(topic: String, brief: String, link: Option<String>) -> Result<Self, DomainError> {
        if topic.trim().is_empty() {
            return Err(DomainError::Validation("topic is required".to_string()));
        }
        if brief.trim().is_empty() {
            return Err(DomainError::Validation("brief is required".to_string()));
        }
        Ok(Self {
            topic,
            brief,
            link: link.filter(|l| !l.trim().is_empty()),
        })
    }
}

/// Generated content of one version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionContent {
    pub text: String,
    pub image_url: Option<String>,
    pub image_id: Option<String>,
}

impl VersionContent {
    /// Build the next version's content: regenerated facets come from `generated`,
    /// the others are copied verbatim from `previous`.
    pub fn layer(previous: &VersionContent, generated: VersionContent, facet: EditFacet) -> Self {
        let (text, image_url, image_id) = match facet {
            EditFacet::Text => (
                generated.text,
                previous.image_url.clone(),
                previous.image_id.clone(),
            ),
            EditFacet::Image => (previous.text.clone(), generated.image_url, generated.image_id),
            EditFacet::Both => (generated.text, generated.image_url, generated.image_id),
        };
        Self {
            text,
            image_url,
            image_id,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// One immutable snapshot of a post's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// 1-based, contiguous.
    pub version: u32,
    pub content: VersionContent,
    pub created_at: DateTime<Utc>,
}

/// Which facet of the latest version an edit regenerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditFacet {
    Text,
    Image,
    Both,
}

impl EditFacet {
    pub fn regenerates_text(&self) -> bool {
        matches!(self, EditFacet::Text | EditFacet::Both)
    }

    pub fn regenerates_image(&self) -> bool {
        matches!(self, EditFacet::Image | EditFacet::Both)
    }
}

impl FromStr for EditFacet {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(EditFacet::Text),
            "image" => Ok(EditFacet::Image),
            "both" => Ok(EditFacet::Both),
            other => Err(DomainError::Validation(format!(
                "edit type must be one of text, image, both (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSpec {
    pub facet: EditFacet,
    pub instructions: String,
}

impl EditSpec {
    pub fn new(facet: EditFacet, instructions: String) -> Result<Self, DomainError> {
        if instructions.trim().is_empty() {
            return Err(DomainError::Validation(
                "edit instructions are required".to_string(),
            ));
        }
        Ok(Self {
            facet,
            instructions,
        })
    }
}

/// Post aggregate. Versions are append-only and there is always at least one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt: PromptSpec,
    versions: Vec<Version>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a post holding its first version.
    pub fn new(
        user_id: Uuid,
        prompt: PromptSpec,
        content: VersionContent,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            prompt,
            versions: vec![Version {
                version: 1,
                content,
                created_at: now,
            }],
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a post from storage, checking the version invariants.
    pub fn from_parts(
        id: Uuid,
        user_id: Uuid,
        prompt: PromptSpec,
        mut versions: Vec<Version>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        versions.sort_by_key(|v| v.version);
        if versions.is_empty() {
            return Err(DomainError::Internal(format!("post {id} has no versions")));
        }
        let contiguous = versions
            .iter()
            .enumerate()
            .all(|(i, v)| v.version as usize == i + 1);
        if !contiguous {
            return Err(DomainError::Internal(format!(
                "post {id} has non-contiguous version numbers"
            )));
        }
        Ok(Self {
            id,
            user_id,
            prompt,
            versions,
            created_at,
            updated_at,
        })
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn version_count(&self) -> u32 {
        self.versions.len() as u32
    }

    pub fn latest(&self) -> &Version {
        // Non-empty by construction.
        &self.versions[self.versions.len() - 1]
    }

    pub fn can_edit(&self, cap: u32) -> bool {
        self.version_count() < cap
    }

    /// Select a version by 1-based index; `None` picks the latest.
    pub fn select(&self, index: Option<u32>) -> Result<&Version, DomainError> {
        match index {
            None => Ok(self.latest()),
            Some(n) => n
                .checked_sub(1)
                .and_then(|i| self.versions.get(i as usize))
                .ok_or_else(|| {
                    DomainError::Validation(format!(
                        "version {n} does not exist (post has {} versions)",
                        self.version_count()
                    ))
                }),
        }
    }

    /// The version an edit would append, without mutating the post.
    pub fn next_version(&self, content: VersionContent, now: DateTime<Utc>) -> Version {
        Version {
            version: self.version_count() + 1,
            content,
            created_at: now,
        }
    }

    /// Append a version produced by [`Post::next_version`].
    pub fn push_version(&mut self, version: Version) -> Result<(), DomainError> {
        if version.version != self.version_count() + 1 {
            return Err(DomainError::Conflict(format!(
                "expected version {}, got {}",
                self.version_count() + 1,
                version.version
            )));
        }
        self.updated_at = version.created_at;
        self.versions.push(version);
        Ok(())
    }
}
