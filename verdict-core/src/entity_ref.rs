//! Polymorphic entity references.
//!
//! Approvals and agent sessions point at arbitrary entities owned by the
//! injected entity store. The reference is weak: a kind discriminator plus
//! an ID and a display title, with no foreign-key ownership held here.

use crate::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity kind discriminator for polymorphic references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Issue,
    Milestone,
    Initiative,
    Note,
    Literature,
    Podcast,
    Resume,
    JobPosting,
}

impl EntityKind {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::Issue => "issue",
            EntityKind::Milestone => "milestone",
            EntityKind::Initiative => "initiative",
            EntityKind::Note => "note",
            EntityKind::Literature => "literature",
            EntityKind::Podcast => "podcast",
            EntityKind::Resume => "resume",
            EntityKind::JobPosting => "job_posting",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, EntityKindParseError> {
        match s.to_lowercase().as_str() {
            "project" => Ok(EntityKind::Project),
            "issue" => Ok(EntityKind::Issue),
            "milestone" => Ok(EntityKind::Milestone),
            "initiative" => Ok(EntityKind::Initiative),
            "note" => Ok(EntityKind::Note),
            "literature" => Ok(EntityKind::Literature),
            "podcast" => Ok(EntityKind::Podcast),
            "resume" => Ok(EntityKind::Resume),
            "job_posting" | "jobposting" | "job-posting" => Ok(EntityKind::JobPosting),
            _ => Err(EntityKindParseError(s.to_string())),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for EntityKind {
    type Err = EntityKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid entity kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityKindParseError(pub String);

impl fmt::Display for EntityKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid entity kind: {}", self.0)
    }
}

impl std::error::Error for EntityKindParseError {}

/// Weak reference to an entity by kind and ID.
///
/// The referenced entity's table is owned by the entity store, not by the
/// approval/session records; lookups go through the store's capability
/// interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EntityRef {
    pub kind: EntityKind,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    /// Display title cached at reference time; not authoritative.
    pub title: Option<String>,
}

impl EntityRef {
    /// Create a reference without a cached title.
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self {
            kind,
            id,
            title: None,
        }
    }

    /// Attach a cached display title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_entity_id;

    #[test]
    fn test_entity_kind_roundtrip() {
        for kind in [
            EntityKind::Project,
            EntityKind::Issue,
            EntityKind::Milestone,
            EntityKind::Initiative,
            EntityKind::Note,
            EntityKind::Literature,
            EntityKind::Podcast,
            EntityKind::Resume,
            EntityKind::JobPosting,
        ] {
            let parsed = EntityKind::from_db_str(kind.as_db_str()).unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn test_entity_kind_parse_aliases() {
        assert_eq!(
            EntityKind::from_db_str("JobPosting").unwrap(),
            EntityKind::JobPosting
        );
        assert!(EntityKind::from_db_str("spreadsheet").is_err());
    }

    #[test]
    fn test_entity_ref_display() {
        let id = new_entity_id();
        let entity = EntityRef::new(EntityKind::Issue, id).with_title("Fix login");
        assert_eq!(format!("{}", entity), format!("issue:{}", id));
        assert_eq!(entity.title.as_deref(), Some("Fix login"));
    }
}
