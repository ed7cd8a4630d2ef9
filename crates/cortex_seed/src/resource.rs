//! Resource kinds and the server-side view of a resource.
//!
//! Every collection the seeder manages is identified by a [`ResourceKind`].
//! The kind knows its natural key field, its parent kind (if any) and whether
//! the server accepts image uploads for it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kinds of resources seeded into a Cortex instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    User,
    Course,
    Module,
    Lesson,
    Roadmap,
}

impl ResourceKind {
    /// All kinds in reconciliation order.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::User,
        ResourceKind::Course,
        ResourceKind::Module,
        ResourceKind::Lesson,
        ResourceKind::Roadmap,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Course => "course",
            ResourceKind::Module => "module",
            ResourceKind::Lesson => "lesson",
            ResourceKind::Roadmap => "roadmap",
        }
    }

    /// Field that holds the natural key in server responses and payloads.
    #[must_use]
    pub fn natural_key_field(self) -> &'static str {
        match self {
            ResourceKind::User => "username",
            ResourceKind::Course | ResourceKind::Module | ResourceKind::Lesson => "name",
            ResourceKind::Roadmap => "title",
        }
    }

    /// The kind this kind hangs off, for depth-1 kinds.
    #[must_use]
    pub fn parent(self) -> Option<ResourceKind> {
        match self {
            ResourceKind::Module => Some(ResourceKind::Course),
            ResourceKind::Lesson => Some(ResourceKind::Module),
            _ => None,
        }
    }

    /// Payload field carrying the parent's server id.
    #[must_use]
    pub fn parent_id_field(self) -> Option<&'static str> {
        match self {
            ResourceKind::Module => Some("course_id"),
            ResourceKind::Lesson => Some("module_id"),
            _ => None,
        }
    }

    /// Whether images can be attached to resources of this kind.
    #[must_use]
    pub fn accepts_assets(self) -> bool {
        !matches!(self, ResourceKind::User)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-assigned identifier of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub i64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resource as the server reports it.
///
/// `natural_key` is optional because listings are not trusted: entries
/// without the key field are kept here and filtered out by the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteResource {
    pub kind: ResourceKind,
    pub id: ResourceId,
    pub natural_key: Option<String>,
}

impl RemoteResource {
    pub fn new(kind: ResourceKind, id: i64, natural_key: impl Into<String>) -> Self {
        Self {
            kind,
            id: ResourceId(id),
            natural_key: Some(natural_key.into()),
        }
    }

    /// Build from a JSON object returned by the server.
    ///
    /// Returns `None` when the object has no numeric `id`.
    #[must_use]
    pub fn from_json(kind: ResourceKind, value: &serde_json::Value) -> Option<Self> {
        let id = value.get("id").and_then(serde_json::Value::as_i64)?;
        let natural_key = value
            .get(kind.natural_key_field())
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        Some(Self {
            kind,
            id: ResourceId(id),
            natural_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_key_fields_per_kind() {
        assert_eq!(ResourceKind::User.natural_key_field(), "username");
        assert_eq!(ResourceKind::Course.natural_key_field(), "name");
        assert_eq!(ResourceKind::Lesson.natural_key_field(), "name");
        assert_eq!(ResourceKind::Roadmap.natural_key_field(), "title");
    }

    #[test]
    fn parent_links_use_snake_case_fields() {
        assert_eq!(ResourceKind::Module.parent(), Some(ResourceKind::Course));
        assert_eq!(ResourceKind::Module.parent_id_field(), Some("course_id"));
        assert_eq!(ResourceKind::Lesson.parent(), Some(ResourceKind::Module));
        assert_eq!(ResourceKind::Lesson.parent_id_field(), Some("module_id"));
        assert!(ResourceKind::Course.parent().is_none());
        assert!(ResourceKind::Roadmap.parent_id_field().is_none());
    }

    #[test]
    fn users_do_not_accept_assets() {
        assert!(!ResourceKind::User.accepts_assets());
        assert!(ResourceKind::Course.accepts_assets());
        assert!(ResourceKind::Roadmap.accepts_assets());
    }

    #[test]
    fn from_json_reads_id_and_key() {
        let value = serde_json::json!({"id": 3, "title": "Backend", "slug": "backend"});
        let resource = RemoteResource::from_json(ResourceKind::Roadmap, &value).unwrap();
        assert_eq!(resource.id, ResourceId(3));
        assert_eq!(resource.natural_key.as_deref(), Some("Backend"));
    }

    #[test]
    fn from_json_keeps_entries_without_key_but_drops_entries_without_id() {
        let keyless = serde_json::json!({"id": 9, "slug": "no-name"});
        let resource = RemoteResource::from_json(ResourceKind::Course, &keyless).unwrap();
        assert!(resource.natural_key.is_none());

        let idless = serde_json::json!({"name": "Algorithms"});
        assert!(RemoteResource::from_json(ResourceKind::Course, &idless).is_none());
    }

    #[test]
    fn kind_display_is_lowercase() {
        assert_eq!(ResourceKind::Module.to_string(), "module");
        assert_eq!(ResourceId(42).to_string(), "42");
    }
}
