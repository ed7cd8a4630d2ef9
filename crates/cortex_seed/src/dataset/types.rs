use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::resource::{ResourceId, ResourceKind};

/// A platform account, used both for the admin and for seeded users.
///
/// Serialized in the camelCase shape the registration endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CourseSpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub display_order: Option<u32>,
    /// Content-type hint for the course image (`"png"` or `"image/png"`).
    #[serde(default)]
    pub image_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModuleSpec {
    pub name: String,
    pub description: String,
    /// Natural key (name) of the owning course.
    pub course: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub display_order: Option<u32>,
    #[serde(default)]
    pub image_type: Option<String>,
}

/// A lesson with its body already inlined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonSpec {
    pub name: String,
    pub content: String,
    pub credits: u32,
    /// Natural key (name) of the owning module.
    pub module: String,
    pub is_published: bool,
    pub display_order: Option<u32>,
    pub image_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoadmapSpec {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub image_type: Option<String>,
}

/// A desired resource, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSpec {
    User(Account),
    Course(CourseSpec),
    Module(ModuleSpec),
    Lesson(LessonSpec),
    Roadmap(RoadmapSpec),
}

impl ResourceSpec {
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceSpec::User(_) => ResourceKind::User,
            ResourceSpec::Course(_) => ResourceKind::Course,
            ResourceSpec::Module(_) => ResourceKind::Module,
            ResourceSpec::Lesson(_) => ResourceKind::Lesson,
            ResourceSpec::Roadmap(_) => ResourceKind::Roadmap,
        }
    }

    /// The value used to decide whether the resource already exists.
    #[must_use]
    pub fn natural_key(&self) -> &str {
        match self {
            ResourceSpec::User(account) => &account.username,
            ResourceSpec::Course(course) => &course.name,
            ResourceSpec::Module(module) => &module.name,
            ResourceSpec::Lesson(lesson) => &lesson.name,
            ResourceSpec::Roadmap(roadmap) => &roadmap.title,
        }
    }

    /// Natural key of the parent resource, for depth-1 kinds.
    #[must_use]
    pub fn parent_key(&self) -> Option<&str> {
        match self {
            ResourceSpec::Module(module) => Some(&module.course),
            ResourceSpec::Lesson(lesson) => Some(&lesson.module),
            _ => None,
        }
    }

    /// Declared image content-type hint, if any.
    #[must_use]
    pub fn image_hint(&self) -> Option<&str> {
        match self {
            ResourceSpec::User(_) => None,
            ResourceSpec::Course(course) => course.image_type.as_deref(),
            ResourceSpec::Module(module) => module.image_type.as_deref(),
            ResourceSpec::Lesson(lesson) => lesson.image_type.as_deref(),
            ResourceSpec::Roadmap(roadmap) => roadmap.image_type.as_deref(),
        }
    }

    /// Build the create payload, injecting the parent id for depth-1 kinds.
    ///
    /// The dataset copy is never touched; each call returns a fresh document.
    #[must_use]
    pub fn payload(&self, parent_id: Option<ResourceId>) -> Value {
        let mut payload = match self {
            ResourceSpec::User(account) => json!({
                "firstname": account.firstname,
                "lastname": account.lastname,
                "username": account.username,
                "email": account.email,
                "password": account.password,
                "dateOfBirth": account.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
                "countryCode": account.country_code,
                "gender": account.gender,
            }),
            ResourceSpec::Course(course) => json!({
                "name": course.name,
                "description": course.description,
                "is_published": course.is_published,
                "display_order": course.display_order,
            }),
            ResourceSpec::Module(module) => json!({
                "name": module.name,
                "description": module.description,
                "is_published": module.is_published,
                "display_order": module.display_order,
            }),
            ResourceSpec::Lesson(lesson) => json!({
                "name": lesson.name,
                "content": lesson.content,
                "credits": lesson.credits,
                "is_published": lesson.is_published,
                "display_order": lesson.display_order,
            }),
            ResourceSpec::Roadmap(roadmap) => json!({
                "title": roadmap.title,
                "description": roadmap.description,
                "is_published": roadmap.is_published,
            }),
        };

        if let Value::Object(ref mut map) = payload {
            map.retain(|_, v| !v.is_null());
            if let (Some(field), Some(id)) = (self.kind().parent_id_field(), parent_id) {
                map.insert(field.to_string(), json!(id.0));
            }
        }

        payload
    }
}

/// Immutable snapshot of everything a run should make exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub admin: Account,
    pub users: Vec<Account>,
    pub courses: Vec<CourseSpec>,
    pub modules: Vec<ModuleSpec>,
    pub lessons: Vec<LessonSpec>,
    pub roadmaps: Vec<RoadmapSpec>,
}

impl Dataset {
    /// The specs of one kind, in dataset order.
    #[must_use]
    pub fn specs(&self, kind: ResourceKind) -> Vec<ResourceSpec> {
        match kind {
            ResourceKind::User => self.users.iter().cloned().map(ResourceSpec::User).collect(),
            ResourceKind::Course => self
                .courses
                .iter()
                .cloned()
                .map(ResourceSpec::Course)
                .collect(),
            ResourceKind::Module => self
                .modules
                .iter()
                .cloned()
                .map(ResourceSpec::Module)
                .collect(),
            ResourceKind::Lesson => self
                .lessons
                .iter()
                .cloned()
                .map(ResourceSpec::Lesson)
                .collect(),
            ResourceKind::Roadmap => self
                .roadmaps
                .iter()
                .cloned()
                .map(ResourceSpec::Roadmap)
                .collect(),
        }
    }

    /// Number of specs of one kind.
    #[must_use]
    pub fn count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::User => self.users.len(),
            ResourceKind::Course => self.courses.len(),
            ResourceKind::Module => self.modules.len(),
            ResourceKind::Lesson => self.lessons.len(),
            ResourceKind::Roadmap => self.roadmaps.len(),
        }
    }
}
