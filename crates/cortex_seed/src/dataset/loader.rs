//! Reading `data.json` and inlining lesson bodies.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::errors::LoadError;
use super::types::{Account, CourseSpec, Dataset, LessonSpec, ModuleSpec, RoadmapSpec};
use crate::resource::ResourceKind;

/// Name of the directory holding lesson bodies, next to the dataset file.
pub const DEFAULT_CONTENT_DIR: &str = "lesson_content";

/// Where to read a dataset from.
#[derive(Debug, Clone)]
pub struct DatasetSource {
    /// Path to the JSON document.
    pub path: PathBuf,
    /// Directory that `content_file` references resolve against.
    /// Defaults to `lesson_content/` next to the dataset file.
    pub content_dir: Option<PathBuf>,
}

impl DatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content_dir: None,
        }
    }

    #[must_use]
    pub fn with_content_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.content_dir = Some(dir.into());
        self
    }

    /// The effective lesson content directory.
    #[must_use]
    pub fn content_dir(&self) -> PathBuf {
        self.content_dir.clone().unwrap_or_else(|| {
            self.path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(DEFAULT_CONTENT_DIR)
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    admin: Account,
    #[serde(default)]
    users: Vec<Account>,
    #[serde(default)]
    courses: Vec<CourseSpec>,
    #[serde(default)]
    modules: Vec<ModuleSpec>,
    #[serde(default)]
    lessons: Vec<RawLesson>,
    #[serde(default)]
    roadmaps: Vec<RoadmapSpec>,
}

#[derive(Debug, Deserialize)]
struct RawLesson {
    name: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    content_file: Option<String>,
    credits: u32,
    module: String,
    #[serde(default)]
    is_published: bool,
    #[serde(default)]
    display_order: Option<u32>,
    #[serde(default)]
    image_type: Option<String>,
}

/// Load, inline and validate a dataset.
pub fn load(source: &DatasetSource) -> Result<Dataset, LoadError> {
    let text = fs::read_to_string(&source.path).map_err(|e| LoadError::Io {
        path: source.path.clone(),
        source: e,
    })?;
    let dataset = parse(&text, &source.path, &source.content_dir())?;
    tracing::info!(
        path = %source.path.display(),
        users = dataset.users.len(),
        courses = dataset.courses.len(),
        modules = dataset.modules.len(),
        lessons = dataset.lessons.len(),
        roadmaps = dataset.roadmaps.len(),
        "Dataset loaded"
    );
    Ok(dataset)
}

/// Parse a dataset document. `path` is only used in error messages.
pub fn parse(text: &str, path: &Path, content_dir: &Path) -> Result<Dataset, LoadError> {
    let raw: RawDataset = serde_json::from_str(text).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let lessons = raw
        .lessons
        .into_iter()
        .map(|lesson| inline_lesson(lesson, content_dir))
        .collect::<Result<Vec<_>, _>>()?;

    let dataset = Dataset {
        admin: raw.admin,
        users: raw.users,
        courses: raw.courses,
        modules: raw.modules,
        lessons,
        roadmaps: raw.roadmaps,
    };
    validate(&dataset)?;
    Ok(dataset)
}

fn inline_lesson(raw: RawLesson, content_dir: &Path) -> Result<LessonSpec, LoadError> {
    let content = match (raw.content, raw.content_file) {
        (Some(content), _) => content,
        (None, Some(file)) => read_lesson_content(content_dir, &file),
        (None, None) => {
            return Err(LoadError::invalid(
                ResourceKind::Lesson,
                raw.name,
                "needs either `content` or `content_file`",
            ));
        }
    };

    Ok(LessonSpec {
        name: raw.name,
        content,
        credits: raw.credits,
        module: raw.module,
        is_published: raw.is_published,
        display_order: raw.display_order,
        image_type: raw.image_type,
    })
}

/// Read a lesson body, degrading to a placeholder document on failure.
fn read_lesson_content(content_dir: &Path, file: &str) -> String {
    let path = content_dir.join(file);
    if !path.exists() {
        tracing::error!(path = %path.display(), "Lesson content file not found");
        return format!("# Content Not Found\nThe content for {file} could not be loaded.");
    }

    match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Error loading lesson content");
            format!("# Error Loading Content\nThere was an error loading the content for {file}")
        }
    }
}

fn validate(dataset: &Dataset) -> Result<(), LoadError> {
    if dataset.admin.username.trim().is_empty() {
        return Err(LoadError::invalid(
            ResourceKind::User,
            "admin",
            "admin username is empty",
        ));
    }

    for kind in ResourceKind::ALL {
        let mut seen = HashSet::new();
        for spec in dataset.specs(kind) {
            let key = spec.natural_key();
            if key.trim().is_empty() {
                return Err(LoadError::invalid(kind, key, "natural key is empty"));
            }
            if let Some(parent) = spec.parent_key()
                && parent.trim().is_empty()
            {
                return Err(LoadError::invalid(kind, key, "parent reference is empty"));
            }
            if !seen.insert(key.to_string()) {
                return Err(LoadError::Duplicate {
                    kind,
                    key: key.to_string(),
                });
            }
        }
    }

    Ok(())
}
