//! The declarative dataset a run seeds from.
//!
//! A dataset is a single JSON document holding the admin account, the users
//! to register and the course/module/lesson/roadmap definitions. Lessons may
//! reference their body through `content_file`; the loader inlines those so
//! the reconciliation engine never touches content files.

mod errors;
mod loader;
mod types;

pub use errors::LoadError;
pub use loader::{DEFAULT_CONTENT_DIR, DatasetSource, load, parse};
pub use types::{
    Account, CourseSpec, Dataset, LessonSpec, ModuleSpec, ResourceSpec, RoadmapSpec,
};
