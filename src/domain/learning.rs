use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::ResourceId;

const COURSE_LEVELS: [&str; 3] = ["beginner", "intermediate", "advanced"];
const LESSON_TYPES: [&str; 3] = ["text", "video", "quiz"];

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Course {
    pub id: ResourceId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub duration_hours: Option<u32>,
    #[serde(default)]
    pub author_id: Option<ResourceId>,
    #[serde(default)]
    pub enrollment_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub modules: Option<Vec<Module>>,
}

fn default_level() -> String {
    "beginner".to_string()
}

impl Course {
    /// Embedded modules sorted by their `order` field.
    pub fn ordered_modules(&self) -> Vec<&Module> {
        let mut modules: Vec<&Module> = self.modules.iter().flatten().collect();
        modules.sort_by_key(|m| m.order);
        modules
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Module {
    pub id: ResourceId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub course_id: Option<ResourceId>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub lessons: Option<Vec<Lesson>>,
}

impl Module {
    pub fn ordered_lessons(&self) -> Vec<&Lesson> {
        let mut lessons: Vec<&Lesson> = self.lessons.iter().flatten().collect();
        lessons.sort_by_key(|l| l.order);
        lessons
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Lesson {
    pub id: ResourceId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub module_id: Option<ResourceId>,
    #[serde(default = "default_lesson_type")]
    pub lesson_type: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

fn default_lesson_type() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Attachment {
    #[serde(default)]
    pub id: Option<ResourceId>,
    pub title: String,
    pub file_url: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Enrollment {
    #[serde(default)]
    pub id: Option<ResourceId>,
    pub user_id: ResourceId,
    pub course_id: ResourceId,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub progress_percentage: f64,
    #[serde(default)]
    pub enrolled_at: Option<String>,
    #[serde(default)]
    pub last_accessed_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

fn course_title(value: &str) -> Result<(), ValidationError> {
    at_least(value, 5, "title must be at least 5 characters long")
}

fn course_description(value: &str) -> Result<(), ValidationError> {
    at_least(value, 10, "description must be at least 10 characters long")
}

fn short_title(value: &str) -> Result<(), ValidationError> {
    at_least(value, 3, "title must be at least 3 characters long")
}

fn lesson_content(value: &str) -> Result<(), ValidationError> {
    at_least(value, 10, "content must be at least 10 characters long")
}

fn course_level(value: &str) -> Result<(), ValidationError> {
    one_of(value, &COURSE_LEVELS, "level must be beginner, intermediate or advanced")
}

fn lesson_type(value: &str) -> Result<(), ValidationError> {
    one_of(value, &LESSON_TYPES, "lesson type must be text, video or quiz")
}

fn at_least(value: &str, min: usize, code: &'static str) -> Result<(), ValidationError> {
    if value.trim().chars().count() < min {
        return Err(ValidationError::new(code));
    }
    Ok(())
}

fn one_of(value: &str, allowed: &[&str], code: &'static str) -> Result<(), ValidationError> {
    if !allowed.contains(&value) {
        return Err(ValidationError::new(code));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewCourse {
    #[validate(custom(function = "course_title"))]
    pub title: String,
    #[validate(custom(function = "course_description"))]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    pub is_published: bool,
    #[validate(custom(function = "course_level"))]
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<u32>,
}

impl NewCourse {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            featured_image: None,
            is_published: false,
            level: default_level(),
            duration_hours: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct CourseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "course_title"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "course_description"))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "course_level"))]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_hours: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewModule {
    #[validate(custom(function = "short_title"))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub order: i64,
    pub course_id: ResourceId,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct ModuleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "short_title"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewLesson {
    #[validate(custom(function = "short_title"))]
    pub title: String,
    #[validate(custom(function = "lesson_content"))]
    pub content: String,
    #[validate(range(min = 0))]
    pub order: i64,
    pub module_id: ResourceId,
    #[validate(custom(function = "self::lesson_type"))]
    pub lesson_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct LessonUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "short_title"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "lesson_content"))]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0))]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "self::lesson_type"))]
    pub lesson_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewEnrollment {
    pub user_id: ResourceId,
    pub course_id: ResourceId,
    pub is_completed: bool,
    #[validate(range(min = 0.0, max = 100.0))]
    pub progress_percentage: f64,
}

impl NewEnrollment {
    pub fn new(user_id: impl Into<ResourceId>, course_id: impl Into<ResourceId>) -> Self {
        Self {
            user_id: user_id.into(),
            course_id: course_id.into(),
            is_completed: false,
            progress_percentage: 0.0,
        }
    }
}

/// Filters accepted by `GET /courses`.
#[derive(Debug, Clone, Default)]
pub struct CourseQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub instructor_id: Option<ResourceId>,
    pub is_published: Option<bool>,
    pub difficulty_level: Option<String>,
}

impl CourseQuery {
    pub fn page(skip: u32, limit: u32) -> Self {
        Self {
            skip: Some(skip),
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(skip) = self.skip {
            pairs.push(("skip".to_string(), skip.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search".to_string(), search.trim().to_string()));
        }
        if let Some(id) = &self.instructor_id {
            pairs.push(("instructor_id".to_string(), id.to_string()));
        }
        if let Some(published) = self.is_published {
            pairs.push(("is_published".to_string(), published.to_string()));
        }
        if let Some(level) = &self.difficulty_level {
            pairs.push(("difficulty_level".to_string(), level.clone()));
        }
        pairs
    }
}

/// A course with its modules and their lessons, both in display order.
#[derive(Debug, Clone)]
pub struct LearningPath {
    pub course: Course,
    pub sections: Vec<PathSection>,
}

#[derive(Debug, Clone)]
pub struct PathSection {
    pub module: Module,
    pub lessons: Vec<Lesson>,
}

impl LearningPath {
    /// Groups lessons under their module by `module_id`. Lessons pointing at
    /// modules outside this course are dropped.
    pub fn build(course: Course, mut modules: Vec<Module>, mut lessons: Vec<Lesson>) -> Self {
        modules.sort_by_key(|m| m.order);
        lessons.sort_by_key(|l| l.order);

        let sections = modules
            .into_iter()
            .map(|module| {
                let module_lessons = lessons
                    .iter()
                    .filter(|l| l.module_id.as_ref() == Some(&module.id))
                    .cloned()
                    .collect();
                PathSection {
                    module,
                    lessons: module_lessons,
                }
            })
            .collect();

        Self { course, sections }
    }

    pub fn lesson_count(&self) -> usize {
        self.sections.iter().map(|s| s.lessons.len()).sum()
    }

    pub fn total_duration_minutes(&self) -> u32 {
        self.sections
            .iter()
            .flat_map(|s| &s.lessons)
            .filter_map(|l| l.duration_minutes)
            .sum()
    }

    /// Percentage of lessons in this path that appear in `completed`.
    pub fn progress(&self, completed: &HashSet<ResourceId>) -> f64 {
        let total = self.lesson_count();
        if total == 0 {
            return 0.0;
        }
        let done = self
            .sections
            .iter()
            .flat_map(|s| &s.lessons)
            .filter(|l| completed.contains(&l.id))
            .count();
        (done as f64 / total as f64) * 100.0
    }

    pub fn next_lesson(&self, completed: &HashSet<ResourceId>) -> Option<&Lesson> {
        self.sections
            .iter()
            .flat_map(|s| &s.lessons)
            .find(|l| !completed.contains(&l.id))
    }
}
