use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::ResourceId;
use crate::domain::user::User;

pub const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Category {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Tag {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BlogPost {
    pub id: ResourceId,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub category_id: Option<ResourceId>,
    #[serde(default)]
    pub author_id: Option<ResourceId>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl BlogPost {
    pub fn word_count(&self) -> usize {
        word_count(&self.content)
    }

    pub fn read_time_minutes(&self) -> usize {
        read_time_minutes(&self.content)
    }

    /// Publication date, falling back to creation date for drafts.
    pub fn published_date(&self) -> Option<NaiveDate> {
        self.published_at
            .as_deref()
            .or(self.created_at.as_deref())
            .and_then(parse_date)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name.eq_ignore_ascii_case(name))
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Minutes at 200 words per minute, rounded up; never less than one.
pub fn read_time_minutes(text: &str) -> usize {
    word_count(text).div_ceil(WORDS_PER_MINUTE).max(1)
}

pub fn format_read_time(minutes: usize) -> String {
    format!("{minutes} min read")
}

/// Accepts RFC 3339 timestamps and the naive ISO form the API emits for
/// columns without a timezone.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn trimmed_at_least(value: &str, min: usize, code: &'static str) -> Result<(), ValidationError> {
    if value.trim().chars().count() < min {
        return Err(ValidationError::new(code));
    }
    Ok(())
}

pub(crate) fn post_title(value: &str) -> Result<(), ValidationError> {
    trimmed_at_least(value, 5, "title must be at least 5 characters long")
}

pub(crate) fn post_content(value: &str) -> Result<(), ValidationError> {
    trimmed_at_least(value, 10, "content must be at least 10 characters long")
}

fn label_name(value: &str) -> Result<(), ValidationError> {
    trimmed_at_least(value, 2, "name must be at least 2 characters long")
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewBlogPost {
    #[validate(custom(function = "post_title"))]
    pub title: String,
    #[validate(custom(function = "post_content"))]
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<ResourceId>,
    pub tag_ids: Vec<ResourceId>,
}

impl NewBlogPost {
    pub fn draft(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            excerpt: None,
            featured_image: None,
            is_published: false,
            category_id: None,
            tag_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct BlogPostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "post_title"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "post_content"))]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<ResourceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<ResourceId>>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewCategory {
    #[validate(custom(function = "label_name"))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct CategoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "label_name"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewTag {
    #[validate(custom(function = "label_name"))]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct TagUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "label_name"))]
    pub name: Option<String>,
}

/// Filters accepted by `GET /blogs`.
#[derive(Debug, Clone, Default)]
pub struct BlogQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub category_id: Option<ResourceId>,
    pub tag_id: Option<ResourceId>,
    pub author_id: Option<ResourceId>,
    pub search: Option<String>,
    pub is_published: Option<bool>,
}

impl BlogQuery {
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
        if let Some(id) = &self.category_id {
            pairs.push(("category_id".to_string(), id.to_string()));
        }
        if let Some(id) = &self.tag_id {
            pairs.push(("tag_id".to_string(), id.to_string()));
        }
        if let Some(id) = &self.author_id {
            pairs.push(("author_id".to_string(), id.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search".to_string(), search.trim().to_string()));
        }
        if let Some(published) = self.is_published {
            pairs.push(("is_published".to_string(), published.to_string()));
        }
        pairs
    }
}
