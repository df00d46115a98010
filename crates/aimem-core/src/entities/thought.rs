//! Thought entity - a markdown document with YAML frontmatter

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::value_objects::ThoughtId;

/// A shared thought document as served by the document store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    pub id: ThoughtId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "lastModified")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Thought {
    /// Create a new Thought with required fields
    pub fn new(id: ThoughtId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
            path: None,
            team: None,
            tags: Vec::new(),
            updated_at: Some(Utc::now()),
        }
    }

    /// Short plain-text preview of the content body
    pub fn excerpt(&self, max_chars: usize) -> String {
        let body = strip_frontmatter(&self.content).trim();
        if body.chars().count() <= max_chars {
            return body.to_string();
        }
        let mut out: String = body.chars().take(max_chars).collect();
        out.push_str("...");
        out
    }

    /// Apply a patch locally (used for optimistic display only)
    pub fn apply(&mut self, patch: &ThoughtPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(tags) = &patch.tags {
            self.tags.clone_from(tags);
        }
        self.updated_at = Some(Utc::now());
    }
}

/// Partial update sent to the document store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ThoughtPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000000, message = "Content must be at most 1000000 characters"))]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl ThoughtPatch {
    /// Patch that replaces the full document content
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Check if the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }
}

/// Drop a leading `---` delimited YAML block, if present
fn strip_frontmatter(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("---\n") else {
        return content;
    };
    match rest.find("\n---") {
        Some(end) => {
            let after = &rest[end + 4..];
            after.strip_prefix('\n').unwrap_or(after)
        }
        None => content,
    }
}
