//! Content pages and blog posts read by the public site.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use super::RecordId;
use super::value::parse_datetime;

/// A static content page (`/content`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: RecordId,
    pub title: String,
    pub slug: String,
    /// HTML body.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub main_photo: Option<String>,
    #[serde(default)]
    pub other_photos: Vec<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A blog post (`/blogs`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: RecordId,
    pub title: String,
    pub slug: String,
    /// HTML body.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub main_photo: Option<String>,
    #[serde(default)]
    pub other_photos: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl BlogPost {
    /// Category label, falling back to a generic one.
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or("Blog Post")
    }
}

/// Accepts RFC 3339 or naive timestamps; anything unparseable becomes `None`.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_datetime))
}
