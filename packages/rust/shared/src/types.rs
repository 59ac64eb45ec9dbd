//! Core domain types for the enrichment pipeline.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Number of references gathered for every rewrite.
pub const REFERENCE_COUNT: usize = 2;

/// Maximum number of characters kept from a scraped reference page.
pub const MAX_REFERENCE_CHARS: usize = 4000;

/// Suffix appended to the title of every published rewrite.
pub const UPDATED_TITLE_SUFFIX: &str = " (Updated)";

/// `source_url` sentinel marking a record as generated rather than scraped.
pub const GENERATED_SOURCE_URL: &str = "generated-by-llm";

/// Listed in place of a reference that has no origin URL.
pub const MISSING_REFERENCE_PLACEHOLDER: &str = "Reference unavailable";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 identifying one pipeline run (time-sortable, used in log spans).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// An article record as returned by the storage service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Identifier assigned by the storage service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub title: String,
    pub content: String,
    /// Origin page, or [`GENERATED_SOURCE_URL`] for rewrites.
    pub source_url: String,
    /// URL slug assigned by the storage service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Accept RFC 3339 or offset-less `YYYY-MM-DD HH:MM:SS` (read as UTC).
/// Anything else becomes `None` instead of rejecting the record.
fn lenient_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

impl Article {
    /// Whether this record was produced by the pipeline itself.
    pub fn is_generated(&self) -> bool {
        self.source_url == GENERATED_SOURCE_URL
    }
}

/// Payload for creating a new article record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub source_url: String,
}

// ---------------------------------------------------------------------------
// Reference
// ---------------------------------------------------------------------------

/// A secondary web page used as grounding context for a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    /// Origin link, if known.
    pub url: Option<String>,
    /// Extracted body text. Empty when extraction failed, never absent.
    pub text: String,
}

impl Reference {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            text: text.into(),
        }
    }

    /// The line used for this reference in a published `References:` block.
    pub fn citation(&self) -> &str {
        self.url.as_deref().unwrap_or(MISSING_REFERENCE_PLACEHOLDER)
    }
}

// ---------------------------------------------------------------------------
// RewrittenArticle
// ---------------------------------------------------------------------------

/// The article as it will be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenArticle {
    /// Original title plus [`UPDATED_TITLE_SUFFIX`].
    pub title: String,
    /// Rewritten body followed by the serialized reference list.
    pub content: String,
    /// Reference URLs in search-rank order.
    pub references: Vec<String>,
}

impl RewrittenArticle {
    /// Build the publishable article from the original title, the rewritten
    /// body and the references used for the rewrite.
    pub fn compose(original_title: &str, body: &str, references: &[Reference]) -> Self {
        let citations: Vec<&str> = references.iter().map(Reference::citation).collect();

        Self {
            title: format!("{original_title}{UPDATED_TITLE_SUFFIX}"),
            content: format!("{body}\n\nReferences:\n{}", citations.join("\n")),
            references: references
                .iter()
                .take(REFERENCE_COUNT)
                .filter_map(|r| r.url.clone())
                .collect(),
        }
    }

    /// Wire payload for the storage service.
    pub fn to_new_article(&self) -> NewArticle {
        NewArticle {
            title: self.title.clone(),
            content: self.content.clone(),
            source_url: GENERATED_SOURCE_URL.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Degradation
// ---------------------------------------------------------------------------

/// A recoverable stage failure that was replaced by a fallback value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// Search returned fewer links than needed; fallback references filled in.
    SearchDegraded { found: usize },
    /// A reference page yielded no text.
    ScrapeDegraded { url: String },
    /// The generative provider failed; the fallback template was used.
    RewriteDegraded { reason: String },
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SearchDegraded { found } => {
                write!(f, "search degraded ({found} result(s), fallback references used)")
            }
            Self::ScrapeDegraded { url } => write!(f, "scrape degraded ({url})"),
            Self::RewriteDegraded { reason } => write!(f, "rewrite degraded ({reason})"),
        }
    }
}
