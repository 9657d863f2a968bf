//! Core domain types for the topic → article → post pipeline.

use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one batch run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
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
// InputRow
// ---------------------------------------------------------------------------

/// One validated row of the topic spreadsheet. Every field is trimmed and
/// `topic` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    pub topic: String,
    pub author_name: String,
    /// Comma-separated category names, unresolved.
    pub category_names: String,
    /// Comma-separated tag names, unresolved.
    pub tag_names: String,
}

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

/// The kind of remote taxonomy term being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
    Author,
    Category,
    Tag,
}

impl TermKind {
    /// REST collection name under the CMS base URL.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Author => "users",
            Self::Category => "categories",
            Self::Tag => "tags",
        }
    }

    /// Human-readable label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Author => "User",
            Self::Category => "Category",
            Self::Tag => "Tag",
        }
    }
}

impl std::fmt::Display for TermKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection())
    }
}

/// Remote identifier of a user, category or tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(pub u64);

impl std::fmt::Display for TermId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A term as returned by the CMS search endpoint. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteTerm {
    pub id: TermId,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Articles and posts
// ---------------------------------------------------------------------------

/// Generated text split into its title line and the remaining body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArticle {
    pub title: String,
    pub body: String,
}

/// Publication state requested for new posts.
///
/// Anything other than `publish` is kept as an open label and treated as the
/// CMS's default non-published state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostStatus {
    Publish,
    Unpublished(String),
}

impl PostStatus {
    /// Interpret the configured `post_status` value.
    pub fn from_config(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("publish") {
            Self::Publish
        } else {
            Self::Unpublished(value.to_lowercase())
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, Self::Publish)
    }
}

impl Default for PostStatus {
    fn default() -> Self {
        Self::Unpublished("draft".into())
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Publish => f.write_str("publish"),
            Self::Unpublished(label) if label.is_empty() => f.write_str("draft"),
            Self::Unpublished(label) => f.write_str(label),
        }
    }
}

/// Publish-ready document sent to `POST /posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishDocument {
    pub title: String,
    pub content: String,
    pub author: TermId,
    pub categories: Vec<TermId>,
    pub tags: Vec<TermId>,
    /// Only `publish` goes on the wire; otherwise the CMS default applies.
    #[serde(
        skip_serializing_if = "is_unpublished",
        serialize_with = "serialize_status"
    )]
    pub status: PostStatus,
}

fn is_unpublished(status: &PostStatus) -> bool {
    !status.is_published()
}

fn serialize_status<S: Serializer>(
    status: &PostStatus,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(status)
}
