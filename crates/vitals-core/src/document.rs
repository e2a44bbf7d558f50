//! Documents as observed in the source log
//!
//! A [`SourceDocument`] is immutable once observed. Its log position is not
//! part of the document itself: positions are assigned by the change source
//! at append time and travel beside the document in a [`DocumentChange`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Known report form categories.
///
/// Each category selects a disjoint transformation rule set in the router.
/// Unknown form names never reach the pipeline: [`Category::from_form`]
/// returns `None` and the document is ignored upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Community maternal death notification review form
    DeathReview,
    /// Community health assistant verbal autopsy form
    VerbalAutopsy,
}

impl Category {
    /// All categories the bridge mirrors, in backfill order.
    pub const ALL: [Category; 2] = [Category::DeathReview, Category::VerbalAutopsy];

    /// Parse a raw form name into a known category.
    pub fn from_form(form: &str) -> Option<Self> {
        match form {
            "death_review" => Some(Category::DeathReview),
            "cha_verbal_autopsy" => Some(Category::VerbalAutopsy),
            _ => None,
        }
    }

    /// The raw form name as it appears on source documents.
    pub fn form_name(&self) -> &'static str {
        match self {
            Category::DeathReview => "death_review",
            Category::VerbalAutopsy => "cha_verbal_autopsy",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_name())
    }
}

/// Opaque, resumable position in the document log.
///
/// Positions are totally ordered by the change source, not by this type;
/// the bridge only ever stores the last committed position and hands it
/// back verbatim when resuming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(String);

impl Position {
    /// Create a position from a raw sequence token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The position meaning "only changes from now on".
    ///
    /// Used when no cursor has ever been committed.
    pub fn start() -> Self {
        Self("now".to_string())
    }

    /// The raw sequence token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Position {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl From<String> for Position {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Geographic point captured on a source document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// A report document as observed in the source log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Opaque, stable, unique document identifier
    pub id: String,
    /// Raw form name (category tag)
    pub form: String,
    /// Untyped form fields; values include strings, numbers and nested maps
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// Location captured at submission time, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<Geolocation>,
    /// When the report was submitted, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<DateTime<Utc>>,
}

impl SourceDocument {
    /// The known category of this document, if any.
    pub fn category(&self) -> Option<Category> {
        Category::from_form(&self.form)
    }

    /// Look up a top-level field value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Look up a field value inside a nested field group.
    pub fn group_field(&self, group: &str, name: &str) -> Option<&Value> {
        self.fields.get(group)?.as_object()?.get(name)
    }
}

/// A document paired with the log position it was observed at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChange {
    pub doc: SourceDocument,
    pub position: Position,
}
