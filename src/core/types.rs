//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`FieldName`] - Validated `schema.element[.qualifier]` triple
//! - [`FieldId`] - Stable identifier handed out by the field registry
//! - [`RecordId`] - Identity of one metadata value
//! - [`OwnerId`] - Identity of a repository object
//! - [`RelationshipId`] - Identity of a typed relationship between owners
//! - [`OwnerKind`] - The kind of repository object holding metadata
//! - [`UtcTimestamp`] - RFC3339 timestamp
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use repometa::core::types::FieldName;
//!
//! let field = FieldName::parse("dc.contributor.author").unwrap();
//! assert_eq!(field.schema(), "dc");
//! assert_eq!(field.element(), "contributor");
//! assert_eq!(field.qualifier(), Some("author"));
//!
//! assert!(FieldName::parse("dc").is_err());
//! assert!(FieldName::parse("dc.*").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Wildcard token accepted by queries for schema, element, qualifier,
/// language and authority. It is never stored on a record.
pub const ANY: &str = "*";

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid field name: {0}")]
    InvalidFieldName(String),

    #[error("invalid field token '{token}': {reason}")]
    InvalidToken { token: String, reason: String },

    #[error("unknown owner kind: {0}")]
    UnknownOwnerKind(String),
}

/// Validate one component of a field name (schema, element or qualifier).
///
/// Components must be non-empty, must not be the wildcard and may not
/// contain dots, whitespace or control characters.
pub fn validate_token(token: &str) -> Result<(), TypeError> {
    let reject = |reason: &str| {
        Err(TypeError::InvalidToken {
            token: token.to_string(),
            reason: reason.to_string(),
        })
    };

    if token.is_empty() {
        return reject("cannot be empty");
    }
    if token == ANY {
        return reject("the wildcard cannot name a field");
    }
    if token.contains('.') {
        return reject("cannot contain '.'");
    }
    if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return reject("cannot contain whitespace or control characters");
    }
    Ok(())
}

/// A validated metadata field name: `schema.element` or
/// `schema.element.qualifier`.
///
/// # Example
///
/// ```
/// use repometa::core::types::FieldName;
///
/// let title = FieldName::new("dc", "title", None).unwrap();
/// assert_eq!(title.to_string(), "dc.title");
///
/// let author = FieldName::new("dc", "contributor", Some("author")).unwrap();
/// assert_eq!(author.to_string(), "dc.contributor.author");
/// assert_eq!(author.key(), "dc_contributor_author");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldName {
    schema: String,
    element: String,
    qualifier: Option<String>,
}

impl FieldName {
    /// Create a new validated field name.
    ///
    /// An empty qualifier is normalized to `None`.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidToken` if any component is invalid.
    pub fn new(
        schema: impl Into<String>,
        element: impl Into<String>,
        qualifier: Option<&str>,
    ) -> Result<Self, TypeError> {
        let schema = schema.into();
        let element = element.into();
        validate_token(&schema)?;
        validate_token(&element)?;
        let qualifier = match qualifier.map(str::trim) {
            None | Some("") => None,
            Some(q) => {
                validate_token(q)?;
                Some(q.to_string())
            }
        };
        Ok(Self {
            schema,
            element,
            qualifier,
        })
    }

    /// Parse a dotted field name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidFieldName` unless the name has two or
    /// three valid components.
    pub fn parse(name: &str) -> Result<Self, TypeError> {
        let parts: Vec<&str> = name.trim().split('.').collect();
        match parts.as_slice() {
            [schema, element] => Self::new(*schema, *element, None),
            [schema, element, qualifier] => Self::new(*schema, *element, Some(qualifier)),
            _ => Err(TypeError::InvalidFieldName(format!(
                "expected schema.element[.qualifier], got '{name}'"
            ))),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// The underscore-joined key used by authority configuration
    /// (`dc_contributor_author`).
    pub fn key(&self) -> String {
        match &self.qualifier {
            Some(q) => format!("{}_{}_{}", self.schema, self.element, q),
            None => format!("{}_{}", self.schema, self.element),
        }
    }
}

impl TryFrom<String> for FieldName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<FieldName> for String {
    fn from(name: FieldName) -> Self {
        name.to_string()
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}.{}.{}", self.schema, self.element, q),
            None => write!(f, "{}.{}", self.schema, self.element),
        }
    }
}

/// Registry-assigned identifier of a metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(u32);

impl FieldId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a single metadata value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Allocate a fresh random record id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a repository object that owns metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Allocate a fresh random owner id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a typed relationship between two owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(u64);

impl RelationshipId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of repository object that holds a metadata record set.
///
/// Authority lookups during batch add are only performed for
/// [`OwnerKind::Item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Bitstream,
    Bundle,
    Item,
    Collection,
    Community,
    Site,
    Group,
    EPerson,
}

impl OwnerKind {
    /// Human readable type text, as used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Bitstream => "BITSTREAM",
            OwnerKind::Bundle => "BUNDLE",
            OwnerKind::Item => "ITEM",
            OwnerKind::Collection => "COLLECTION",
            OwnerKind::Community => "COMMUNITY",
            OwnerKind::Site => "SITE",
            OwnerKind::Group => "GROUP",
            OwnerKind::EPerson => "EPERSON",
        }
    }
}

impl std::str::FromStr for OwnerKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bitstream" => Ok(OwnerKind::Bitstream),
            "bundle" => Ok(OwnerKind::Bundle),
            "item" => Ok(OwnerKind::Item),
            "collection" => Ok(OwnerKind::Collection),
            "community" => Ok(OwnerKind::Community),
            "site" => Ok(OwnerKind::Site),
            "group" => Ok(OwnerKind::Group),
            "eperson" => Ok(OwnerKind::EPerson),
            other => Err(TypeError::UnknownOwnerKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A UTC timestamp, rendered as RFC3339.
///
/// # Example
///
/// ```
/// use repometa::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// println!("Current time: {}", now);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Create a timestamp from a chrono DateTime.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt)
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
