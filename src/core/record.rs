//! core::record
//!
//! The metadata value object.
//!
//! # Origins
//!
//! A record is either stored (added through the engine) or derived from a
//! typed relationship between two owners. Derived ("virtual") records carry
//! an authority of the form `virtual::<relationship id>` and may be flagged
//! `used_for_place`, in which case renumbering mirrors their place into the
//! relationship.
//!
//! # Place
//!
//! `place` is the zero-based position of a record among the same-field
//! records of its owner. Between mutations it may contain gaps or
//! duplicates; the renumbering pass restores `0..n-1`.

use std::sync::Arc;

use serde::Serialize;

use crate::core::authority::Confidence;
use crate::core::registry::MetadataField;
use crate::core::types::{OwnerId, RecordId, RelationshipId, ANY};

/// Authority prefix marking a relationship-derived value.
pub const VIRTUAL_AUTHORITY_PREFIX: &str = "virtual::";

/// Separator between the virtual prefix and the relationship id.
const VIRTUAL_SEPARATOR: &str = "::";

/// Value meaning "intentionally absent parent reference". Exempt from
/// authority-required enforcement.
pub const PLACEHOLDER_PARENT_METADATA_VALUE: &str = "#PLACEHOLDER_PARENT_METADATA_VALUE#";

/// Schema whose records are left untouched by renumbering.
pub const RELATION_SCHEMA: &str = "relation";

/// Link from a virtual record to the relationship it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VirtualLink {
    pub relationship_id: RelationshipId,
    pub used_for_place: bool,
}

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordOrigin {
    /// Added through the engine and persisted with the owner.
    Stored,
    /// Materialized from a relationship; never persisted directly.
    Relationship(VirtualLink),
}

/// One metadata value on an owner.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub(crate) id: RecordId,
    pub(crate) field: Arc<MetadataField>,
    pub(crate) owner: OwnerId,
    pub(crate) value: String,
    pub(crate) language: Option<String>,
    pub(crate) place: u32,
    pub(crate) authority: Option<String>,
    pub(crate) confidence: Confidence,
    pub(crate) security_level: Option<i32>,
    pub(crate) origin: RecordOrigin,
}

impl MetadataRecord {
    /// Create a stored record with no value yet. Only the engine creates
    /// records; callers go through the add operations.
    pub(crate) fn stored(owner: OwnerId, field: Arc<MetadataField>) -> Self {
        Self {
            id: RecordId::generate(),
            field,
            owner,
            value: String::new(),
            language: None,
            place: 0,
            authority: None,
            confidence: Confidence::Unset,
            security_level: None,
            origin: RecordOrigin::Stored,
        }
    }

    /// Create a relationship-derived record.
    pub(crate) fn derived(
        owner: OwnerId,
        field: Arc<MetadataField>,
        link: VirtualLink,
        value: &str,
        place: u32,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            field,
            owner,
            value: sanitize_value(value),
            language: None,
            place,
            authority: Some(virtual_authority(link.relationship_id)),
            confidence: Confidence::Accepted,
            security_level: None,
            origin: RecordOrigin::Relationship(link),
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn field(&self) -> &Arc<MetadataField> {
        &self.field
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn place(&self) -> u32 {
        self.place
    }

    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn security_level(&self) -> Option<i32> {
        self.security_level
    }

    pub fn origin(&self) -> RecordOrigin {
        self.origin
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.origin, RecordOrigin::Relationship(_))
    }

    /// Set the language. The wildcard is never stored; it becomes `None`.
    pub(crate) fn set_language(&mut self, language: Option<&str>) {
        self.language = match language.map(str::trim) {
            None => None,
            Some(ANY) => None,
            Some(tag) => Some(tag.to_string()),
        };
    }

    pub(crate) fn set_place(&mut self, place: u32) {
        self.place = place;
    }

    /// Whether this record lives in the `relation` schema.
    pub fn in_relation_schema(&self) -> bool {
        self.field.schema() == RELATION_SCHEMA
    }
}

impl std::fmt::Display for MetadataRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]={:?}", self.field, self.place, self.value)?;
        if let Some(lang) = &self.language {
            write!(f, " @{lang}")?;
        }
        if let Some(authority) = &self.authority {
            write!(f, " <{authority}/{}>", self.confidence)?;
        }
        Ok(())
    }
}

/// Trim a raw value and replace ISO control characters other than TAB, LF
/// and CR with a single space.
///
/// Trimming strips every leading and trailing character at or below
/// U+0020, so edge control characters are dropped rather than replaced.
///
/// # Example
///
/// ```
/// use repometa::core::record::sanitize_value;
///
/// assert_eq!(sanitize_value("  a\u{0}b\tc \n"), "a b\tc");
/// ```
pub fn sanitize_value(raw: &str) -> String {
    raw.trim_matches(|c: char| c <= ' ')
        .chars()
        .map(|c| {
            if c.is_control() && !matches!(c, '\t' | '\n' | '\r') {
                ' '
            } else {
                c
            }
        })
        .collect()
}

/// Whether the trimmed value is the placeholder sentinel.
pub fn is_placeholder(value: &str) -> bool {
    value.trim() == PLACEHOLDER_PARENT_METADATA_VALUE
}

/// Whether an authority key carries the virtual prefix.
pub fn is_virtual_authority(authority: Option<&str>) -> bool {
    authority.is_some_and(|a| a.starts_with(VIRTUAL_AUTHORITY_PREFIX))
}

/// Encode a relationship id as a virtual authority key.
pub fn virtual_authority(id: RelationshipId) -> String {
    format!("{VIRTUAL_AUTHORITY_PREFIX}{id}")
}

/// Extract the relationship id from a `virtual::<id>` authority key.
///
/// Returns `None` if the key lacks the prefix or the id is not numeric.
///
/// # Example
///
/// ```
/// use repometa::core::record::parse_virtual_authority;
/// use repometa::core::types::RelationshipId;
///
/// assert_eq!(parse_virtual_authority("virtual::17"), Some(RelationshipId::new(17)));
/// assert_eq!(parse_virtual_authority("virtual::x"), None);
/// assert_eq!(parse_virtual_authority("orcid::17"), None);
/// ```
pub fn parse_virtual_authority(authority: &str) -> Option<RelationshipId> {
    if !authority.starts_with(VIRTUAL_AUTHORITY_PREFIX) {
        return None;
    }
    authority
        .split(VIRTUAL_SEPARATOR)
        .filter(|part| !part.is_empty())
        .nth(1)
        .and_then(|id| id.trim().parse::<u64>().ok())
        .map(RelationshipId::new)
}
