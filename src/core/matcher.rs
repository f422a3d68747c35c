//! core::matcher
//!
//! Wildcard matching of metadata records and locale-fallback language
//! filtering.
//!
//! # Matching
//!
//! A record matches a query when no supplied criterion disproves it:
//!
//! - schema / element: wildcard matches anything, otherwise exact equality
//! - qualifier: blank requires an unqualified field, wildcard matches
//!   anything, otherwise exact equality
//! - language: `None` requires an untagged record, wildcard matches
//!   anything, otherwise exact equality
//!
//! # Language Fallback
//!
//! [`filter_by_language`] picks the most relevant subset of each field
//! group, trying in order: the requested tag when it is a supported
//! locale language, the tag's language part (`en` for `en_US`), the first
//! supported locale language that has any records, the literal tag, and
//! finally the whole group.

use crate::core::record::MetadataRecord;
use crate::core::registry::MetadataField;
use crate::core::types::{FieldId, ANY};

/// A schema or element criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Any,
    Exactly(String),
}

impl Selector {
    /// The wildcard becomes [`Selector::Any`]; anything else is exact.
    pub fn new(pattern: &str) -> Self {
        if pattern == ANY {
            Selector::Any
        } else {
            Selector::Exactly(pattern.to_string())
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Selector::Any => true,
            Selector::Exactly(expected) => expected == candidate,
        }
    }
}

/// A qualifier criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualifierSelector {
    /// The field must be unqualified.
    Unqualified,
    Any,
    Exactly(String),
}

impl QualifierSelector {
    /// Blank or `None` is [`QualifierSelector::Unqualified`].
    pub fn new(pattern: Option<&str>) -> Self {
        match pattern {
            None => QualifierSelector::Unqualified,
            Some(p) if p.trim().is_empty() => QualifierSelector::Unqualified,
            Some(ANY) => QualifierSelector::Any,
            Some(p) => QualifierSelector::Exactly(p.to_string()),
        }
    }

    pub fn matches(&self, candidate: Option<&str>) -> bool {
        match self {
            QualifierSelector::Unqualified => candidate.is_none(),
            QualifierSelector::Any => true,
            QualifierSelector::Exactly(expected) => candidate == Some(expected.as_str()),
        }
    }
}

/// A language criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageSelector {
    /// Only records without a language.
    Untagged,
    Any,
    Tag(String),
}

impl LanguageSelector {
    /// `None` is [`LanguageSelector::Untagged`], the wildcard is
    /// [`LanguageSelector::Any`].
    pub fn new(language: Option<&str>) -> Self {
        match language {
            None => LanguageSelector::Untagged,
            Some(ANY) => LanguageSelector::Any,
            Some(tag) => LanguageSelector::Tag(tag.to_string()),
        }
    }

    pub fn matches(&self, candidate: Option<&str>) -> bool {
        match self {
            LanguageSelector::Untagged => candidate.is_none(),
            LanguageSelector::Any => true,
            LanguageSelector::Tag(tag) => candidate == Some(tag.as_str()),
        }
    }
}

/// Schema, element and qualifier criteria.
///
/// # Example
///
/// ```
/// use repometa::core::matcher::FieldSelector;
/// use repometa::core::registry::InMemoryFieldRegistry;
///
/// let mut registry = InMemoryFieldRegistry::new();
/// let author = registry.register("dc", "contributor", Some("author")).unwrap();
///
/// assert!(FieldSelector::new("dc", "contributor", Some("*")).matches_field(&author));
/// assert!(FieldSelector::new("*", "contributor", Some("author")).matches_field(&author));
/// assert!(!FieldSelector::new("dc", "contributor", None).matches_field(&author));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    pub schema: Selector,
    pub element: Selector,
    pub qualifier: QualifierSelector,
}

impl FieldSelector {
    pub fn new(schema: &str, element: &str, qualifier: Option<&str>) -> Self {
        Self {
            schema: Selector::new(schema),
            element: Selector::new(element),
            qualifier: QualifierSelector::new(qualifier),
        }
    }

    /// Every field.
    pub fn all() -> Self {
        Self {
            schema: Selector::Any,
            element: Selector::Any,
            qualifier: QualifierSelector::Any,
        }
    }

    pub fn matches_field(&self, field: &MetadataField) -> bool {
        self.element.matches(field.element())
            && self.qualifier.matches(field.qualifier())
            && self.schema.matches(field.schema())
    }
}

/// Match a record against field criteria and, when supplied, a language.
pub fn matches(
    selector: &FieldSelector,
    language: Option<&LanguageSelector>,
    record: &MetadataRecord,
) -> bool {
    if !selector.matches_field(record.field()) {
        return false;
    }
    match language {
        Some(lang) => lang.matches(record.language()),
        None => true,
    }
}

/// The language part of a locale tag: everything before the first `_`.
///
/// Hyphenated tags such as `en-US` are kept whole.
pub fn locale_language(locale: &str) -> &str {
    locale
        .split('_')
        .next()
        .unwrap_or(locale)
}

/// Filter records by language with locale fallback.
///
/// `supported_languages` is the ordered list of supported locale
/// languages. Records are grouped by field and each group is filtered
/// independently; groups keep the order of their first record.
pub fn filter_by_language<'a>(
    records: Vec<&'a MetadataRecord>,
    language: &LanguageSelector,
    supported_languages: &[String],
) -> Vec<&'a MetadataRecord> {
    match language {
        LanguageSelector::Any => records,
        LanguageSelector::Untagged => records
            .into_iter()
            .filter(|r| r.language().is_none())
            .collect(),
        LanguageSelector::Tag(tag) => group_by_field(records)
            .into_iter()
            .flat_map(|group| fallback_group(group, tag, supported_languages))
            .collect(),
    }
}

fn group_by_field(records: Vec<&MetadataRecord>) -> Vec<Vec<&MetadataRecord>> {
    let mut order: Vec<FieldId> = Vec::new();
    let mut groups: Vec<Vec<&MetadataRecord>> = Vec::new();
    for record in records {
        let id = record.field().id();
        match order.iter().position(|f| *f == id) {
            Some(idx) => groups[idx].push(record),
            None => {
                order.push(id);
                groups.push(vec![record]);
            }
        }
    }
    groups
}

fn fallback_group<'a>(
    group: Vec<&'a MetadataRecord>,
    tag: &str,
    supported: &[String],
) -> Vec<&'a MetadataRecord> {
    let with_language = |lang: &str| -> Vec<&'a MetadataRecord> {
        group
            .iter()
            .copied()
            .filter(|r| r.language() == Some(lang))
            .collect()
    };
    let if_supported = |lang: &str| -> Vec<&'a MetadataRecord> {
        if supported.iter().any(|s| s == lang) {
            with_language(lang)
        } else {
            Vec::new()
        }
    };

    let mut matched = if_supported(tag);

    if matched.is_empty() {
        matched = if_supported(locale_language(tag));
    }

    if matched.is_empty() {
        for lang in supported {
            matched = with_language(lang);
            if !matched.is_empty() {
                break;
            }
        }
    }

    if matched.is_empty() {
        matched = with_language(tag);
    }

    if matched.is_empty() {
        return group;
    }
    matched
}
