//! core::authority
//!
//! Authority control: confidence levels, the policy deciding which fields
//! are authority-controlled, and the resolver contract used to pick an
//! authority key for a raw value.
//!
//! # Confidence
//!
//! [`Confidence::Unset`] together with a blank authority means the field is
//! not authority-controlled or no lookup was attempted. A record with a
//! non-blank authority always carries some other confidence.
//!
//! # Collaborators
//!
//! - [`AuthorityPolicy`] - is a field controlled / required / backed by a
//!   choice list, for a given owner kind and collection context
//! - [`AuthorityResolver`] - best-match lookup for a raw value
//!
//! Both are injected into the engine; this module ships a config-driven
//! [`ConfiguredAuthorityPolicy`] and an in-memory [`VocabularyResolver`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::config::schema::AuthorityRule;
use crate::core::registry::MetadataField;
use crate::core::types::{OwnerId, OwnerKind};

/// How an authority key was obtained.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "i32", into = "i32")]
pub enum Confidence {
    /// No authority lookup attempted.
    #[default]
    Unset,
    /// Authority allowed but no value found.
    NoValue,
    /// The value was rejected by the authority.
    Rejected,
    /// The lookup failed.
    Failed,
    /// The authority holds no matching entry.
    NotFound,
    /// Several candidates matched.
    Ambiguous,
    /// A single candidate matched but was not confirmed.
    Uncertain,
    /// The key was accepted.
    Accepted,
}

impl Confidence {
    /// The numeric value persisted for this confidence.
    pub fn value(self) -> i32 {
        match self {
            Confidence::Unset => -1,
            Confidence::NoValue => 0,
            Confidence::Rejected => 100,
            Confidence::Failed => 200,
            Confidence::NotFound => 300,
            Confidence::Ambiguous => 400,
            Confidence::Uncertain => 500,
            Confidence::Accepted => 600,
        }
    }

    pub fn is_unset(self) -> bool {
        self == Confidence::Unset
    }
}

impl TryFrom<i32> for Confidence {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Confidence::Unset),
            0 => Ok(Confidence::NoValue),
            100 => Ok(Confidence::Rejected),
            200 => Ok(Confidence::Failed),
            300 => Ok(Confidence::NotFound),
            400 => Ok(Confidence::Ambiguous),
            500 => Ok(Confidence::Uncertain),
            600 => Ok(Confidence::Accepted),
            other => Err(format!("unknown confidence value {other}")),
        }
    }
}

impl From<Confidence> for i32 {
    fn from(c: Confidence) -> Self {
        c.value()
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// The context an authority decision is made in.
#[derive(Debug, Clone, Copy)]
pub struct AuthorityContext<'a> {
    pub field: &'a MetadataField,
    pub owner_kind: OwnerKind,
    pub collection: Option<OwnerId>,
}

/// Decides which fields are authority-controlled.
pub trait AuthorityPolicy {
    /// Whether values of this field may carry an authority key.
    fn is_authority_allowed(&self, ctx: &AuthorityContext<'_>) -> bool;

    /// Whether values of this field must carry an authority key.
    fn is_authority_required(&self, ctx: &AuthorityContext<'_>) -> bool;

    /// Whether a choice list (and so a resolver lookup) is configured.
    fn is_choices_configured(&self, ctx: &AuthorityContext<'_>) -> bool;
}

/// Result of an authority lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityMatch {
    pub authority: Option<String>,
    pub confidence: Confidence,
}

impl AuthorityMatch {
    pub fn none(confidence: Confidence) -> Self {
        Self {
            authority: None,
            confidence,
        }
    }
}

/// Supplies the best-match authority key for a raw value.
pub trait AuthorityResolver {
    fn best_match(
        &self,
        field_key: &str,
        raw_value: &str,
        owner_kind: OwnerKind,
        collection: Option<OwnerId>,
        locale: &str,
    ) -> AuthorityMatch;
}

/// Policy with no authority-controlled fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uncontrolled;

impl AuthorityPolicy for Uncontrolled {
    fn is_authority_allowed(&self, _ctx: &AuthorityContext<'_>) -> bool {
        false
    }

    fn is_authority_required(&self, _ctx: &AuthorityContext<'_>) -> bool {
        false
    }

    fn is_choices_configured(&self, _ctx: &AuthorityContext<'_>) -> bool {
        false
    }
}

/// Resolver that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl AuthorityResolver for NoResolver {
    fn best_match(
        &self,
        _field_key: &str,
        _raw_value: &str,
        _owner_kind: OwnerKind,
        _collection: Option<OwnerId>,
        _locale: &str,
    ) -> AuthorityMatch {
        AuthorityMatch::none(Confidence::NotFound)
    }
}

#[derive(Debug, Clone)]
struct FieldControl {
    required: bool,
    choices: bool,
    owner_kinds: Vec<OwnerKind>,
}

impl FieldControl {
    fn applies_to(&self, kind: OwnerKind) -> bool {
        self.owner_kinds.is_empty() || self.owner_kinds.contains(&kind)
    }
}

/// Authority policy built from `[[authority]]` configuration rows.
///
/// Rows are keyed by field key (`dc_contributor_author`). A row makes its
/// field authority-controlled; `required` and `choices` refine it. An
/// optional `owner_kinds` list restricts the row to those kinds.
///
/// # Example
///
/// ```
/// use repometa::core::authority::{AuthorityContext, AuthorityPolicy, ConfiguredAuthorityPolicy};
/// use repometa::core::registry::InMemoryFieldRegistry;
/// use repometa::core::types::OwnerKind;
///
/// let mut registry = InMemoryFieldRegistry::new();
/// let author = registry.register("dc", "contributor", Some("author")).unwrap();
///
/// let mut policy = ConfiguredAuthorityPolicy::new();
/// policy.control(&author.key(), true, false);
///
/// let ctx = AuthorityContext { field: &author, owner_kind: OwnerKind::Item, collection: None };
/// assert!(policy.is_authority_allowed(&ctx));
/// assert!(policy.is_authority_required(&ctx));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfiguredAuthorityPolicy {
    fields: HashMap<String, FieldControl>,
}

impl ConfiguredAuthorityPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the policy from configuration rows.
    ///
    /// Rows are assumed to be validated by the config layer.
    pub fn from_rules(rules: &[AuthorityRule]) -> Self {
        let mut policy = Self::new();
        for rule in rules {
            policy.fields.insert(
                rule.field.key(),
                FieldControl {
                    required: rule.required,
                    choices: rule.choices,
                    owner_kinds: rule.owner_kinds.clone(),
                },
            );
        }
        policy
    }

    /// Mark a field key as authority-controlled for every owner kind.
    pub fn control(&mut self, field_key: &str, required: bool, choices: bool) -> &mut Self {
        self.fields.insert(
            field_key.to_string(),
            FieldControl {
                required,
                choices,
                owner_kinds: Vec::new(),
            },
        );
        self
    }

    fn lookup(&self, ctx: &AuthorityContext<'_>) -> Option<&FieldControl> {
        self.fields
            .get(&ctx.field.key())
            .filter(|control| control.applies_to(ctx.owner_kind))
    }
}

impl AuthorityPolicy for ConfiguredAuthorityPolicy {
    fn is_authority_allowed(&self, ctx: &AuthorityContext<'_>) -> bool {
        self.lookup(ctx).is_some()
    }

    fn is_authority_required(&self, ctx: &AuthorityContext<'_>) -> bool {
        self.lookup(ctx).is_some_and(|c| c.required)
    }

    fn is_choices_configured(&self, ctx: &AuthorityContext<'_>) -> bool {
        self.lookup(ctx).is_some_and(|c| c.choices)
    }
}

/// A small in-memory controlled vocabulary.
///
/// Terms are matched case-insensitively after trimming. One matching key
/// is [`Confidence::Accepted`], several are [`Confidence::Ambiguous`] (the
/// first registered key is returned), none is [`Confidence::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct VocabularyResolver {
    terms: HashMap<String, HashMap<String, Vec<String>>>,
}

impl VocabularyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `term -> authority key` entry for a field key.
    pub fn insert(&mut self, field_key: &str, term: &str, authority: &str) -> &mut Self {
        self.terms
            .entry(field_key.to_string())
            .or_default()
            .entry(term.trim().to_lowercase())
            .or_default()
            .push(authority.to_string());
        self
    }
}

impl AuthorityResolver for VocabularyResolver {
    fn best_match(
        &self,
        field_key: &str,
        raw_value: &str,
        _owner_kind: OwnerKind,
        _collection: Option<OwnerId>,
        _locale: &str,
    ) -> AuthorityMatch {
        let candidates = self
            .terms
            .get(field_key)
            .and_then(|terms| terms.get(&raw_value.trim().to_lowercase()));

        match candidates.map(Vec::as_slice) {
            Some([only]) => AuthorityMatch {
                authority: Some(only.clone()),
                confidence: Confidence::Accepted,
            },
            Some([first, ..]) => AuthorityMatch {
                authority: Some(first.clone()),
                confidence: Confidence::Ambiguous,
            },
            _ => AuthorityMatch::none(Confidence::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::InMemoryFieldRegistry;

    mod confidence {
        use super::*;

        #[test]
        fn numeric_values() {
            assert_eq!(Confidence::Unset.value(), -1);
            assert_eq!(Confidence::NoValue.value(), 0);
            assert_eq!(Confidence::Accepted.value(), 600);
        }

        #[test]
        fn try_from_rejects_unknown() {
            assert_eq!(Confidence::try_from(600), Ok(Confidence::Accepted));
            assert!(Confidence::try_from(601).is_err());
        }

        #[test]
        fn serializes_as_integer() {
            assert_eq!(serde_json::to_string(&Confidence::Ambiguous).unwrap(), "400");
            let parsed: Confidence = serde_json::from_str("-1").unwrap();
            assert_eq!(parsed, Confidence::Unset);
        }

        #[test]
        fn default_is_unset() {
            assert!(Confidence::default().is_unset());
        }
    }

    mod policy {
        use super::*;

        #[test]
        fn configured_fields_only() {
            let mut registry = InMemoryFieldRegistry::new();
            let author = registry.register("dc", "contributor", Some("author")).unwrap();
            let title = registry.register("dc", "title", None).unwrap();

            let mut policy = ConfiguredAuthorityPolicy::new();
            policy.control(&author.key(), false, true);

            let author_ctx = AuthorityContext {
                field: &author,
                owner_kind: OwnerKind::Item,
                collection: None,
            };
            let title_ctx = AuthorityContext {
                field: &title,
                owner_kind: OwnerKind::Item,
                collection: None,
            };

            assert!(policy.is_authority_allowed(&author_ctx));
            assert!(!policy.is_authority_required(&author_ctx));
            assert!(policy.is_choices_configured(&author_ctx));
            assert!(!policy.is_authority_allowed(&title_ctx));
        }

        #[test]
        fn owner_kind_restriction() {
            let mut registry = InMemoryFieldRegistry::new();
            let author = registry.register("dc", "contributor", Some("author")).unwrap();
            let rule = AuthorityRule {
                field: author.name().clone(),
                required: true,
                choices: false,
                owner_kinds: vec![OwnerKind::Item],
            };
            let policy = ConfiguredAuthorityPolicy::from_rules(&[rule]);

            let item = AuthorityContext {
                field: &author,
                owner_kind: OwnerKind::Item,
                collection: None,
            };
            let collection = AuthorityContext {
                owner_kind: OwnerKind::Collection,
                ..item
            };
            assert!(policy.is_authority_required(&item));
            assert!(!policy.is_authority_allowed(&collection));
        }
    }

    mod vocabulary {
        use super::*;

        #[test]
        fn single_match_accepted() {
            let mut vocab = VocabularyResolver::new();
            vocab.insert("dc_subject", "Physics", "sub:phys");
            let m = vocab.best_match("dc_subject", " physics ", OwnerKind::Item, None, "en");
            assert_eq!(m.authority.as_deref(), Some("sub:phys"));
            assert_eq!(m.confidence, Confidence::Accepted);
        }

        #[test]
        fn multiple_matches_ambiguous() {
            let mut vocab = VocabularyResolver::new();
            vocab
                .insert("dc_contributor_author", "Smith, J", "p1")
                .insert("dc_contributor_author", "Smith, J", "p2");
            let m = vocab.best_match("dc_contributor_author", "Smith, J", OwnerKind::Item, None, "en");
            assert_eq!(m.authority.as_deref(), Some("p1"));
            assert_eq!(m.confidence, Confidence::Ambiguous);
        }

        #[test]
        fn no_match_not_found() {
            let vocab = VocabularyResolver::new();
            let m = vocab.best_match("dc_subject", "Chemistry", OwnerKind::Item, None, "en");
            assert_eq!(m, AuthorityMatch::none(Confidence::NotFound));
        }
    }
}
