//! engine
//!
//! The metadata service: reads, mutations, reordering and the renumbering
//! pass over one owner's record set.
//!
//! # Architecture
//!
//! [`MetadataService`] borrows its collaborators (field registry, authority
//! policy, authority resolver) and holds the locale settings. It never owns
//! an [`Owner`]; every operation takes the owner it works on.
//!
//! ```text
//! add / remove / move / replace  ->  owner marked "metadata modified"
//!                                ->  update(): renumber + relationship sync
//! ```
//!
//! # Invariants
//!
//! - Write paths validate the whole request before touching the owner
//! - After [`MetadataService::update`] every non-`relation` field of the
//!   owner has places `0..n-1`
//! - Reads never fail; absence is an empty result
//!
//! # Example
//!
//! ```
//! use repometa::core::authority::{NoResolver, Uncontrolled};
//! use repometa::core::owner::Owner;
//! use repometa::core::registry::InMemoryFieldRegistry;
//! use repometa::core::relationship::InMemoryRelationshipStore;
//! use repometa::core::types::{FieldName, OwnerKind};
//! use repometa::engine::{MetadataService, ValueBatch};
//!
//! let mut registry = InMemoryFieldRegistry::new();
//! registry.register("dc", "title", None).unwrap();
//! let service = MetadataService::new(&registry, &Uncontrolled, &NoResolver);
//!
//! let mut item = Owner::new(OwnerKind::Item);
//! let title = FieldName::parse("dc.title").unwrap();
//! service
//!     .add_metadata(&mut item, &title, None, ValueBatch::new(["First", "Second"]))
//!     .unwrap();
//!
//! let mut store = InMemoryRelationshipStore::new();
//! service.update(&mut item, &mut store).unwrap();
//!
//! let values: Vec<&str> = service
//!     .get_metadata(&item, "dc", "title", None, Some("*"))
//!     .iter()
//!     .map(|r| r.value())
//!     .collect();
//! assert_eq!(values, vec!["First", "Second"]);
//! ```

pub mod mutate;
pub mod query;
pub mod renumber;
pub mod reorder;
pub mod virtual_metadata;

pub use mutate::ValueBatch;
pub use renumber::RenumberReport;

use std::sync::Arc;

use thiserror::Error;

use crate::core::authority::{AuthorityContext, AuthorityPolicy, AuthorityResolver};
use crate::core::config::Config;
use crate::core::owner::Owner;
use crate::core::registry::{FieldRegistry, MetadataField};
use crate::core::relationship::RelationshipError;
use crate::core::types::FieldName;

/// Caller mistakes rejected by write paths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidArgument {
    #[error("cannot add empty values to metadata field {field}")]
    EmptyValues { field: String },

    #[error("metadata field {field} is not authority controlled but authority '{authority}' was provided")]
    AuthorityNotAllowed { field: String, authority: String },

    #[error("metadata field {field} requires an authority key but none was provided for value {value:?}")]
    AuthorityRequired { field: String, value: String },

    #[error("move source and destination are both {index}")]
    NoOpMove { index: usize },

    #[error("index {index} is outside 0..{len} for metadata field {field}")]
    IndexOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },

    #[error("metadata field {0} does not exist")]
    UnknownField(String),
}

/// Errors from engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request itself is wrong; nothing was changed.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),

    /// The owner's record set is in a state the engine never produces.
    #[error("consistency violation: {0}")]
    ConsistencyViolation(String),

    #[error("relationship store: {0}")]
    Relationship(#[from] RelationshipError),
}

/// How places are assigned to the values of one add call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceStrategy {
    /// After the existing values of the field: the k-th new value gets
    /// `count + k`.
    #[default]
    Append,
    /// Starting at an explicit index: the k-th new value gets `index + k`.
    At(u32),
}

impl PlaceStrategy {
    /// Place of the k-th new value, or `None` when it does not fit a `u32`.
    fn place(self, existing: usize, k: usize) -> Option<u32> {
        match self {
            PlaceStrategy::Append => u32::try_from(existing.checked_add(k)?).ok(),
            PlaceStrategy::At(index) => index.checked_add(u32::try_from(k).ok()?),
        }
    }

    /// First index the strategy writes to.
    fn start(self, existing: usize) -> usize {
        match self {
            PlaceStrategy::Append => existing,
            PlaceStrategy::At(index) => index as usize,
        }
    }
}

/// Metadata operations over owners, bound to injected collaborators.
pub struct MetadataService<'a> {
    registry: &'a dyn FieldRegistry,
    policy: &'a dyn AuthorityPolicy,
    resolver: &'a dyn AuthorityResolver,
    default_locale: String,
    supported_languages: Vec<String>,
}

impl<'a> MetadataService<'a> {
    /// Create a service with the `en` locale.
    pub fn new(
        registry: &'a dyn FieldRegistry,
        policy: &'a dyn AuthorityPolicy,
        resolver: &'a dyn AuthorityResolver,
    ) -> Self {
        Self {
            registry,
            policy,
            resolver,
            default_locale: "en".to_string(),
            supported_languages: vec!["en".to_string()],
        }
    }

    /// Set the default locale and the supported locale languages used by
    /// language fallback.
    pub fn with_locales(
        mut self,
        default_locale: impl Into<String>,
        supported_languages: Vec<String>,
    ) -> Self {
        self.default_locale = default_locale.into();
        self.supported_languages = supported_languages;
        self
    }

    /// Take locale settings from a loaded configuration.
    pub fn with_config(self, config: &Config) -> Self {
        let languages = config.supported_languages();
        self.with_locales(config.default_locale(), languages)
    }

    pub fn supported_languages(&self) -> &[String] {
        &self.supported_languages
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Resolve a field for a write path.
    fn require_field(&self, name: &FieldName) -> Result<Arc<MetadataField>, InvalidArgument> {
        self.registry
            .find_by_name(name)
            .ok_or_else(|| InvalidArgument::UnknownField(name.to_string()))
    }

    fn authority_context<'f>(&self, owner: &Owner, field: &'f MetadataField) -> AuthorityContext<'f> {
        AuthorityContext {
            field,
            owner_kind: owner.kind(),
            collection: owner.collection(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared setup for engine unit tests.

    use crate::core::authority::ConfiguredAuthorityPolicy;
    use crate::core::registry::InMemoryFieldRegistry;
    use crate::core::types::FieldName;

    pub fn registry() -> InMemoryFieldRegistry {
        let mut registry = InMemoryFieldRegistry::new();
        for name in [
            "dc.title",
            "dc.subject",
            "dc.contributor.author",
            "dc.contributor.editor",
            "dc.description.abstract",
            "relation.isAuthorOfPublication",
        ] {
            registry
                .register_name(FieldName::parse(name).unwrap(), None)
                .unwrap();
        }
        registry
    }

    pub fn author_policy(required: bool) -> ConfiguredAuthorityPolicy {
        let mut policy = ConfiguredAuthorityPolicy::new();
        policy.control("dc_contributor_author", required, false);
        policy
    }

    pub fn name(s: &str) -> FieldName {
        FieldName::parse(s).unwrap()
    }
}
