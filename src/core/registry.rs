//! core::registry
//!
//! The field registry: resolves `(schema, element, qualifier)` triples to
//! shared [`MetadataField`] definitions.
//!
//! # Architecture
//!
//! Fields are immutable once registered and are handed out as
//! `Arc<MetadataField>` so that every record of the same field shares one
//! definition. The registry is injected into the engine as a
//! `&dyn FieldRegistry`; nothing here is global.
//!
//! # Lookups
//!
//! - [`FieldRegistry::find_field`] - exact lookup, `None` qualifier means
//!   unqualified
//! - [`FieldRegistry::find_matching`] - wildcard-aware lookup driven by a
//!   [`FieldSelector`]
//!
//! # Example
//!
//! ```
//! use repometa::core::registry::{FieldRegistry, InMemoryFieldRegistry};
//!
//! let mut registry = InMemoryFieldRegistry::new();
//! registry.register("dc", "title", None).unwrap();
//! registry.register("dc", "contributor", Some("author")).unwrap();
//!
//! let title = registry.find_field("dc", "title", None).unwrap();
//! assert_eq!(title.to_string(), "dc.title");
//! assert!(registry.find_field("dc", "title", Some("alternative")).is_none());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::core::matcher::FieldSelector;
use crate::core::types::{FieldId, FieldName, TypeError, ANY};

/// Errors from registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("metadata field {0} is already registered")]
    Duplicate(String),

    #[error("invalid field: {0}")]
    Invalid(#[from] TypeError),
}

/// A registered metadata field.
///
/// Identity is the `(schema, element, qualifier)` triple; `id` is the
/// registry's stable handle for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataField {
    id: FieldId,
    name: FieldName,
    scope_note: Option<String>,
}

impl MetadataField {
    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn name(&self) -> &FieldName {
        &self.name
    }

    pub fn schema(&self) -> &str {
        self.name.schema()
    }

    pub fn element(&self) -> &str {
        self.name.element()
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.name.qualifier()
    }

    pub fn scope_note(&self) -> Option<&str> {
        self.scope_note.as_deref()
    }

    /// Authority configuration key (`schema_element_qualifier`).
    pub fn key(&self) -> String {
        self.name.key()
    }
}

impl std::fmt::Display for MetadataField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Lookup contract for metadata fields.
///
/// Reads never fail: an unknown field is `None` or an empty list. Write
/// paths in the engine turn a missing field into an invalid-argument error.
pub trait FieldRegistry {
    /// Exact lookup. `qualifier` of `None` (or empty) means unqualified.
    fn find_field(
        &self,
        schema: &str,
        element: &str,
        qualifier: Option<&str>,
    ) -> Option<Arc<MetadataField>>;

    /// Look a field up by its registry id.
    fn field(&self, id: FieldId) -> Option<Arc<MetadataField>>;

    /// All fields accepted by `selector`, in registration order.
    fn find_matching(&self, selector: &FieldSelector) -> Vec<Arc<MetadataField>>;

    /// Exact lookup by validated name.
    fn find_by_name(&self, name: &FieldName) -> Option<Arc<MetadataField>> {
        self.find_field(name.schema(), name.element(), name.qualifier())
    }
}

/// Field registry held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryFieldRegistry {
    fields: Vec<Arc<MetadataField>>,
    by_name: HashMap<FieldName, usize>,
}

impl InMemoryFieldRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new field.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Invalid`] if a component is not a valid token
    /// - [`RegistryError::Duplicate`] if the triple is already registered
    pub fn register(
        &mut self,
        schema: &str,
        element: &str,
        qualifier: Option<&str>,
    ) -> Result<Arc<MetadataField>, RegistryError> {
        let name = FieldName::new(schema, element, qualifier)?;
        self.register_name(name, None)
    }

    /// Register a field by validated name, with an optional scope note.
    pub fn register_name(
        &mut self,
        name: FieldName,
        scope_note: Option<String>,
    ) -> Result<Arc<MetadataField>, RegistryError> {
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        let id = FieldId::new(self.fields.len() as u32 + 1);
        let field = Arc::new(MetadataField {
            id,
            name: name.clone(),
            scope_note,
        });
        self.by_name.insert(name, self.fields.len());
        self.fields.push(Arc::clone(&field));
        Ok(field)
    }

    /// Return the registered field, registering it first if needed.
    pub fn ensure(&mut self, name: &FieldName) -> Arc<MetadataField> {
        match self.by_name.get(name) {
            Some(&idx) => Arc::clone(&self.fields[idx]),
            None => {
                let id = FieldId::new(self.fields.len() as u32 + 1);
                let field = Arc::new(MetadataField {
                    id,
                    name: name.clone(),
                    scope_note: None,
                });
                self.by_name.insert(name.clone(), self.fields.len());
                self.fields.push(Arc::clone(&field));
                field
            }
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over all fields in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MetadataField>> {
        self.fields.iter()
    }
}

impl FieldRegistry for InMemoryFieldRegistry {
    fn find_field(
        &self,
        schema: &str,
        element: &str,
        qualifier: Option<&str>,
    ) -> Option<Arc<MetadataField>> {
        let name = FieldName::new(schema, element, qualifier).ok()?;
        self.by_name
            .get(&name)
            .map(|&idx| Arc::clone(&self.fields[idx]))
    }

    fn field(&self, id: FieldId) -> Option<Arc<MetadataField>> {
        let idx = (id.get() as usize).checked_sub(1)?;
        self.fields.get(idx).cloned()
    }

    fn find_matching(&self, selector: &FieldSelector) -> Vec<Arc<MetadataField>> {
        self.fields
            .iter()
            .filter(|f| selector.matches_field(f))
            .cloned()
            .collect()
    }
}

/// A dotted metadata path: `schema.element.qualifier.language`.
///
/// Missing trailing components are `None`. Produced by
/// [`parse_field_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub schema: Option<String>,
    pub element: Option<String>,
    pub qualifier: Option<String>,
    pub language: Option<String>,
}

impl FieldPath {
    /// Replace every missing component with the wildcard.
    pub fn filled(self) -> FieldPath {
        let fill = |v: Option<String>| Some(v.unwrap_or_else(|| ANY.to_string()));
        FieldPath {
            schema: fill(self.schema),
            element: fill(self.element),
            qualifier: fill(self.qualifier),
            language: fill(self.language),
        }
    }
}

/// Single-word aliases from the original flat object columns.
fn legacy_alias(name: &str) -> Option<(&'static str, &'static str, Option<&'static str>)> {
    let mapped = match name {
        "introductory_text" => ("dc", "description", None),
        "short_description" => ("dc", "description", Some("abstract")),
        "side_bar_text" => ("dc", "description", Some("tableofcontents")),
        "copyright_text" => ("dc", "rights", None),
        "name" => ("dc", "title", None),
        "provenance_description" => ("dc", "provenance", None),
        "license" => ("dc", "rights", Some("license")),
        "user_format_description" => ("dc", "format", None),
        "source" => ("dc", "source", None),
        "relationship" | "entity-type" => ("dspace", "entity", Some("type")),
        "firstname" => ("eperson", "firstname", None),
        "lastname" => ("eperson", "lastname", None),
        "phone" => ("eperson", "phone", None),
        "language" => ("eperson", "language", None),
        "submission-type" => ("cris", "submission", Some("definition")),
        "workflow-name" => ("cris", "workflow", Some("name")),
        "shared-workspace" => ("cris", "workspace", Some("shared")),
        _ => return None,
    };
    Some(mapped)
}

/// Split `schema.element.qualifier.language` into its parts.
///
/// A single word without dots is first resolved through the legacy
/// aliases (`name` is `dc.title`, `license` is `dc.rights.license`, ...).
/// Blank components become `None`.
///
/// # Example
///
/// ```
/// use repometa::core::registry::parse_field_path;
///
/// let path = parse_field_path("dc.contributor.author.en");
/// assert_eq!(path.qualifier.as_deref(), Some("author"));
/// assert_eq!(path.language.as_deref(), Some("en"));
///
/// let legacy = parse_field_path("short_description");
/// assert_eq!(legacy.element.as_deref(), Some("description"));
/// assert_eq!(legacy.qualifier.as_deref(), Some("abstract"));
/// ```
pub fn parse_field_path(path: &str) -> FieldPath {
    let trimmed = path.trim();
    if !trimmed.contains('.') {
        if let Some((schema, element, qualifier)) = legacy_alias(trimmed) {
            return FieldPath {
                schema: Some(schema.to_string()),
                element: Some(element.to_string()),
                qualifier: qualifier.map(str::to_string),
                language: None,
            };
        }
    }

    let mut parts = trimmed.split('.').map(|p| {
        let p = p.trim();
        (!p.is_empty()).then(|| p.to_string())
    });
    FieldPath {
        schema: parts.next().flatten(),
        element: parts.next().flatten(),
        qualifier: parts.next().flatten(),
        language: parts.next().flatten(),
    }
}
