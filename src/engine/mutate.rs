//! engine::mutate
//!
//! Adding, clearing and removing values.
//!
//! # Authority Handling
//!
//! For each value of a batch:
//!
//! - a non-empty authority on a field that is not authority-controlled is
//!   rejected
//! - an authority with the `virtual::` prefix skips the value entirely
//! - on a controlled field, a supplied authority is stored with the
//!   supplied confidence (NOVALUE when none); without one, the authority
//!   is empty and the supplied confidence (UNSET when none) is kept
//! - on a required field, a value without authority is rejected unless it
//!   is the placeholder sentinel
//!
//! A failing batch leaves the owner untouched.

use std::sync::Arc;

use tracing::debug;

use crate::core::authority::Confidence;
use crate::core::matcher::{self, FieldSelector, LanguageSelector};
use crate::core::owner::Owner;
use crate::core::record::{is_placeholder, is_virtual_authority, sanitize_value, MetadataRecord};
use crate::core::registry::MetadataField;
use crate::core::types::{FieldName, OwnerKind, RecordId};

use super::{EngineError, InvalidArgument, MetadataService, PlaceStrategy};

/// Values for one add call, with optional parallel authorities and
/// confidences.
///
/// A `None` value reserves a slot: it is skipped, keeping the indexes of
/// the parallel lists aligned.
///
/// # Example
///
/// ```
/// use repometa::core::authority::Confidence;
/// use repometa::engine::ValueBatch;
///
/// let batch = ValueBatch::new(["Red Smith", "Walter White"])
///     .authorities([None, Some("p1")])
///     .confidences([Confidence::Unset, Confidence::Accepted]);
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueBatch {
    values: Vec<Option<String>>,
    authorities: Option<Vec<Option<String>>>,
    confidences: Option<Vec<Confidence>>,
    security_level: Option<i32>,
}

impl ValueBatch {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_slots(values.into_iter().map(|v| Some(v.into())))
    }

    /// Values that may contain reserved (`None`) slots.
    pub fn with_slots<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(|v| v.map(Into::into)).collect(),
            ..Self::default()
        }
    }

    /// One value with an authority key and confidence.
    pub fn single(value: impl Into<String>, authority: Option<&str>, confidence: Confidence) -> Self {
        let value: String = value.into();
        Self::new([value])
            .authorities([authority])
            .confidences([confidence])
    }

    pub fn authorities<I, S>(mut self, authorities: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        self.authorities = Some(authorities.into_iter().map(|a| a.map(Into::into)).collect());
        self
    }

    pub fn confidences<I>(mut self, confidences: I) -> Self
    where
        I: IntoIterator<Item = Confidence>,
    {
        self.confidences = Some(confidences.into_iter().collect());
        self
    }

    /// Carry a security level onto every new record.
    pub fn secured(mut self, level: i32) -> Self {
        self.security_level = Some(level);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn security_level(&self) -> Option<i32> {
        self.security_level
    }

    fn has_authorities(&self) -> bool {
        self.authorities.is_some()
    }

    /// Authority at `i`, with empty strings treated as absent.
    fn authority(&self, i: usize) -> Option<&str> {
        self.authorities
            .as_ref()
            .and_then(|a| a.get(i))
            .and_then(|a| a.as_deref())
            .filter(|a| !a.is_empty())
    }

    fn confidence(&self, i: usize) -> Option<Confidence> {
        self.confidences.as_ref().and_then(|c| c.get(i)).copied()
    }
}

impl MetadataService<'_> {
    /// `addMetadata`: add values to a named field, appending after its
    /// existing values.
    ///
    /// When the batch carries no authorities and the field is controlled
    /// with a configured choice list, authorities are looked up through the
    /// resolver first (items only; other owner kinds get none).
    ///
    /// # Errors
    ///
    /// [`InvalidArgument`] for an unknown field, an empty batch or an
    /// authority violation.
    pub fn add_metadata(
        &self,
        owner: &mut Owner,
        field: &FieldName,
        language: Option<&str>,
        batch: ValueBatch,
    ) -> Result<Vec<RecordId>, EngineError> {
        let field = self.require_field(field)?;
        let batch = self.resolve_authorities(owner, &field, batch);
        self.add_values(owner, &field, language, &batch, PlaceStrategy::Append)
    }

    /// Add values to a resolved field with an explicit place strategy.
    pub fn add_values(
        &self,
        owner: &mut Owner,
        field: &Arc<MetadataField>,
        language: Option<&str>,
        batch: &ValueBatch,
        strategy: PlaceStrategy,
    ) -> Result<Vec<RecordId>, EngineError> {
        let records = self.prepare_values(owner, field, language, batch, strategy)?;
        Ok(commit_records(owner, records))
    }

    /// Validate a batch and build its records without touching the owner.
    pub(crate) fn prepare_values(
        &self,
        owner: &Owner,
        field: &Arc<MetadataField>,
        language: Option<&str>,
        batch: &ValueBatch,
        strategy: PlaceStrategy,
    ) -> Result<Vec<MetadataRecord>, InvalidArgument> {
        if batch.is_empty() {
            return Err(InvalidArgument::EmptyValues {
                field: field.to_string(),
            });
        }

        let ctx = self.authority_context(owner, field);
        let controlled = self.policy.is_authority_allowed(&ctx);
        let required = self.policy.is_authority_required(&ctx);
        let existing = count_field(owner, field);

        let mut records = Vec::new();
        for (i, value) in batch.values.iter().enumerate() {
            let Some(value) = value else {
                continue;
            };
            let authority = batch.authority(i);

            if let Some(authority) = authority {
                if !controlled {
                    return Err(InvalidArgument::AuthorityNotAllowed {
                        field: field.to_string(),
                        authority: authority.to_string(),
                    });
                }
            }
            if is_virtual_authority(authority) {
                continue;
            }

            let place = strategy.place(existing, records.len()).ok_or_else(|| {
                InvalidArgument::IndexOutOfRange {
                    field: field.to_string(),
                    index: strategy.start(existing),
                    len: existing,
                }
            })?;
            let mut record = MetadataRecord::stored(owner.id(), Arc::clone(field));
            record.set_place(place);
            record.security_level = batch.security_level;
            record.set_language(language);

            if controlled {
                match authority {
                    Some(key) => {
                        record.authority = Some(key.to_string());
                        record.confidence = match batch.confidence(i) {
                            None | Some(Confidence::Unset) => Confidence::NoValue,
                            Some(c) => c,
                        };
                    }
                    None => {
                        record.authority = None;
                        record.confidence = batch.confidence(i).unwrap_or(Confidence::Unset);
                    }
                }
                if required && record.authority.is_none() && !is_placeholder(value) {
                    return Err(InvalidArgument::AuthorityRequired {
                        field: field.to_string(),
                        value: value.clone(),
                    });
                }
            }

            record.value = sanitize_value(value);
            records.push(record);
        }

        debug!(
            field = %field,
            owner = %owner.id(),
            added = records.len(),
            skipped = batch.len() - records.len(),
            "prepared metadata values"
        );
        Ok(records)
    }

    /// Fill in authorities from the resolver when the batch has none and
    /// the field has a choice list.
    fn resolve_authorities(&self, owner: &Owner, field: &MetadataField, batch: ValueBatch) -> ValueBatch {
        if batch.has_authorities() {
            return batch;
        }
        let ctx = self.authority_context(owner, field);
        if !(self.is_authority_controlled(owner, field) && self.policy.is_choices_configured(&ctx)) {
            return batch;
        }

        let key = field.key();
        let locale = matcher::locale_language(&self.default_locale).to_string();
        let (authorities, confidences): (Vec<Option<String>>, Vec<Confidence>) = batch
            .values
            .iter()
            .map(|value| match (owner.kind(), value) {
                (OwnerKind::Item, Some(value)) => {
                    let found = self.resolver.best_match(
                        &key,
                        value,
                        owner.kind(),
                        owner.collection(),
                        &locale,
                    );
                    (found.authority, found.confidence)
                }
                _ => (None, Confidence::Unset),
            })
            .unzip();

        batch.authorities(authorities).confidences(confidences)
    }

    /// `clearMetadata`: remove every record matching the field criteria and
    /// language. Returns the number removed.
    pub fn clear_metadata(
        &self,
        owner: &mut Owner,
        schema: &str,
        element: &str,
        qualifier: Option<&str>,
        language: Option<&str>,
    ) -> usize {
        let fields = FieldSelector::new(schema, element, qualifier);
        let language = LanguageSelector::new(language);
        clear_matching(owner, &fields, &language)
    }

    /// `removeMetadataValues`: remove the given records. Unknown ids are
    /// ignored. Returns the number removed.
    pub fn remove_values(&self, owner: &mut Owner, ids: &[RecordId]) -> usize {
        let before = owner.records().len();
        owner.records_mut().retain(|r| !ids.contains(&r.id()));
        owner.mark_metadata_modified();
        let removed = before - owner.records().len();
        debug!(owner = %owner.id(), removed, "removed metadata values");
        removed
    }

    /// Replace all values of a field in `language` with one value.
    ///
    /// A wildcard language clears every language and stores the new value
    /// without one.
    pub fn set_single_value(
        &self,
        owner: &mut Owner,
        field: &FieldName,
        language: Option<&str>,
        value: &str,
    ) -> Result<Option<RecordId>, EngineError> {
        let resolved = self.require_field(field)?;
        let batch = self.resolve_authorities(owner, &resolved, ValueBatch::new([value]));
        let mut records =
            self.prepare_values(owner, &resolved, language, &batch, PlaceStrategy::Append)?;

        let selector = FieldSelector::new(field.schema(), field.element(), field.qualifier());
        let language_selector = LanguageSelector::new(language);
        let remaining = owner
            .records()
            .iter()
            .filter(|r| r.field().id() == resolved.id())
            .filter(|r| !matcher::matches(&selector, Some(&language_selector), r))
            .count();
        for (k, record) in records.iter_mut().enumerate() {
            let place = PlaceStrategy::Append.place(remaining, k).ok_or_else(|| {
                InvalidArgument::IndexOutOfRange {
                    field: field.to_string(),
                    index: remaining,
                    len: remaining,
                }
            })?;
            record.set_place(place);
        }

        clear_matching(owner, &selector, &language_selector);
        Ok(commit_records(owner, records).into_iter().next())
    }

    /// Whether authority keys may be stored for `field` on `owner`.
    pub fn is_authority_controlled(&self, owner: &Owner, field: &MetadataField) -> bool {
        self.policy
            .is_authority_allowed(&self.authority_context(owner, field))
    }
}

/// Push prepared records onto the owner and record the touched fields.
pub(crate) fn commit_records(owner: &mut Owner, records: Vec<MetadataRecord>) -> Vec<RecordId> {
    let mut ids = Vec::with_capacity(records.len());
    for record in records {
        debug!(record = %record, "add");
        owner.add_details(record.field().to_string());
        ids.push(record.id());
        owner.push_record(record);
    }
    owner.mark_metadata_modified();
    ids
}

/// Number of records on `owner` for exactly `field`, in any language.
pub(crate) fn count_field(owner: &Owner, field: &MetadataField) -> usize {
    owner
        .records()
        .iter()
        .filter(|r| r.field().id() == field.id())
        .count()
}

fn clear_matching(owner: &mut Owner, fields: &FieldSelector, language: &LanguageSelector) -> usize {
    let before = owner.records().len();
    owner
        .records_mut()
        .retain(|r| !matcher::matches(fields, Some(language), r));
    owner.mark_metadata_modified();
    let removed = before - owner.records().len();
    debug!(owner = %owner.id(), removed, "cleared metadata");
    removed
}
