//! engine::reorder
//!
//! Move, insert-and-shift-right and replace within one field's ordered
//! values. All three leave the field's places at `0..n-1` and mark the
//! owner modified so that relationship places follow on the next update.

use tracing::debug;

use crate::core::owner::Owner;
use crate::core::types::{FieldName, RecordId};

use super::mutate::{commit_records, ValueBatch};
use super::{EngineError, InvalidArgument, MetadataService, PlaceStrategy};

/// Ids of the records for exactly `field`, in place order.
fn ordered_ids(owner: &Owner, field: &FieldName) -> Vec<RecordId> {
    let mut records: Vec<_> = owner
        .records()
        .iter()
        .filter(|r| r.field().name() == field)
        .collect();
    records.sort_by_key(|r| r.place());
    records.into_iter().map(|r| r.id()).collect()
}

/// Give each id its position as place.
fn assign_places(owner: &mut Owner, ids: &[RecordId]) {
    for (place, id) in ids.iter().enumerate() {
        if let Some(record) = owner.record_mut(*id) {
            record.set_place(place as u32);
        }
    }
}

impl MetadataService<'_> {
    /// `moveMetadata`: take the value at `from` and reinsert it at `to`,
    /// shifting the values in between.
    ///
    /// # Errors
    ///
    /// [`InvalidArgument::NoOpMove`] when `from == to`,
    /// [`InvalidArgument::IndexOutOfRange`] when either index is not a
    /// position of the field.
    pub fn move_metadata(
        &self,
        owner: &mut Owner,
        field: &FieldName,
        from: usize,
        to: usize,
    ) -> Result<(), EngineError> {
        if from == to {
            return Err(InvalidArgument::NoOpMove { index: from }.into());
        }

        let mut ids = ordered_ids(owner, field);
        let len = ids.len();
        for index in [from, to] {
            if index >= len {
                return Err(InvalidArgument::IndexOutOfRange {
                    field: field.to_string(),
                    index,
                    len,
                }
                .into());
            }
        }

        let moved = ids.remove(from);
        ids.insert(to, moved);
        assign_places(owner, &ids);
        owner.mark_metadata_modified();

        debug!(field = %field, from, to, "moved metadata value");
        Ok(())
    }

    /// `addAndShiftRight`: insert values so that the first sits at `index`
    /// and the rest follow it in batch order; values at `index` and after
    /// move up by the number inserted. An index past the end appends.
    ///
    /// Returns the first new id, or `None` when every value was skipped
    /// (virtual authority).
    pub fn insert_and_shift_right(
        &self,
        owner: &mut Owner,
        field: &FieldName,
        language: Option<&str>,
        value: ValueBatch,
        index: usize,
    ) -> Result<Option<RecordId>, EngineError> {
        let resolved = self.require_field(field)?;
        let mut ids = ordered_ids(owner, field);

        if index >= ids.len() {
            let added =
                self.add_values(owner, &resolved, language, &value, PlaceStrategy::Append)?;
            return Ok(added.into_iter().next());
        }

        // Places are reassigned from `ids` once the records are committed.
        let records =
            self.prepare_values(owner, &resolved, language, &value, PlaceStrategy::Append)?;
        let added = commit_records(owner, records);
        let Some(&first) = added.first() else {
            return Ok(None);
        };

        ids.splice(index..index, added.iter().copied());
        assign_places(owner, &ids);

        debug!(field = %field, index, inserted = added.len(), "inserted metadata values");
        Ok(Some(first))
    }

    /// `replaceMetadata`: remove the value at `index` and insert the new
    /// values in its position, in batch order. Returns the first new id.
    ///
    /// # Errors
    ///
    /// [`InvalidArgument::IndexOutOfRange`] when there is no value at
    /// `index`; authority violations as for adds. On error the owner is
    /// unchanged.
    pub fn replace_metadata(
        &self,
        owner: &mut Owner,
        field: &FieldName,
        language: Option<&str>,
        value: ValueBatch,
        index: usize,
    ) -> Result<Option<RecordId>, EngineError> {
        let resolved = self.require_field(field)?;
        let mut ids = ordered_ids(owner, field);
        if index >= ids.len() {
            return Err(InvalidArgument::IndexOutOfRange {
                field: field.to_string(),
                index,
                len: ids.len(),
            }
            .into());
        }

        let records =
            self.prepare_values(owner, &resolved, language, &value, PlaceStrategy::Append)?;

        let old = ids.remove(index);
        owner.records_mut().retain(|r| r.id() != old);

        let added = commit_records(owner, records);
        ids.splice(index..index, added.iter().copied());
        assign_places(owner, &ids);

        debug!(field = %field, index, "replaced metadata value");
        Ok(added.into_iter().next())
    }
}
