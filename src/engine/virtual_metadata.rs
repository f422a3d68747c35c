//! engine::virtual_metadata
//!
//! Relationship-derived ("virtual") records.
//!
//! Derived records live only in memory: they are materialized onto an owner
//! from a relationship, take part in reads and renumbering, and are dropped
//! again before the owner's stored metadata is persisted.

use tracing::debug;

use crate::core::owner::Owner;
use crate::core::record::{virtual_authority, MetadataRecord, VirtualLink};
use crate::core::relationship::Relationship;
use crate::core::types::{FieldName, RecordId};

use super::{EngineError, MetadataService};

impl MetadataService<'_> {
    /// Materialize the value `relationship` contributes to `owner`.
    ///
    /// The record gets the authority `virtual::<id>`, confidence ACCEPTED
    /// and the relationship's place on the owner's side. Materializing the
    /// same relationship and field again refreshes the existing record.
    ///
    /// # Errors
    ///
    /// - [`super::InvalidArgument::UnknownField`] if `field` is not registered
    /// - [`EngineError::ConsistencyViolation`] if `owner` is on neither side
    pub fn materialize_relationship(
        &self,
        owner: &mut Owner,
        field: &FieldName,
        relationship: &Relationship,
        value: &str,
        used_for_place: bool,
    ) -> Result<RecordId, EngineError> {
        let resolved = self.require_field(field)?;
        let owner_id = owner.id();
        if relationship.left_item != owner_id && relationship.right_item != owner_id {
            return Err(EngineError::ConsistencyViolation(format!(
                "owner {owner_id} is not part of relationship {}",
                relationship.id
            )));
        }

        let place = relationship.place(relationship.side_of(owner_id));
        let link = VirtualLink {
            relationship_id: relationship.id,
            used_for_place,
        };
        let authority = virtual_authority(relationship.id);
        let fresh = MetadataRecord::derived(owner_id, resolved, link, value, place);

        let existing = owner.records_mut().iter_mut().find(|r| {
            r.is_virtual() && r.field().id() == fresh.field().id() && r.authority() == Some(authority.as_str())
        });
        let id = match existing {
            Some(record) => {
                let id = record.id();
                *record = MetadataRecord { id, ..fresh };
                id
            }
            None => {
                let id = fresh.id();
                owner.push_record(fresh);
                id
            }
        };

        debug!(
            owner = %owner_id,
            related = %relationship.other(owner_id),
            relationship = %relationship.id,
            field = %field,
            place,
            "materialized derived value"
        );
        Ok(id)
    }

    /// Drop every derived record from `owner`. Returns the number dropped.
    pub fn strip_virtual(&self, owner: &mut Owner) -> usize {
        let before = owner.records().len();
        owner.records_mut().retain(|r| !r.is_virtual());
        before - owner.records().len()
    }
}
