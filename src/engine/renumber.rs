//! engine::renumber
//!
//! The renumbering pass run by [`MetadataService::update`].
//!
//! # Algorithm
//!
//! 1. Stable-sort all of the owner's records by place; on equal places a
//!    stored record comes before a relationship-derived one.
//! 2. Walk the sorted records with one counter per field, starting at 0:
//!    - a derived record used for place takes the next counter value and
//!      the same value is written to its relationship, on the owner's side
//!    - a record in the `relation` schema keeps its place
//!    - any other record takes the next counter value
//!
//! The whole plan is computed before anything is written, so a malformed
//! virtual authority leaves the owner as it was.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::owner::Owner;
use crate::core::record::{is_virtual_authority, parse_virtual_authority, RecordOrigin};
use crate::core::relationship::RelationshipStore;
use crate::core::types::{FieldId, RelationshipId};

use super::{EngineError, MetadataService};

/// Outcome of one renumbering pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenumberReport {
    /// Records that were assigned a place.
    pub renumbered: usize,
    /// `relation` schema records left untouched.
    pub relation_skipped: usize,
    /// Relationships whose place was written.
    pub relationships_synced: usize,
    /// Derived records whose relationship no longer exists.
    pub relationships_missing: usize,
}

impl RenumberReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl MetadataService<'_> {
    /// `update`: renumber a modified owner and push places of derived
    /// records into their relationships.
    ///
    /// An owner that is not "metadata modified" is left alone and an empty
    /// report is returned. Afterwards the dirty flags are cleared and
    /// `last_modified` is refreshed.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ConsistencyViolation`] for a record owned by another
    ///   owner, or a derived record whose authority names no relationship
    /// - [`EngineError::Relationship`] if the store rejects an update
    pub fn update(
        &self,
        owner: &mut Owner,
        relationships: &mut dyn RelationshipStore,
    ) -> Result<RenumberReport, EngineError> {
        if !owner.is_metadata_modified() {
            return Ok(RenumberReport::default());
        }

        let owner_id = owner.id();
        if let Some(foreign) = owner.records().iter().find(|r| r.owner() != owner_id) {
            return Err(EngineError::ConsistencyViolation(format!(
                "record {} belongs to {}, not {}",
                foreign.id(),
                foreign.owner(),
                owner_id
            )));
        }

        let mut order: Vec<usize> = (0..owner.records().len()).collect();
        order.sort_by_key(|&i| {
            let record = &owner.records()[i];
            (record.place(), record.is_virtual())
        });

        let mut report = RenumberReport::default();
        let mut counters: HashMap<FieldId, u32> = HashMap::new();
        let mut next_place = |field: FieldId| -> u32 {
            let counter = counters.entry(field).or_insert(0);
            let place = *counter;
            *counter += 1;
            place
        };

        let mut places: Vec<(usize, u32)> = Vec::with_capacity(order.len());
        let mut syncs: Vec<(RelationshipId, u32)> = Vec::new();
        for &i in &order {
            let record = &owner.records()[i];
            let used_for_place = matches!(
                record.origin(),
                RecordOrigin::Relationship(link) if link.used_for_place
            );

            if used_for_place && is_virtual_authority(record.authority()) {
                let place = next_place(record.field().id());
                let authority = record.authority().unwrap_or_default();
                let relationship = parse_virtual_authority(authority).ok_or_else(|| {
                    EngineError::ConsistencyViolation(format!(
                        "record {} has malformed virtual authority '{authority}'",
                        record.id()
                    ))
                })?;
                places.push((i, place));
                syncs.push((relationship, place));
            } else if record.in_relation_schema() {
                report.relation_skipped += 1;
            } else {
                places.push((i, next_place(record.field().id())));
            }
        }

        report.renumbered = places.len();
        let records = owner.records_mut();
        for (i, place) in places {
            records[i].set_place(place);
        }

        for (id, place) in syncs {
            match relationships.find(id) {
                Some(mut relationship) => {
                    let side = relationship.side_of(owner_id);
                    relationship.set_place(side, place);
                    relationships.update(&relationship)?;
                    report.relationships_synced += 1;
                }
                None => {
                    warn!(relationship = %id, owner = %owner_id, "derived metadata references a missing relationship");
                    report.relationships_missing += 1;
                }
            }
        }

        owner.clear_modified();
        owner.touch();
        debug!(owner = %owner_id, ?report, "renumbered metadata");
        Ok(report)
    }
}
