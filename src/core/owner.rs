//! core::owner
//!
//! The aggregate root: one repository object and its metadata record set.
//!
//! # Dirty Tracking
//!
//! Mutations mark the owner "metadata modified". The renumbering pass runs
//! only for modified owners and clears the flag afterwards. The touched
//! field names are collected in [`Owner::details`] for downstream
//! consumers such as change auditing.

use crate::core::record::MetadataRecord;
use crate::core::types::{OwnerId, OwnerKind, RecordId, UtcTimestamp};

/// A repository object holding metadata.
#[derive(Debug, Clone)]
pub struct Owner {
    id: OwnerId,
    kind: OwnerKind,
    collection: Option<OwnerId>,
    records: Vec<MetadataRecord>,
    metadata_modified: bool,
    modified: bool,
    details: Vec<String>,
    last_modified: UtcTimestamp,
}

impl Owner {
    /// Create an empty owner with a fresh id.
    pub fn new(kind: OwnerKind) -> Self {
        Self::with_id(OwnerId::generate(), kind)
    }

    /// Create an empty owner with a known id.
    pub fn with_id(id: OwnerId, kind: OwnerKind) -> Self {
        Self {
            id,
            kind,
            collection: None,
            records: Vec::new(),
            metadata_modified: false,
            modified: false,
            details: Vec::new(),
            last_modified: UtcTimestamp::now(),
        }
    }

    /// Set the owning collection used as authority context.
    pub fn in_collection(mut self, collection: OwnerId) -> Self {
        self.collection = Some(collection);
        self
    }

    pub fn id(&self) -> OwnerId {
        self.id
    }

    pub fn kind(&self) -> OwnerKind {
        self.kind
    }

    pub fn collection(&self) -> Option<OwnerId> {
        self.collection
    }

    /// All records in storage order (not place order).
    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }

    pub fn record(&self, id: RecordId) -> Option<&MetadataRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<MetadataRecord> {
        &mut self.records
    }

    pub(crate) fn record_mut(&mut self, id: RecordId) -> Option<&mut MetadataRecord> {
        self.records.iter_mut().find(|r| r.id() == id)
    }

    pub(crate) fn push_record(&mut self, record: MetadataRecord) {
        self.records.push(record);
    }

    pub fn mark_metadata_modified(&mut self) {
        self.metadata_modified = true;
        self.modified = true;
    }

    pub fn is_metadata_modified(&self) -> bool {
        self.metadata_modified
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Reset both dirty flags.
    pub fn clear_modified(&mut self) {
        self.metadata_modified = false;
        self.modified = false;
    }

    /// Record that a field was touched.
    pub fn add_details(&mut self, detail: impl Into<String>) {
        self.details.push(detail.into());
    }

    pub fn details(&self) -> &[String] {
        &self.details
    }

    /// Drain the collected details.
    pub fn take_details(&mut self) -> Vec<String> {
        std::mem::take(&mut self.details)
    }

    pub fn last_modified(&self) -> &UtcTimestamp {
        &self.last_modified
    }

    pub(crate) fn touch(&mut self) {
        self.last_modified = UtcTimestamp::now();
    }
}
