//! cli::document
//!
//! JSON owner documents read and written by the CLI.
//!
//! A document holds one owner, its metadata records (stored and derived)
//! and the relationships its derived records point at. Records are kept in
//! document order; `place` is taken as written.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::authority::Confidence;
use crate::core::owner::Owner;
use crate::core::record::{virtual_authority, MetadataRecord, RecordOrigin, VirtualLink};
use crate::core::registry::InMemoryFieldRegistry;
use crate::core::relationship::{InMemoryRelationshipStore, Relationship};
use crate::core::types::{FieldName, OwnerId, OwnerKind, RelationshipId};

/// An owner with its metadata and relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OwnerDocument {
    pub id: OwnerId,
    pub kind: OwnerKind,
    #[serde(default)]
    pub collection: Option<OwnerId>,
    #[serde(default)]
    pub metadata: Vec<RecordEntry>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

/// One metadata record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordEntry {
    pub field: FieldName,
    pub value: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub place: u32,
    #[serde(default)]
    pub authority: Option<String>,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub security_level: Option<i32>,
    /// Present on relationship-derived records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<LinkEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkEntry {
    pub id: RelationshipId,
    #[serde(default)]
    pub used_for_place: bool,
}

impl OwnerDocument {
    /// Read a document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read owner document '{}'", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse owner document '{}'", path.display()))
    }

    /// Write the document atomically (temp file, then rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_json()?;
        let temp_path = path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("failed to create '{}'", temp_path.display()))?;
        file.write_all(contents.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.sync_all())
            .with_context(|| format!("failed to write '{}'", temp_path.display()))?;

        fs::rename(&temp_path, path)
            .with_context(|| format!("failed to replace '{}'", path.display()))?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize owner document")
    }

    /// Build the in-memory owner and relationship store.
    ///
    /// Fields missing from `registry` are registered on the fly. The owner
    /// comes back clean (not modified).
    pub fn into_parts(
        self,
        registry: &mut InMemoryFieldRegistry,
    ) -> Result<(Owner, InMemoryRelationshipStore)> {
        let mut owner = Owner::with_id(self.id, self.kind);
        if let Some(collection) = self.collection {
            owner = owner.in_collection(collection);
        }

        for entry in self.metadata {
            let field = registry.ensure(&entry.field);
            let mut record = match entry.relationship {
                Some(link) => {
                    check_derived_entry(&entry, link)?;
                    MetadataRecord::derived(
                        owner.id(),
                        field,
                        VirtualLink {
                            relationship_id: link.id,
                            used_for_place: link.used_for_place,
                        },
                        &entry.value,
                        entry.place,
                    )
                }
                None => {
                    let mut record = MetadataRecord::stored(owner.id(), field);
                    record.value = entry.value;
                    record.set_place(entry.place);
                    record.authority = entry.authority.filter(|a| !a.is_empty());
                    record.confidence = entry.confidence;
                    record
                }
            };
            record.set_language(entry.language.as_deref());
            record.security_level = entry.security_level;
            owner.push_record(record);
        }

        let mut store = InMemoryRelationshipStore::new();
        for relationship in self.relationships {
            let id = relationship.id;
            store
                .insert(relationship)
                .with_context(|| format!("relationship {id} appears twice"))?;
        }

        Ok((owner, store))
    }

    /// Capture an owner and its relationships.
    pub fn from_parts(owner: &Owner, store: &InMemoryRelationshipStore) -> Self {
        let metadata = owner
            .records()
            .iter()
            .map(|record| RecordEntry {
                field: record.field().name().clone(),
                value: record.value().to_string(),
                language: record.language().map(str::to_string),
                place: record.place(),
                authority: record.authority().map(str::to_string),
                confidence: record.confidence(),
                security_level: record.security_level(),
                relationship: match record.origin() {
                    RecordOrigin::Stored => None,
                    RecordOrigin::Relationship(link) => Some(LinkEntry {
                        id: link.relationship_id,
                        used_for_place: link.used_for_place,
                    }),
                },
            })
            .collect();

        Self {
            id: owner.id(),
            kind: owner.kind(),
            collection: owner.collection(),
            metadata,
            relationships: store.iter().cloned().collect(),
        }
    }
}

/// A derived entry's authority and confidence are fixed by its link.
///
/// A conflicting authority is an error; a confidence other than ACCEPTED
/// is ignored with a warning.
fn check_derived_entry(entry: &RecordEntry, link: LinkEntry) -> Result<()> {
    let expected = virtual_authority(link.id);
    if let Some(authority) = entry.authority.as_deref().filter(|a| !a.is_empty()) {
        if authority != expected {
            bail!(
                "{} value '{}' is derived from relationship {} but carries authority '{}' (expected '{}')",
                entry.field,
                entry.value,
                link.id,
                authority,
                expected
            );
        }
    }
    if !matches!(entry.confidence, Confidence::Unset | Confidence::Accepted) {
        warn!(
            field = %entry.field,
            relationship = %link.id,
            confidence = %entry.confidence,
            "ignoring confidence on derived value"
        );
    }
    Ok(())
}
