//! Property-based tests for the metadata engine.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated sequences of operations.

use proptest::prelude::*;

use repometa::core::authority::{NoResolver, Uncontrolled};
use repometa::core::owner::Owner;
use repometa::core::registry::InMemoryFieldRegistry;
use repometa::core::relationship::InMemoryRelationshipStore;
use repometa::core::types::{FieldName, OwnerKind};
use repometa::engine::{MetadataService, ValueBatch};

const FIELDS: [&str; 3] = ["dc.subject", "dc.title", "dc.contributor.author"];

fn registry() -> InMemoryFieldRegistry {
    let mut registry = InMemoryFieldRegistry::new();
    for name in FIELDS {
        registry.ensure(&FieldName::parse(name).unwrap());
    }
    registry
}

/// One engine operation on a randomly chosen field.
#[derive(Debug, Clone)]
enum Op {
    Add { field: usize, count: usize },
    Remove { field: usize, index: usize },
    Move { field: usize, from: usize, to: usize },
    Insert { field: usize, index: usize },
}

fn op() -> impl Strategy<Value = Op> {
    let field = 0..FIELDS.len();
    prop_oneof![
        (field.clone(), 1..4usize).prop_map(|(field, count)| Op::Add { field, count }),
        (field.clone(), 0..8usize).prop_map(|(field, index)| Op::Remove { field, index }),
        (field.clone(), 0..8usize, 0..8usize).prop_map(|(field, from, to)| Op::Move { field, from, to }),
        (field, 0..10usize).prop_map(|(field, index)| Op::Insert { field, index }),
    ]
}

fn ids_in_order(service: &MetadataService<'_>, owner: &Owner, name: &FieldName) -> Vec<repometa::core::types::RecordId> {
    service
        .get_metadata(owner, name.schema(), name.element(), name.qualifier(), Some("*"))
        .iter()
        .map(|r| r.id())
        .collect()
}

fn apply(service: &MetadataService<'_>, owner: &mut Owner, op: &Op) {
    match *op {
        Op::Add { field, count } => {
            let name = FieldName::parse(FIELDS[field]).unwrap();
            let values: Vec<String> = (0..count).map(|i| format!("v{i}")).collect();
            service.add_metadata(owner, &name, None, ValueBatch::new(values)).unwrap();
        }
        Op::Remove { field, index } => {
            let name = FieldName::parse(FIELDS[field]).unwrap();
            let ids = ids_in_order(service, owner, &name);
            if let Some(id) = ids.get(index) {
                service.remove_values(owner, &[*id]);
            }
        }
        Op::Move { field, from, to } => {
            let name = FieldName::parse(FIELDS[field]).unwrap();
            // Errors (no-op or out of range) leave the owner untouched.
            let _ = service.move_metadata(owner, &name, from, to);
        }
        Op::Insert { field, index } => {
            let name = FieldName::parse(FIELDS[field]).unwrap();
            service
                .insert_and_shift_right(owner, &name, None, ValueBatch::new(["ins"]), index)
                .unwrap();
        }
    }
}

proptest! {
    /// After any sequence of operations and an update, every field's
    /// places are exactly 0..n-1.
    #[test]
    fn places_contiguous_after_update(ops in prop::collection::vec(op(), 1..30)) {
        let registry = registry();
        let service = MetadataService::new(&registry, &Uncontrolled, &NoResolver);
        let mut store = InMemoryRelationshipStore::new();
        let mut owner = Owner::new(OwnerKind::Item);

        for op in &ops {
            apply(&service, &mut owner, op);
        }
        owner.mark_metadata_modified();
        service.update(&mut owner, &mut store).unwrap();

        for name in FIELDS {
            let name = FieldName::parse(name).unwrap();
            let mut places: Vec<u32> = owner
                .records()
                .iter()
                .filter(|r| r.field().name() == &name)
                .map(|r| r.place())
                .collect();
            places.sort_unstable();
            let expected: Vec<u32> = (0..places.len() as u32).collect();
            prop_assert_eq!(places, expected);
        }
        prop_assert!(!owner.is_metadata_modified());
    }

    /// Moving a value and moving it back restores the original order.
    #[test]
    fn move_round_trip(len in 2..10usize, from in 0..10usize, to in 0..10usize) {
        prop_assume!(from < len && to < len && from != to);

        let registry = registry();
        let service = MetadataService::new(&registry, &Uncontrolled, &NoResolver);
        let mut owner = Owner::new(OwnerKind::Item);
        let subject = FieldName::parse("dc.subject").unwrap();
        let values: Vec<String> = (0..len).map(|i| format!("s{i}")).collect();
        service.add_metadata(&mut owner, &subject, None, ValueBatch::new(values)).unwrap();
        let before = ids_in_order(&service, &owner, &subject);

        service.move_metadata(&mut owner, &subject, from, to).unwrap();
        let moved = ids_in_order(&service, &owner, &subject);
        prop_assert_eq!(moved[to], before[from]);
        prop_assert_eq!(moved.len(), before.len());

        service.move_metadata(&mut owner, &subject, to, from).unwrap();
        prop_assert_eq!(ids_in_order(&service, &owner, &subject), before);
    }

    /// Values come back in insertion order.
    #[test]
    fn add_then_read_in_order(values in prop::collection::vec("[A-Za-z][A-Za-z ]{0,12}[A-Za-z]", 1..12)) {
        let registry = registry();
        let service = MetadataService::new(&registry, &Uncontrolled, &NoResolver);
        let mut owner = Owner::new(OwnerKind::Item);

        service
            .add_metadata(&mut owner, &FieldName::parse("dc.title").unwrap(), None, ValueBatch::new(values.clone()))
            .unwrap();
        let read: Vec<String> = service
            .get_metadata(&owner, "dc", "title", None, None)
            .iter()
            .map(|r| r.value().to_string())
            .collect();
        prop_assert_eq!(read, values);
    }
}
