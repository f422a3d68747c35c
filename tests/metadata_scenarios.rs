//! End-to-end scenarios for the metadata service.
//!
//! Each test drives a fresh owner through the public engine API: adds,
//! reads, reordering, renumbering and relationship-derived values.

use repometa::core::authority::{
    Confidence, ConfiguredAuthorityPolicy, NoResolver, Uncontrolled, VocabularyResolver,
};
use repometa::core::owner::Owner;
use repometa::core::record::PLACEHOLDER_PARENT_METADATA_VALUE;
use repometa::core::registry::InMemoryFieldRegistry;
use repometa::core::relationship::{InMemoryRelationshipStore, Relationship};
use repometa::core::types::{FieldName, OwnerId, OwnerKind, RelationshipId};
use repometa::engine::{EngineError, InvalidArgument, MetadataService, ValueBatch};

// =============================================================================
// Fixtures
// =============================================================================

fn registry() -> InMemoryFieldRegistry {
    let mut registry = InMemoryFieldRegistry::new();
    for (schema, element, qualifier) in [
        ("dc", "title", None),
        ("dc", "subject", None),
        ("dc", "contributor", Some("author")),
        ("dc", "description", Some("abstract")),
        ("relation", "isAuthorOfPublication", None),
    ] {
        registry.register(schema, element, qualifier).unwrap();
    }
    registry
}

fn field(name: &str) -> FieldName {
    FieldName::parse(name).unwrap()
}

fn values_of(service: &MetadataService<'_>, owner: &Owner, name: &str) -> Vec<(String, u32)> {
    let f = field(name);
    service
        .get_metadata(owner, f.schema(), f.element(), f.qualifier(), Some("*"))
        .iter()
        .map(|r| (r.value().to_string(), r.place()))
        .collect()
}

fn places_of(owner: &Owner, name: &str) -> Vec<u32> {
    let f = field(name);
    let mut places: Vec<u32> = owner
        .records()
        .iter()
        .filter(|r| r.field().name() == &f)
        .map(|r| r.place())
        .collect();
    places.sort_unstable();
    places
}

// =============================================================================
// Contiguity
// =============================================================================

#[test]
fn places_contiguous_after_removals() {
    let registry = registry();
    let service = MetadataService::new(&registry, &Uncontrolled, &NoResolver);
    let mut store = InMemoryRelationshipStore::new();
    let mut item = Owner::new(OwnerKind::Item);

    let ids = service
        .add_metadata(&mut item, &field("dc.subject"), None, ValueBatch::new(["a", "b", "c", "d", "e"]))
        .unwrap();
    service
        .add_metadata(&mut item, &field("dc.title"), Some("en"), ValueBatch::new(["T"]))
        .unwrap();
    service.remove_values(&mut item, &[ids[0], ids[3]]);
    service.update(&mut item, &mut store).unwrap();

    assert_eq!(places_of(&item, "dc.subject"), vec![0, 1, 2]);
    assert_eq!(places_of(&item, "dc.title"), vec![0]);
    assert_eq!(
        values_of(&service, &item, "dc.subject"),
        vec![("b".to_string(), 0), ("c".to_string(), 1), ("e".to_string(), 2)]
    );
}

// =============================================================================
// Add then read
// =============================================================================

#[test]
fn add_then_read_keeps_order() {
    let registry = registry();
    let service = MetadataService::new(&registry, &Uncontrolled, &NoResolver);
    let mut item = Owner::new(OwnerKind::Item);

    service
        .add_metadata(&mut item, &field("dc.subject"), Some("en"), ValueBatch::new(["v1", "v2", "v3"]))
        .unwrap();

    let read: Vec<&str> = service
        .get_metadata(&item, "dc", "subject", None, Some("en"))
        .iter()
        .map(|r| r.value())
        .collect();
    assert_eq!(read, vec!["v1", "v2", "v3"]);
    assert_eq!(
        service.get_first_value(&item, "dc", "subject", None, Some("en")),
        Some("v1")
    );
}

// =============================================================================
// Moves
// =============================================================================

#[test]
fn move_is_a_permutation() {
    let registry = registry();
    let service = MetadataService::new(&registry, &Uncontrolled, &NoResolver);
    let mut item = Owner::new(OwnerKind::Item);
    let subject = field("dc.subject");
    service
        .add_metadata(&mut item, &subject, None, ValueBatch::new(["A", "B", "C", "D"]))
        .unwrap();

    service.move_metadata(&mut item, &subject, 1, 3).unwrap();
    let labels: Vec<String> = values_of(&service, &item, "dc.subject").into_iter().map(|(v, _)| v).collect();
    assert_eq!(labels, vec!["A", "C", "D", "B"]);

    service.move_metadata(&mut item, &subject, 3, 1).unwrap();
    let labels: Vec<String> = values_of(&service, &item, "dc.subject").into_iter().map(|(v, _)| v).collect();
    assert_eq!(labels, vec!["A", "B", "C", "D"]);
}

// =============================================================================
// Authority control
// =============================================================================

#[test]
fn required_authority_enforced_except_placeholder() {
    let registry = registry();
    let mut policy = ConfiguredAuthorityPolicy::new();
    policy.control("dc_contributor_author", true, false);
    let service = MetadataService::new(&registry, &policy, &NoResolver);
    let mut item = Owner::new(OwnerKind::Item);
    let author = field("dc.contributor.author");

    let err = service
        .add_metadata(&mut item, &author, None, ValueBatch::new(["Smith, J."]))
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidArgument(InvalidArgument::AuthorityRequired { .. })
    ));
    assert!(item.records().is_empty());

    let ids = service
        .add_metadata(&mut item, &author, None, ValueBatch::new([PLACEHOLDER_PARENT_METADATA_VALUE]))
        .unwrap();
    assert_eq!(item.record(ids[0]).unwrap().authority(), None);
}

#[test]
fn authority_on_uncontrolled_field_rejected() {
    let registry = registry();
    let service = MetadataService::new(&registry, &Uncontrolled, &NoResolver);
    let mut item = Owner::new(OwnerKind::Item);

    let err = service
        .add_metadata(
            &mut item,
            &field("dc.subject"),
            None,
            ValueBatch::single("Physics", Some("lcsh:123"), Confidence::Accepted),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidArgument(InvalidArgument::AuthorityNotAllowed { .. })
    ));
}

#[test]
fn resolver_fills_authorities_for_items() {
    let registry = registry();
    let mut policy = ConfiguredAuthorityPolicy::new();
    policy.control("dc_subject", false, true);
    let mut resolver = VocabularyResolver::new();
    resolver.insert("dc_subject", "Physics", "lcsh:sh85101653");
    let service = MetadataService::new(&registry, &policy, &resolver);

    let mut item = Owner::new(OwnerKind::Item);
    let ids = service
        .add_metadata(&mut item, &field("dc.subject"), None, ValueBatch::new(["Physics"]))
        .unwrap();
    let record = item.record(ids[0]).unwrap();
    assert_eq!(record.authority(), Some("lcsh:sh85101653"));
    assert_eq!(record.confidence(), Confidence::Accepted);

    let mut collection = Owner::new(OwnerKind::Collection);
    let ids = service
        .add_metadata(&mut collection, &field("dc.subject"), None, ValueBatch::new(["Physics"]))
        .unwrap();
    assert_eq!(collection.record(ids[0]).unwrap().authority(), None);
}

// =============================================================================
// Language fallback
// =============================================================================

#[test]
fn language_fallback_chain() {
    let registry = registry();
    let service = MetadataService::new(&registry, &Uncontrolled, &NoResolver)
        .with_locales("en", vec!["en".into(), "fr".into(), "de".into()]);
    let mut item = Owner::new(OwnerKind::Item);
    let title = field("dc.title");
    service
        .add_metadata(&mut item, &title, Some("en"), ValueBatch::new(["Colour"]))
        .unwrap();
    service
        .add_metadata(&mut item, &title, Some("fr"), ValueBatch::new(["Couleur"]))
        .unwrap();

    let regional: Vec<&str> = service
        .get_metadata(&item, "dc", "title", None, Some("en_US"))
        .iter()
        .map(|r| r.value())
        .collect();
    assert_eq!(regional, vec!["Colour"]);

    // First supported language with values wins over an unsupported tag.
    let unsupported: Vec<&str> = service
        .get_metadata(&item, "dc", "title", None, Some("es"))
        .iter()
        .map(|r| r.value())
        .collect();
    assert_eq!(unsupported, vec!["Colour"]);
}

#[test]
fn language_fallback_returns_everything_when_nothing_matches() {
    let registry = registry();
    let service = MetadataService::new(&registry, &Uncontrolled, &NoResolver)
        .with_locales("en", vec!["en".into(), "fr".into(), "de".into()]);
    let mut item = Owner::new(OwnerKind::Item);
    let title = field("dc.title");
    service
        .add_metadata(&mut item, &title, Some("la"), ValueBatch::new(["Color"]))
        .unwrap();
    service
        .add_metadata(&mut item, &title, Some("grc"), ValueBatch::new(["Chroma"]))
        .unwrap();

    assert_eq!(service.get_metadata(&item, "dc", "title", None, Some("es")).len(), 2);

    let literal: Vec<&str> = service
        .get_metadata(&item, "dc", "title", None, Some("la"))
        .iter()
        .map(|r| r.value())
        .collect();
    assert_eq!(literal, vec!["Color"]);
}

// =============================================================================
// Relationship-derived values
// =============================================================================

#[test]
fn derived_place_synced_to_relationship() {
    let registry = registry();
    let service = MetadataService::new(&registry, &Uncontrolled, &NoResolver);
    let mut publication = Owner::new(OwnerKind::Item);
    let person = OwnerId::generate();
    let author = field("dc.contributor.author");

    let mut rel = Relationship::new(RelationshipId::new(11), "isAuthorOfPublication", publication.id(), person);
    rel.left_place = 5;
    let mut store = InMemoryRelationshipStore::new();
    store.insert(rel.clone()).unwrap();

    service
        .add_metadata(&mut publication, &author, None, ValueBatch::new(["Stored, A."]))
        .unwrap();
    let derived = service
        .materialize_relationship(&mut publication, &author, &rel, "Derived, B.", true)
        .unwrap();

    publication.mark_metadata_modified();
    let report = service.update(&mut publication, &mut store).unwrap();

    let place = publication.record(derived).unwrap().place();
    assert_eq!(place, 1);
    assert_eq!(store.get(RelationshipId::new(11)).unwrap().left_place, place);
    assert_eq!(report.relationships_synced, 1);
}

#[test]
fn missing_relationship_reported() {
    let registry = registry();
    let service = MetadataService::new(&registry, &Uncontrolled, &NoResolver);
    let mut publication = Owner::new(OwnerKind::Item);
    let rel = Relationship::new(RelationshipId::new(3), "isAuthorOfPublication", publication.id(), OwnerId::generate());

    service
        .materialize_relationship(&mut publication, &field("dc.contributor.author"), &rel, "Gone", true)
        .unwrap();
    publication.mark_metadata_modified();

    let mut empty = InMemoryRelationshipStore::new();
    let report = service.update(&mut publication, &mut empty).unwrap();
    assert_eq!(report.relationships_missing, 1);
    assert_eq!(report.relationships_synced, 0);
}

#[test]
fn relation_schema_keeps_places() {
    let registry = registry();
    let service = MetadataService::new(&registry, &Uncontrolled, &NoResolver);
    let mut store = InMemoryRelationshipStore::new();
    let mut item = Owner::new(OwnerKind::Item);
    let relation = field("relation.isAuthorOfPublication");

    let ids = service
        .add_metadata(&mut item, &relation, None, ValueBatch::new(["r0", "r1"]))
        .unwrap();
    let subjects = service
        .add_metadata(&mut item, &field("dc.subject"), None, ValueBatch::new(["s0", "s1"]))
        .unwrap();
    service.remove_values(&mut item, &[ids[0], subjects[0]]);

    let report = service.update(&mut item, &mut store).unwrap();

    assert_eq!(item.record(ids[1]).unwrap().place(), 1);
    assert_eq!(item.record(subjects[1]).unwrap().place(), 0);
    assert_eq!(report.relation_skipped, 1);
}

// =============================================================================
// Authors with mixed authorities
// =============================================================================

#[test]
fn authors_renumbered_after_removal() {
    let registry = registry();
    let mut policy = ConfiguredAuthorityPolicy::new();
    policy.control("dc_contributor_author", false, false);
    let service = MetadataService::new(&registry, &policy, &NoResolver);
    let mut store = InMemoryRelationshipStore::new();
    let mut item = Owner::new(OwnerKind::Item);
    let author = field("dc.contributor.author");

    service
        .add_metadata(
            &mut item,
            &author,
            None,
            ValueBatch::new(["Red Smith", "Walter White", "John Smith"])
                .authorities([None, Some("p1"), Some("p2")])
                .confidences([Confidence::Unset, Confidence::Accepted, Confidence::Accepted]),
        )
        .unwrap();
    service.update(&mut item, &mut store).unwrap();

    let authors = service.get_metadata(&item, "dc", "contributor", Some("author"), None);
    let summary: Vec<(&str, u32, Option<&str>, Confidence)> = authors
        .iter()
        .map(|r| (r.value(), r.place(), r.authority(), r.confidence()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Red Smith", 0, None, Confidence::Unset),
            ("Walter White", 1, Some("p1"), Confidence::Accepted),
            ("John Smith", 2, Some("p2"), Confidence::Accepted),
        ]
    );

    let second = authors[1].id();
    service.remove_values(&mut item, &[second]);
    service.update(&mut item, &mut store).unwrap();

    assert_eq!(
        values_of(&service, &item, "dc.contributor.author"),
        vec![("Red Smith".to_string(), 0), ("John Smith".to_string(), 1)]
    );
    assert!(!item.is_metadata_modified());
}

#[test]
fn set_single_value_replaces_language() {
    let registry = registry();
    let service = MetadataService::new(&registry, &Uncontrolled, &NoResolver);
    let mut item = Owner::new(OwnerKind::Item);
    let title = field("dc.title");
    service
        .add_metadata(&mut item, &title, Some("en"), ValueBatch::new(["Old", "Older"]))
        .unwrap();
    service
        .add_metadata(&mut item, &title, Some("fr"), ValueBatch::new(["Ancien"]))
        .unwrap();

    service
        .set_single_value(&mut item, &title, Some("en"), "New")
        .unwrap();

    let english: Vec<&str> = service
        .get_metadata_with_authority(&item, "dc", "title", None, Some("en"), Some("*"))
        .iter()
        .map(|r| r.value())
        .collect();
    assert_eq!(english, vec!["New"]);
    assert_eq!(service.get_metadata_by_string(&item, "dc.title").len(), 2);
    assert_eq!(item.take_details().len(), 4);
}
