//! engine::query
//!
//! Read paths. Results are ordered by field registration and then by place;
//! records sharing a place keep their storage order.

use crate::core::matcher::{self, FieldSelector, LanguageSelector, QualifierSelector, Selector};
use crate::core::owner::Owner;
use crate::core::record::MetadataRecord;
use crate::core::registry::parse_field_path;
use crate::core::types::ANY;

use super::MetadataService;

impl MetadataService<'_> {
    /// Records matching `fields`, filtered by `language` with locale
    /// fallback.
    pub fn select<'o>(
        &self,
        owner: &'o Owner,
        fields: &FieldSelector,
        language: &LanguageSelector,
    ) -> Vec<&'o MetadataRecord> {
        let candidates: Vec<&MetadataRecord> = owner
            .records()
            .iter()
            .filter(|r| matcher::matches(fields, None, r))
            .collect();

        let mut records =
            matcher::filter_by_language(candidates, language, &self.supported_languages);
        records.sort_by_key(|r| (r.field().id(), r.place()));
        records
    }

    /// `getMetadata`: wildcard-aware field match plus language fallback.
    ///
    /// `qualifier` of `None` (or blank) selects unqualified fields only.
    /// `language` of `None` selects untagged records only, `Some("*")`
    /// every language.
    pub fn get_metadata<'o>(
        &self,
        owner: &'o Owner,
        schema: &str,
        element: &str,
        qualifier: Option<&str>,
        language: Option<&str>,
    ) -> Vec<&'o MetadataRecord> {
        self.select(
            owner,
            &FieldSelector::new(schema, element, qualifier),
            &LanguageSelector::new(language),
        )
    }

    /// [`get_metadata`](Self::get_metadata) keeping only records whose
    /// authority equals `authority`. `Some("*")` disables the filter;
    /// `None` keeps records without an authority.
    pub fn get_metadata_with_authority<'o>(
        &self,
        owner: &'o Owner,
        schema: &str,
        element: &str,
        qualifier: Option<&str>,
        language: Option<&str>,
        authority: Option<&str>,
    ) -> Vec<&'o MetadataRecord> {
        let records = self.get_metadata(owner, schema, element, qualifier, language);
        if authority == Some(ANY) {
            return records;
        }
        records
            .into_iter()
            .filter(|r| r.authority() == authority)
            .collect()
    }

    /// Records for a `schema.element[.qualifier]` string, in any language.
    ///
    /// A missing qualifier means unqualified, `*` means any qualifier.
    /// Single-word legacy names resolve through their aliases. A string
    /// without schema and element matches nothing.
    pub fn get_metadata_by_string<'o>(
        &self,
        owner: &'o Owner,
        metadata: &str,
    ) -> Vec<&'o MetadataRecord> {
        let path = parse_field_path(metadata);
        let (Some(schema), Some(element)) = (path.schema, path.element) else {
            return Vec::new();
        };
        let selector = FieldSelector {
            schema: Selector::new(&schema),
            element: Selector::new(&element),
            qualifier: QualifierSelector::new(path.qualifier.as_deref()),
        };
        self.select(owner, &selector, &LanguageSelector::Any)
    }

    /// Value of the first matching record.
    pub fn get_first_value<'o>(
        &self,
        owner: &'o Owner,
        schema: &str,
        element: &str,
        qualifier: Option<&str>,
        language: Option<&str>,
    ) -> Option<&'o str> {
        self.get_metadata(owner, schema, element, qualifier, language)
            .first()
            .map(|r| r.value())
    }
}
