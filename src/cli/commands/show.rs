//! show command - Print an owner's metadata
//!
//! One line per value, in field then place order:
//!
//! ```text
//! place<TAB>field<TAB>language<TAB>value[<TAB>authority/confidence]
//! ```
//!
//! Without `--field` every value is shown. Without `--lang` every language
//! is shown; with a tag the configured locale fallback applies.

use std::path::Path;

use anyhow::{bail, Result};

use crate::cli::Context;
use crate::core::authority::NoResolver;
use crate::core::matcher::{FieldSelector, LanguageSelector, QualifierSelector, Selector};
use crate::core::record::MetadataRecord;
use crate::core::registry::parse_field_path;
use crate::engine::MetadataService;

use super::load_owner;

/// Format one record as a `show` line.
pub(crate) fn format_line(record: &MetadataRecord) -> String {
    let mut line = format!(
        "{}\t{}\t{}\t{}",
        record.place(),
        record.field().name(),
        record.language().unwrap_or("-"),
        record.value()
    );
    if let Some(authority) = record.authority() {
        line.push_str(&format!("\t{}/{}", authority, record.confidence()));
    }
    line
}

fn field_selector(path: Option<&str>) -> Result<FieldSelector> {
    let Some(path) = path else {
        return Ok(FieldSelector::all());
    };
    let parsed = parse_field_path(path);
    let (Some(schema), Some(element)) = (parsed.schema, parsed.element) else {
        bail!("'{path}' is not a field path; expected schema.element[.qualifier]");
    };
    Ok(FieldSelector {
        schema: Selector::new(&schema),
        element: Selector::new(&element),
        qualifier: QualifierSelector::new(parsed.qualifier.as_deref()),
    })
}

/// Run the show command.
pub fn show(ctx: &Context, file: &Path, field: Option<&str>, lang: Option<&str>) -> Result<()> {
    let loaded = load_owner(ctx, file)?;
    let service = MetadataService::new(&loaded.registry, &loaded.policy, &NoResolver)
        .with_config(&ctx.config);

    let fields = field_selector(field)?;
    let language = match lang {
        Some(tag) => LanguageSelector::new(Some(tag)),
        None => LanguageSelector::Any,
    };

    for record in service.select(&loaded.owner, &fields, &language) {
        println!("{}", format_line(record));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_rejected() {
        assert!(field_selector(Some("")).is_err());
    }

    #[test]
    fn qualifier_wildcard() {
        let selector = field_selector(Some("dc.contributor.*")).unwrap();
        assert!(selector.qualifier.matches(Some("author")));
        assert!(selector.qualifier.matches(None));
    }
}
