//! Configuration loading from disk.

use std::fs;

use tempfile::TempDir;

use repometa::core::authority::{AuthorityContext, AuthorityPolicy};
use repometa::core::config::{Config, ConfigError};
use repometa::core::registry::FieldRegistry;
use repometa::core::types::OwnerKind;

const FULL: &str = r#"
[i18n]
default_locale = "pt_BR"
supported_locales = ["pt_BR", "en", "fr"]

[[fields]]
name = "dc.title"

[[fields]]
name = "dc.contributor.author"
scope_note = "Person responsible"

[[authority]]
field = "dc.contributor.author"
required = true
choices = true
owner_kinds = ["item"]
"#;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn full_document_drives_collaborators() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, FULL);

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.loaded_from(), Some(path.as_path()));
    assert_eq!(config.default_locale(), "pt_BR");
    assert_eq!(config.supported_languages(), vec!["pt", "en", "fr"]);

    let registry = config.build_registry().unwrap();
    let author = registry.find_field("dc", "contributor", Some("author")).unwrap();
    assert_eq!(author.scope_note(), Some("Person responsible"));

    let policy = config.authority_policy();
    let on_item = AuthorityContext {
        field: &author,
        owner_kind: OwnerKind::Item,
        collection: None,
    };
    assert!(policy.is_authority_allowed(&on_item));
    assert!(policy.is_authority_required(&on_item));
    assert!(policy.is_choices_configured(&on_item));

    let on_collection = AuthorityContext {
        owner_kind: OwnerKind::Collection,
        ..on_item
    };
    assert!(!policy.is_authority_allowed(&on_collection));
}

#[test]
fn unknown_key_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[i18n]\ndefault_locale = \"en\"\ncolour = \"blue\"\n");

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn unregistered_authority_field_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[[authority]]\nfield = \"dc.subject\"\n");

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue(_)));
}

#[test]
fn unsupported_default_locale_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "[i18n]\ndefault_locale = \"de\"\nsupported_locales = [\"en\"]\n",
    );

    assert!(matches!(
        Config::load(Some(&path)),
        Err(ConfigError::InvalidValue(_))
    ));
}

#[test]
fn missing_explicit_file_is_error() {
    let dir = TempDir::new().unwrap();
    let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::ReadError { .. }));
}

#[test]
fn empty_file_means_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.default_locale(), "en");
    assert!(config.build_registry().unwrap().is_empty());
}
