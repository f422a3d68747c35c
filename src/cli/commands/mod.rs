//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the owner document and builds the engine from configuration
//! 2. Calls the engine
//! 3. Prints the result, or writes the document back with `--write`

mod move_cmd;
mod renumber;
mod show;

pub use move_cmd::move_value;
pub use renumber::renumber;
pub use show::show;

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::args::Command;
use crate::cli::document::OwnerDocument;
use crate::cli::Context;
use crate::core::authority::ConfiguredAuthorityPolicy;
use crate::core::owner::Owner;
use crate::core::registry::InMemoryFieldRegistry;
use crate::core::relationship::InMemoryRelationshipStore;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Show { file, field, lang } => {
            show(ctx, &file, field.as_deref(), lang.as_deref())
        }
        Command::Renumber { file, write } => renumber(ctx, &file, write),
        Command::Move {
            file,
            field,
            from,
            to,
            write,
        } => move_value(ctx, &file, &field, from, to, write),
    }
}

/// A loaded owner with the registry and store built around it.
pub(crate) struct Loaded {
    pub registry: InMemoryFieldRegistry,
    pub policy: ConfiguredAuthorityPolicy,
    pub owner: Owner,
    pub store: InMemoryRelationshipStore,
}

/// Read an owner document, registering its fields on top of the configured ones.
pub(crate) fn load_owner(ctx: &Context, path: &Path) -> Result<Loaded> {
    let mut registry = ctx
        .config
        .build_registry()
        .context("failed to build field registry")?;
    let (owner, store) = OwnerDocument::load(path)?.into_parts(&mut registry)?;
    Ok(Loaded {
        registry,
        policy: ctx.config.authority_policy(),
        owner,
        store,
    })
}

/// Print the document, or write it back to `path`.
pub(crate) fn emit(path: &Path, write: bool, loaded: &Loaded) -> Result<()> {
    let doc = OwnerDocument::from_parts(&loaded.owner, &loaded.store);
    if write {
        doc.save(path)?;
        tracing::info!(path = %path.display(), "owner document written");
    } else {
        println!("{}", doc.to_json()?);
    }
    Ok(())
}
