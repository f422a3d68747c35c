//! renumber command - Renumber places and sync relationships
//!
//! Marks the owner's metadata modified and runs the engine's update pass,
//! so places come out contiguous per field and relationship places follow
//! their derived records. The report goes to stderr.

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::authority::NoResolver;
use crate::engine::{MetadataService, RenumberReport};

use super::{emit, load_owner, Loaded};

/// Run the update pass on a loaded owner.
pub(crate) fn renumber_loaded(ctx: &Context, loaded: &mut Loaded) -> Result<RenumberReport> {
    let service = MetadataService::new(&loaded.registry, &loaded.policy, &NoResolver)
        .with_config(&ctx.config);
    loaded.owner.mark_metadata_modified();
    service
        .update(&mut loaded.owner, &mut loaded.store)
        .context("failed to renumber metadata")
}

/// Run the renumber command.
pub fn renumber(ctx: &Context, file: &Path, write: bool) -> Result<()> {
    let mut loaded = load_owner(ctx, file)?;
    let report = renumber_loaded(ctx, &mut loaded)?;
    eprintln!("{}", serde_json::to_string(&report)?);
    emit(file, write, &loaded)
}
