//! move command - Move a value within a field
//!
//! Moves the value at `--from` to `--to` within exactly one field, then
//! runs the update pass so relationship places follow.

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::authority::NoResolver;
use crate::core::types::FieldName;
use crate::engine::MetadataService;

use super::renumber::renumber_loaded;
use super::{emit, load_owner};

/// Run the move command.
pub fn move_value(
    ctx: &Context,
    file: &Path,
    field: &str,
    from: usize,
    to: usize,
    write: bool,
) -> Result<()> {
    let field = FieldName::parse(field).with_context(|| format!("invalid field '{field}'"))?;
    let mut loaded = load_owner(ctx, file)?;

    {
        let service = MetadataService::new(&loaded.registry, &loaded.policy, &NoResolver)
            .with_config(&ctx.config);
        service
            .move_metadata(&mut loaded.owner, &field, from, to)
            .with_context(|| format!("cannot move {field} value {from} to {to}"))?;
    }

    let report = renumber_loaded(ctx, &mut loaded)?;
    eprintln!("{}", serde_json::to_string(&report)?);
    emit(file, write, &loaded)
}
