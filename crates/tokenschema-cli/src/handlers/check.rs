//! Check command handler

use crate::cli::CheckArgs;
use crate::error::Result;
use crate::output::{OutputWriter, SchemaSummary};
use std::collections::BTreeSet;
use tracing::instrument;

/// Handle the check command
#[instrument(skip(output), fields(schema = %args.schema.display()))]
pub fn handle_check(args: CheckArgs, output: &mut OutputWriter) -> Result<()> {
    let schema = super::load_schema(&args.schema)?;

    let known = schema.known_schemas();
    known.ensure(&schema);

    let extension_keywords: BTreeSet<String> = schema
        .iter()
        .flat_map(|(_, node)| node.extensions.keys().cloned())
        .collect();

    output.summary(&SchemaSummary {
        schema: args.schema.display().to_string(),
        nodes: schema.len(),
        identified_schemas: known.len(),
        tracks_unevaluated: schema.tracks_evaluation(),
        extension_keywords: extension_keywords.into_iter().collect(),
    })
}
