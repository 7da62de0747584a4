//! Command handlers for CLI subcommands
//!
//! Copyright (c) 2025 Tokenschema Team
//! Licensed under the Apache-2.0 license

mod check;
mod validate;

pub use check::handle_check;
pub use validate::handle_validate;

use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use std::path::Path;
use std::sync::Arc;
use tokenschema_core::{SchemaLoader, SchemaRoot};

/// Load and compile a schema file
pub(crate) fn load_schema(path: &Path) -> Result<Arc<SchemaRoot>> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let _timer = Timer::with_details("schema_loading", &path.display().to_string());
    let root = SchemaLoader::new().load(path)?;
    tracing::info!(path = %path.display(), nodes = root.len(), "schema compiled");
    Ok(Arc::new(root))
}
