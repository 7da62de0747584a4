//! Validate command handler

use crate::cli::ValidateArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::{DocumentReport, OutputWriter};
use tokenschema_core::schema::load_document;
use tokenschema_core::Validator;
use tracing::{debug, info, instrument, warn};

/// Handle the validate command
#[instrument(skip(config, output), fields(schema = %args.schema.display(), documents = args.documents.len()))]
pub fn handle_validate(args: ValidateArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    if args.regex_timeout_ms == Some(0) {
        return Err(Error::invalid_args("--regex-timeout-ms must be greater than zero"));
    }

    let schema = super::load_schema(&args.schema)?;
    output.info(&format!(
        "Validating {} document(s) against {}",
        args.documents.len(),
        args.schema.display()
    ))?;

    let mut validation = config.validation.clone();
    validation.apply_args(&args);
    debug!(settings = ?validation, "validator settings");

    let mut validator = Validator::new(validation.to_settings().with_schema(schema));
    validator.collect_errors();

    let mut reports = Vec::with_capacity(args.documents.len());
    for path in &args.documents {
        let _timer = Timer::with_details("document_validation", &path.display().to_string());
        if !path.exists() {
            return Err(Error::FileNotFound { path: path.clone() });
        }
        let document = load_document(path)?;

        if let Err(e) = validator.validate_value(&document) {
            validator.reset();
            return Err(e.into());
        }
        let errors = validator.take_errors();
        if errors.is_empty() {
            info!(document = %path.display(), "document is valid");
        } else {
            warn!(document = %path.display(), errors = errors.len(), "document failed validation");
        }
        reports.push(DocumentReport::new(path.display().to_string(), errors));
    }

    output.reports(&reports)?;

    let invalid = reports.iter().filter(|report| !report.valid).count();
    if invalid > 0 {
        return Err(Error::ValidationFailed {
            invalid,
            total: reports.len(),
        });
    }
    Ok(())
}
