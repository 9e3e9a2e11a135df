use anyhow::{Context, Result};
use jsonschema_form::{CleanOptions, clean_payload, restore_form_data};

use super::Overrides;
use crate::{RestoreArgs, document};

/// Run the `restore` command: map submitted form data back to the shape of
/// the original schema.
pub fn run(args: &RestoreArgs) -> Result<()> {
    let config = jsonschema_form_config::load()?;
    let schema = document::read(&args.schema)?;
    let form = document::read(&args.values)?;

    // Defaults play no part in restoring, so skip that pass.
    let transformed = super::preprocess(
        &schema,
        &args.schema,
        &config,
        &Overrides {
            remove: &[],
            no_clean_defaults: true,
        },
    )?;
    let mut restored = restore_form_data(&form, &transformed)?;
    if args.clean {
        restored = clean_payload(&restored, &schema, &schema, &CleanOptions::default())
            .with_context(|| format!("failed to clean {}", args.values.display()))?;
    }
    document::write(&restored, args.output.as_deref())
}
