use anyhow::{Context, Result};

use crate::{FormDataArgs, document};

/// Run the `form-data` command: reshape existing values so a form generated
/// from the preprocessed schema can be prefilled with them.
pub fn run(args: &FormDataArgs) -> Result<()> {
    let schema = document::read(&args.schema)?;
    let values = document::read(&args.values)?;
    let form = jsonschema_form::to_form_value(&values, &schema, &schema)
        .with_context(|| format!("failed to reshape {}", args.values.display()))?;
    document::write(&form, args.output.as_deref())
}
