use anyhow::{Result, anyhow};
use serde_json::Value;

use super::Overrides;
use crate::{PreprocessArgs, document};

/// External `$ref`s resolve to `true` so only the schema's own structure is
/// checked, without network I/O.
struct NoopRetriever;

impl jsonschema::Retrieve for NoopRetriever {
    fn retrieve(
        &self,
        _uri: &jsonschema::Uri<String>,
    ) -> Result<Value, Box<dyn core::error::Error + Send + Sync>> {
        Ok(Value::Bool(true))
    }
}

/// Compile the schema to make sure form renderers can load it.
fn check_compiles(schema: &Value) -> Result<()> {
    jsonschema::options()
        .with_retriever(NoopRetriever)
        .build(schema)
        .map_err(|e| anyhow!("preprocessed schema does not compile: {e}"))?;
    Ok(())
}

/// Run the `preprocess` command: rewrite a schema for form renderers.
pub fn run(args: &PreprocessArgs) -> Result<()> {
    let config = jsonschema_form_config::load()?;
    let schema = document::read(&args.schema)?;
    let out = super::preprocess(
        &schema,
        &args.schema,
        &config,
        &Overrides {
            remove: &args.remove,
            no_clean_defaults: args.no_clean_defaults,
        },
    )?;
    if args.check || config.should_validate_output() {
        check_compiles(&out)?;
        tracing::info!("preprocessed schema compiles");
    }
    document::write(&out, args.output.as_deref())
}
