pub mod form_data;
pub mod preprocess;
pub mod restore;

use std::path::Path;

use anyhow::Result;
use jsonschema_form::{IdGenerator, PreprocessOptions, RandomIds, SequentialIds};
use jsonschema_form_config::{Config, IdStyle};
use serde_json::Value;

/// Extra settings given on the command line, applied on top of the config.
#[derive(Debug)]
pub struct Overrides<'a> {
    pub remove: &'a [String],
    pub no_clean_defaults: bool,
}

pub fn id_generator(config: &Config) -> Box<dyn IdGenerator> {
    match (config.id_style(), config.id_prefix.clone()) {
        (IdStyle::Sequential, Some(prefix)) => Box::new(SequentialIds::new(prefix)),
        (IdStyle::Sequential, None) => Box::new(SequentialIds::default()),
        (IdStyle::Random, Some(prefix)) => Box::new(RandomIds::new().with_prefix(prefix)),
        (IdStyle::Random, None) => Box::new(RandomIds::new()),
    }
}

pub fn preprocess_options(
    config: &Config,
    schema_path: &Path,
    cli: &Overrides<'_>,
) -> PreprocessOptions {
    let path = schema_path.to_string_lossy();
    let mut fields_to_remove = config.fields_to_remove_for(&path);
    for field in cli.remove {
        if !fields_to_remove.contains(field) {
            fields_to_remove.push(field.clone());
        }
    }
    PreprocessOptions {
        fields_to_remove,
        clean_implicit_defaults: !cli.no_clean_defaults
            && config.should_clean_implicit_defaults(&path),
    }
}

/// Preprocess the schema read from `schema_path` with the merged settings.
///
/// Preprocessing failures are returned unwrapped so they render as
/// diagnostics.
pub fn preprocess(
    schema: &Value,
    schema_path: &Path,
    config: &Config,
    cli: &Overrides<'_>,
) -> Result<Value> {
    let options = preprocess_options(config, schema_path, cli);
    tracing::debug!(
        remove = ?options.fields_to_remove,
        clean = options.clean_implicit_defaults,
        "preprocess options"
    );
    let mut ids = id_generator(config);
    Ok(jsonschema_form::preprocess_schema_with(
        schema,
        &options,
        ids.as_mut(),
    )?)
}
