#![doc = include_str!("../README.md")]

use std::path::{Path, PathBuf};

use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

const CONFIG_FILENAME: &str = "jsonschema-form.toml";

fn example_remove() -> Vec<String> {
    vec![
        "properties.internal".into(),
        "properties.cluster.properties.legacyNetworking".into(),
    ]
}

fn example_file_glob() -> Vec<String> {
    vec!["charts/**/values.schema.json".into()]
}

fn example_file_exact() -> Vec<String> {
    vec!["schemas/cluster.json".into()]
}

/// How names for synthesized `$defs` entries are generated.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum IdStyle {
    /// Prefix followed by a counter: `mapEntry1`, `mapEntry2`, ...
    #[default]
    Sequential,
    /// Random alphanumeric names. Output differs between runs.
    Random,
}

/// Conditional settings applied to schema files matching path globs.
///
/// In TOML, override blocks are written as `[[override]]`. Earlier entries
/// (from child configs) take priority over later entries (from parent
/// configs).
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(title = "Override Rule")]
pub struct Override {
    /// Glob patterns matched against schema file paths (relative to the
    /// working directory).
    #[schemars(
        title = "File Patterns",
        example = example_file_exact(),
        example = example_file_glob(),
    )]
    #[serde(default)]
    pub files: Vec<String>,

    /// Additional dotted paths to remove from matching schemas. These are
    /// applied on top of the top-level `remove` list.
    #[schemars(title = "Remove Paths", example = example_remove())]
    #[serde(default)]
    pub remove: Vec<String>,

    /// Enable or disable the implicit-defaults pass for matching files.
    ///
    /// When omitted, this override does not affect the setting and the next
    /// matching override (or the top-level value) applies.
    #[schemars(title = "Clean Implicit Defaults")]
    #[serde(default, rename = "clean-implicit-defaults")]
    pub clean_implicit_defaults: Option<bool>,
}

/// Configuration file for the jsonschema-form schema preprocessor.
///
/// The loader walks up the directory tree looking for
/// `jsonschema-form.toml` files and merges them together. Settings in child
/// directories take priority over parent directories. Set `root = true` to
/// stop the upward search.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(title = "jsonschema-form.toml")]
pub struct Config {
    /// Mark this configuration file as the project root.
    ///
    /// When `true`, no `jsonschema-form.toml` files from parent directories
    /// are merged.
    #[serde(default)]
    pub root: bool,

    /// Dotted paths removed from every schema before any other pass runs.
    ///
    /// Segments are separated by `.`; numeric segments index into arrays.
    /// Paths from child configs come first, followed by parent paths
    /// (duplicates are removed).
    #[schemars(title = "Remove Paths", example = example_remove())]
    #[serde(default)]
    pub remove: Vec<String>,

    /// Strip object and array defaults down to what their children's
    /// defaults do not already imply. Defaults to `true`.
    #[schemars(title = "Clean Implicit Defaults")]
    #[serde(default, rename = "clean-implicit-defaults")]
    pub clean_implicit_defaults: Option<bool>,

    /// Compile every preprocessed schema with a JSON Schema validator and
    /// fail when it is not a valid schema. Defaults to `false`.
    #[schemars(title = "Validate Output")]
    #[serde(default, rename = "validate-output")]
    pub validate_output: Option<bool>,

    /// Naming scheme for synthesized map-entry definitions. Defaults to
    /// `sequential`.
    #[schemars(title = "Definition Naming")]
    #[serde(default, rename = "id-style")]
    pub id_style: Option<IdStyle>,

    /// Prefix for sequentially named definitions. Defaults to `mapEntry`.
    #[schemars(title = "Definition Prefix")]
    #[serde(default, rename = "id-prefix")]
    pub id_prefix: Option<String>,

    /// Per-file override rules.
    ///
    /// In TOML, each override is written as a `[[override]]` block. Child
    /// config overrides come before parent config overrides after merging.
    #[serde(default, rename = "override")]
    pub overrides: Vec<Override>,
}

impl Config {
    /// Merge a parent config into this one. Child values take priority:
    /// - `remove`: parent entries are appended (deduped)
    /// - scalar settings: the parent value is used only when the child leaves
    ///   it unset
    /// - `override`: parent blocks are appended after the child's
    /// - `root` is not inherited
    fn merge_parent(&mut self, parent: Config) {
        for path in parent.remove {
            if !self.remove.contains(&path) {
                self.remove.push(path);
            }
        }
        self.clean_implicit_defaults = self
            .clean_implicit_defaults
            .or(parent.clean_implicit_defaults);
        self.validate_output = self.validate_output.or(parent.validate_output);
        self.id_style = self.id_style.or(parent.id_style);
        if self.id_prefix.is_none() {
            self.id_prefix = parent.id_prefix;
        }
        self.overrides.extend(parent.overrides);
    }

    fn matching_overrides<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Override> {
        let path = path.strip_prefix("./").unwrap_or(path);
        self.overrides
            .iter()
            .filter(move |ov| ov.files.iter().any(|pat| glob_match::glob_match(pat, path)))
    }

    /// Every path to remove from the schema at `path`: the top-level list
    /// followed by the lists of all matching overrides, without duplicates.
    pub fn fields_to_remove_for(&self, path: &str) -> Vec<String> {
        let mut fields = self.remove.clone();
        for ov in self.matching_overrides(path) {
            for field in &ov.remove {
                if !fields.contains(field) {
                    fields.push(field.clone());
                }
            }
        }
        fields
    }

    /// Whether the implicit-defaults pass runs for the schema at `path`.
    ///
    /// The first matching override that sets a value wins, then the
    /// top-level setting, then `true`.
    pub fn should_clean_implicit_defaults(&self, path: &str) -> bool {
        self.matching_overrides(path)
            .find_map(|ov| ov.clean_implicit_defaults)
            .or(self.clean_implicit_defaults)
            .unwrap_or(true)
    }

    /// Whether preprocessed schemas are compiled as a check.
    pub fn should_validate_output(&self) -> bool {
        self.validate_output.unwrap_or(false)
    }

    pub fn id_style(&self) -> IdStyle {
        self.id_style.unwrap_or_default()
    }
}

/// Generate the JSON Schema for `jsonschema-form.toml` as a
/// `serde_json::Value`.
///
/// # Panics
///
/// Panics if the schema cannot be serialized to JSON (should never happen).
pub fn schema() -> Value {
    serde_json::to_value(schema_for!(Config)).expect("schema serialization cannot fail")
}

/// Find the nearest `jsonschema-form.toml` starting from `start_dir`,
/// walking upward.
pub fn find_config_path(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Search for `jsonschema-form.toml` files starting from `start_dir`,
/// walking up. Merges all configs found until one with `root = true` is hit
/// (inclusive). Returns `None` if no config file was found.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn find_and_load(start_dir: &Path) -> Result<Option<Config>, anyhow::Error> {
    let mut configs: Vec<Config> = Vec::new();
    let mut dir = start_dir.to_path_buf();

    loop {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.is_file() {
            let content = std::fs::read_to_string(&candidate)?;
            let cfg: Config = toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", candidate.display()))?;
            let is_root = cfg.root;
            configs.push(cfg);
            if is_root {
                break;
            }
        }
        if !dir.pop() {
            break;
        }
    }

    if configs.is_empty() {
        return Ok(None);
    }

    // configs[0] is the closest
    let mut merged = configs.remove(0);
    for parent in configs {
        merged.merge_parent(parent);
    }
    Ok(Some(merged))
}

/// Load config from the current working directory (walking upward).
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn load() -> Result<Config, anyhow::Error> {
    let cwd = std::env::current_dir()?;
    Ok(find_and_load(&cwd)?.unwrap_or_default())
}
