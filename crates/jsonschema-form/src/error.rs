use miette::Diagnostic;
use thiserror::Error;

use crate::node::REF_DEPTH_LIMIT;
use crate::path::{Keyword, SchemaPath};

/// A local `$ref` that could not be followed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefError {
    #[error("cannot resolve `{0}` (only local `#/...` references are supported)")]
    Unresolved(String),

    #[error("reference chain is longer than {} hops", REF_DEPTH_LIMIT)]
    TooDeep,
}

/// Errors raised while preparing a schema for a form renderer.
#[derive(Debug, Error, Diagnostic)]
pub enum PreprocessError {
    #[error("every branch of `{keyword}` at `{path}` is deprecated")]
    #[diagnostic(
        code(jsonschema_form::all_branches_deprecated),
        help("keep one branch without `deprecated: true`, or give the node an explicit `type`")
    )]
    AllBranchesDeprecated { path: SchemaPath, keyword: Keyword },

    #[error("invalid reference at `{path}`")]
    #[diagnostic(code(jsonschema_form::reference))]
    Reference {
        path: SchemaPath,
        #[source]
        source: RefError,
    },
}

/// Errors raised while mapping form data back to the original value shape.
///
/// Paths are JSON pointers into the form data.
#[derive(Debug, Error, Diagnostic)]
pub enum RestoreError {
    #[error("map entry at `{path}` is not an object")]
    #[diagnostic(code(jsonschema_form::malformed_entry))]
    MalformedEntry { path: String },

    #[error("map entry at `{path}` has no string `transformedPropertyKey`")]
    #[diagnostic(
        code(jsonschema_form::invalid_entry_key),
        help("every entry of a map-derived array needs a key")
    )]
    InvalidEntryKey { path: String },

    #[error("invalid reference while restoring `{path}`")]
    #[diagnostic(code(jsonschema_form::reference))]
    Reference {
        path: String,
        #[source]
        source: RefError,
    },
}
