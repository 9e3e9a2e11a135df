#![doc = include_str!("../README.md")]
#![allow(unused_assignments)] // thiserror/miette derive macros trigger false positives

extern crate alloc;

mod clean;
mod defaults;
mod error;
mod ids;
mod internal;
mod map_to_array;
mod node;
mod path;
mod preprocess;
mod prune;
mod restore;
mod traverse;
mod union;

pub use clean::{CleanOptions, clean_payload};
pub use defaults::clean_implicit_defaults;
pub use error::{PreprocessError, RefError, RestoreError};
pub use ids::{IdGenerator, RandomIds, SequentialIds};
pub use internal::{INTERNAL_PROPERTY, inline_internal_defaults};
pub use map_to_array::{to_form_value, transform_maps};
pub use node::{MapEntries, REF_DEPTH_LIMIT, SchemaNode, is_transformed_schema, resolve_ref};
pub use path::{Keyword, PathSegment, SchemaPath};
pub use preprocess::{PreprocessOptions, preprocess_schema, preprocess_schema_with};
pub use prune::prune_fields;
pub use restore::{restore_form_data, restore_form_value};
pub use traverse::{traverse, traverse_mut, try_traverse_mut};
pub use union::resolve_unions;

/// Name of the synthetic property holding the original map key of an entry.
pub const TRANSFORMED_PROPERTY_KEY: &str = "transformedPropertyKey";

/// Name of the synthetic property holding a non-object map value.
pub const TRANSFORMED_PROPERTY_VALUE: &str = "transformedPropertyValue";
