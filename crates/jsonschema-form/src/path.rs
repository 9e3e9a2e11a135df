use alloc::borrow::Cow;
use core::fmt;

use strum::{Display, EnumString, IntoStaticStr};

/// Schema keywords whose values hold subschemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum Keyword {
    #[strum(serialize = "$defs")]
    Defs,
    Properties,
    Items,
    AnyOf,
    AllOf,
    OneOf,
    AdditionalProperties,
    PatternProperties,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// One step from a schema node to one of its subschemas.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Keyword(Keyword),
    /// A property name, `$defs` entry or `patternProperties` pattern.
    Key(String),
    /// A position in `items` (array form) or a union keyword.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => f.write_str(keyword.as_str()),
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Location of a subschema relative to the document root.
///
/// Displays as dotted text (`properties.replicas`, the root is `.`) and
/// converts to a JSON pointer with [`SchemaPath::to_pointer`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SchemaPath(Vec<PathSegment>);

impl SchemaPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Path of the subschema held directly by `keyword`.
    #[must_use]
    pub fn keyword(&self, keyword: Keyword) -> Self {
        self.extended([PathSegment::Keyword(keyword)])
    }

    /// Path of the named entry of a map-valued keyword.
    #[must_use]
    pub fn key(&self, keyword: Keyword, name: &str) -> Self {
        self.extended([
            PathSegment::Keyword(keyword),
            PathSegment::Key(name.to_owned()),
        ])
    }

    /// Path of the `index`th entry of an array-valued keyword.
    #[must_use]
    pub fn index(&self, keyword: Keyword, index: usize) -> Self {
        self.extended([PathSegment::Keyword(keyword), PathSegment::Index(index)])
    }

    /// RFC 6901 pointer to this node, usable with [`serde_json::Value::pointer`].
    pub fn to_pointer(&self) -> String {
        let mut pointer = String::new();
        for segment in &self.0 {
            pointer.push('/');
            pointer.push_str(&escape_pointer_token(&segment.to_string()));
        }
        pointer
    }

    fn extended<const N: usize>(&self, segments: [PathSegment; N]) -> Self {
        let mut path = self.0.clone();
        path.extend(segments);
        Self(path)
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(".");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Escape `~` and `/` in a JSON pointer reference token.
pub(crate) fn escape_pointer_token(token: &str) -> Cow<'_, str> {
    if token.contains(['~', '/']) {
        Cow::Owned(token.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Append a reference token to a JSON pointer.
pub(crate) fn pointer_child(pointer: &str, token: &str) -> String {
    format!("{pointer}/{}", escape_pointer_token(token))
}
