// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structured port values addressed by dotted paths.
//!
//! A [`Field`] is a small tagged tree. Leaves hold numbers, booleans,
//! enum tags or text; interior nodes are either named sub-fields
//! (`Composite`) or ordered lists. Paths such as `"Length"`, `"c2"` or
//! `"ColorKeys.1.time"` walk the tree one segment at a time, with numeric
//! segments indexing into lists.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Separator between path segments
pub const PATH_SEPARATOR: char = '.';

/// A structured, path-addressable value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Field {
    /// Floating point leaf
    Float(f32),
    /// Integer leaf
    Int(i32),
    /// Boolean leaf
    Bool(bool),
    /// Enumeration tag leaf
    Enum(String),
    /// Free text leaf (asset references, reference names)
    Text(String),
    /// Ordered list of sub-fields
    List(Vec<Field>),
    /// Named sub-fields in declaration order
    Composite(IndexMap<String, Field>),
}

impl Field {
    /// Create an empty composite field
    pub fn composite() -> Self {
        Self::Composite(IndexMap::new())
    }

    /// Builder: add a named sub-field (no-op on non-composite fields)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Field>) -> Self {
        if let Self::Composite(map) = &mut self {
            map.insert(name.into(), value.into());
        }
        self
    }

    /// Resolve a dotted path. The empty path resolves to `self`.
    pub fn get(&self, path: &str) -> Option<&Field> {
        segments(path).try_fold(self, |field, segment| field.child(segment))
    }

    /// Resolve a dotted path mutably
    pub fn get_mut(&mut self, path: &str) -> Option<&mut Field> {
        segments(path).try_fold(self, |field, segment| field.child_mut(segment))
    }

    /// Resolve a dotted path and convert the leaf
    pub fn try_get<T: FromField>(&self, path: &str) -> Option<T> {
        self.get(path).and_then(T::from_field)
    }

    /// Whether the path resolves
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Write a value at a dotted path.
    ///
    /// The parent of the last segment must already exist. Composites accept
    /// new names; lists accept an index equal to their length (append).
    pub fn set(&mut self, path: &str, value: impl Into<Field>) -> Result<(), FieldError> {
        let value = value.into();
        let (parent_path, last) = match path.rsplit_once(PATH_SEPARATOR) {
            Some((parent, last)) => (parent, last),
            None if path.is_empty() => {
                *self = value;
                return Ok(());
            }
            None => ("", path),
        };

        let parent = self
            .get_mut(parent_path)
            .ok_or_else(|| FieldError::InvalidPath(path.to_string()))?;

        match parent {
            Self::Composite(map) => {
                map.insert(last.to_string(), value);
                Ok(())
            }
            Self::List(items) => {
                let index: usize = last
                    .parse()
                    .map_err(|_| FieldError::InvalidPath(path.to_string()))?;
                match index.cmp(&items.len()) {
                    std::cmp::Ordering::Less => items[index] = value,
                    std::cmp::Ordering::Equal => items.push(value),
                    std::cmp::Ordering::Greater => {
                        return Err(FieldError::IndexOutOfRange {
                            path: path.to_string(),
                            index,
                        })
                    }
                }
                Ok(())
            }
            _ => Err(FieldError::NotAContainer(parent_path.to_string())),
        }
    }

    /// Remove a named sub-field of a composite, returning it
    pub fn remove(&mut self, name: &str) -> Option<Field> {
        match self {
            Self::Composite(map) => map.shift_remove(name),
            _ => None,
        }
    }

    fn child(&self, segment: &str) -> Option<&Field> {
        match self {
            Self::Composite(map) => map.get(segment),
            Self::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    fn child_mut(&mut self, segment: &str) -> Option<&mut Field> {
        match self {
            Self::Composite(map) => map.get_mut(segment),
            Self::List(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(move |i| items.get_mut(i)),
            _ => None,
        }
    }

    /// Float value (integers widen)
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// Integer value
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Enum tag or text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Enum(s) | Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// List items
    pub fn as_list(&self) -> Option<&[Field]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Named sub-fields
    pub fn as_composite(&self) -> Option<&IndexMap<String, Field>> {
        match self {
            Self::Composite(map) => Some(map),
            _ => None,
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(PATH_SEPARATOR).filter(|s| !s.is_empty())
}

impl From<f32> for Field {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for Field {
    fn from(value: f64) -> Self {
        Self::Float(value as f32)
    }
}

impl From<i32> for Field {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Field {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<Field>> for Field {
    fn from(value: Vec<Field>) -> Self {
        Self::List(value)
    }
}

/// Conversion from a field leaf into a typed value
pub trait FromField: Sized {
    /// Convert, or `None` if the field has the wrong shape
    fn from_field(field: &Field) -> Option<Self>;
}

impl FromField for f32 {
    fn from_field(field: &Field) -> Option<Self> {
        field.as_f32()
    }
}

impl FromField for i32 {
    fn from_field(field: &Field) -> Option<Self> {
        field.as_i32()
    }
}

impl FromField for bool {
    fn from_field(field: &Field) -> Option<Self> {
        field.as_bool()
    }
}

impl FromField for String {
    fn from_field(field: &Field) -> Option<Self> {
        field.as_str().map(str::to_string)
    }
}

impl FromField for Field {
    fn from_field(field: &Field) -> Option<Self> {
        Some(field.clone())
    }
}

/// Error when writing a field path
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// Path does not resolve
    #[error("Invalid field path: {0}")]
    InvalidPath(String),

    /// List index past the end
    #[error("Index {index} out of range at {path}")]
    IndexOutOfRange {
        /// Full path written
        path: String,
        /// Offending index
        index: usize,
    },

    /// Parent is a leaf
    #[error("Field at '{0}' has no sub-fields")]
    NotAContainer(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Field {
        Field::composite()
            .with("Length", Field::Enum("Two".into()))
            .with("c0", 1.0)
            .with(
                "Keys",
                vec![Field::composite().with("time", 0.0), Field::composite().with("time", 1.0)],
            )
    }

    #[test]
    fn test_path_resolution() {
        let field = sample();
        assert_eq!(field.try_get::<String>("Length").as_deref(), Some("Two"));
        assert_eq!(field.try_get::<f32>("c0"), Some(1.0));
        assert_eq!(field.try_get::<f32>("Keys.1.time"), Some(1.0));
        assert!(field.get("Keys.2.time").is_none());
        assert!(field.get("c0.x").is_none());
        assert_eq!(field.get(""), Some(&field));
    }

    #[test]
    fn test_set_existing_and_new() {
        let mut field = sample();
        field.set("c0", 4.0).unwrap();
        field.set("c1", 5.0).unwrap();
        field.set("Keys.0.time", 0.25).unwrap();
        field.set("Keys.2", Field::composite().with("time", 0.5)).unwrap();

        assert_eq!(field.try_get::<f32>("c0"), Some(4.0));
        assert_eq!(field.try_get::<f32>("c1"), Some(5.0));
        assert_eq!(field.try_get::<f32>("Keys.0.time"), Some(0.25));
        assert_eq!(field.as_composite().map(|m| m.len()), Some(4));
        assert_eq!(field.get("Keys").and_then(Field::as_list).map(<[Field]>::len), Some(3));
    }

    #[test]
    fn test_set_errors() {
        let mut field = sample();
        assert!(matches!(field.set("Missing.x", 1.0), Err(FieldError::InvalidPath(_))));
        assert!(matches!(field.set("c0.x", 1.0), Err(FieldError::NotAContainer(_))));
        assert!(matches!(
            field.set("Keys.5", 1.0),
            Err(FieldError::IndexOutOfRange { index: 5, .. })
        ));
    }

    #[test]
    fn test_empty_path_replaces_root() {
        let mut field = sample();
        field.set("", true).unwrap();
        assert_eq!(field, Field::Bool(true));
    }

    #[test]
    fn test_int_widens_to_float() {
        let field = Field::composite().with("Frames", 16);
        assert_eq!(field.try_get::<f32>("Frames"), Some(16.0));
        assert_eq!(field.try_get::<i32>("Frames"), Some(16));
        assert_eq!(field.try_get::<bool>("Frames"), None);
    }
}
