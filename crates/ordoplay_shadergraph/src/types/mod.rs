// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pluggable data types for shader graph ports.
//!
//! Every port type is a [`TypeDefinition`] registered under a
//! [`RegistryKey`]. The trait is the whole contract the rest of the crate
//! relies on: produce a default field, derive a field across a connection,
//! and (for types with an inferable dimension) report and change that
//! dimension. New types are added by registering another implementation.

/// Tag-string conversions between a fieldless enum and [`Field::Enum`]
macro_rules! field_enum {
    ($name:ident { $($variant:ident),* $(,)? }) => {
        impl $name {
            fn tag(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)*
                }
            }

            fn from_tag(tag: &str) -> Option<Self> {
                match tag {
                    $(stringify!($variant) => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }

        impl From<$name> for $crate::field::Field {
            fn from(value: $name) -> Self {
                $crate::field::Field::Enum(value.tag().to_string())
            }
        }

        impl $crate::field::FromField for $name {
            fn from_field(field: &$crate::field::Field) -> Option<Self> {
                field.as_str().and_then(Self::from_tag)
            }
        }
    };
}

pub mod gradient;
pub mod graph_type;
pub mod resource;

use crate::field::Field;
use crate::key::RegistryKey;
use crate::registry::{Registry, RegistryError};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub use gradient::{Gradient, GradientAlphaKey, GradientColorKey, GradientMode, GradientType};
pub use graph_type::{GraphType, Height, Length, Precision, Primitive};
pub use resource::{SamplerFilter, SamplerStateType, SamplerWrap, Texture2DType};

/// Default payload declared on a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// Numeric components, in `c0..cN` order
    Components(Vec<f32>),
    /// Single integer
    Int(i32),
    /// Single boolean
    Bool(bool),
    /// A named built-in reference such as `UV0`
    Reference(String),
    /// A complete field, used verbatim
    Field(Field),
}

impl From<Vec<f32>> for DefaultValue {
    fn from(value: Vec<f32>) -> Self {
        Self::Components(value)
    }
}

impl<const N: usize> From<[f32; N]> for DefaultValue {
    fn from(value: [f32; N]) -> Self {
        Self::Components(value.to_vec())
    }
}

impl From<i32> for DefaultValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Capability interface implemented by every port data type
pub trait TypeDefinition: Debug + Send + Sync {
    /// Registry identity
    fn key(&self) -> RegistryKey;

    /// Compatibility family. Ports only connect within one category.
    fn category(&self) -> &'static str;

    /// Field for a fresh port, honouring a declared default when given
    fn default_field(&self, default: Option<&DefaultValue>) -> Field;

    /// Whether a port of this type can be fed from a port of `source` type
    fn accepts(&self, source: &dyn TypeDefinition) -> bool {
        source.category() == self.category()
    }

    /// Derive the field of a downstream port of `target` type from `source`,
    /// the current field of an upstream port of this type.
    ///
    /// Always returns a new field; the upstream field is never shared.
    fn adapt_field(&self, source: &Field, target: &dyn TypeDefinition) -> Field {
        if target.key() == self.key() {
            source.clone()
        } else {
            target.default_field(None)
        }
    }

    /// Inference group for an inferable dimension, `None` when fixed
    fn shape_group(&self) -> Option<&'static str> {
        None
    }

    /// Dimension used when nothing in the group fixes one
    fn intrinsic_dimension(&self) -> u8 {
        1
    }

    /// Dimension carried by `field`
    fn dimension(&self, _field: &Field) -> Option<u8> {
        None
    }

    /// Change the dimension carried by `field`
    fn resize(&self, _field: &mut Field, _dimension: u8) {}

    /// Bring a field written by hand back to this type's schema
    fn normalize(&self, _field: &mut Field) {}

    /// Shading-language type name for a port holding `field`
    fn shader_type(&self, field: &Field) -> String;

    /// Inline initializer expression, if the value can be written inline
    fn literal(&self, _field: &Field) -> Option<String> {
        None
    }

    /// Member a bare reference expands to, for composite resource types
    fn default_member(&self) -> Option<&'static str> {
        None
    }
}

/// Keys of the built-in types
pub mod ty {
    use crate::key::RegistryKey;

    macro_rules! builtin_keys {
        ($($fn_name:ident => $name:literal),* $(,)?) => {
            $(
                #[doc = concat!("Key of the built-in `", $name, "` type")]
                pub fn $fn_name() -> RegistryKey {
                    RegistryKey::new($name, 1)
                }
            )*
        };
    }

    builtin_keys! {
        float => "Float",
        int => "Int",
        bool => "Bool",
        vec2 => "Vec2",
        vec3 => "Vec3",
        vec4 => "Vec4",
        vector => "Vector",
        mat2 => "Mat2",
        mat3 => "Mat3",
        mat4 => "Mat4",
        matrix => "Matrix",
        gradient => "Gradient",
        texture2d => "Texture2D",
        sampler_state => "SamplerState",
    }
}

/// Register every built-in type
pub fn register_builtin_types(registry: &mut Registry) -> Result<(), RegistryError> {
    for graph_type in GraphType::builtins() {
        registry.register_type(graph_type)?;
    }
    registry.register_type(GradientType)?;
    registry.register_type(Texture2DType)?;
    registry.register_type(SamplerStateType)?;
    Ok(())
}
