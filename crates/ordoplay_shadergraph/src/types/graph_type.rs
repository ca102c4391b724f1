// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scalar, vector and matrix types.
//!
//! All numeric shapes share one implementation, [`GraphType`], registered
//! once per shape (`Float`, `Vec3`, `Vector`, `Mat2`, ...). A shape whose
//! length is [`Length::Any`] takes its size from the graph during
//! concretization.
//!
//! Field schema:
//! - `Primitive`, `Precision`, `Length`, `Height` enum tags
//! - `c0..cN` float components, `N = Length * Height`
//! - `Reference` text, only when defaulted to a built-in reference

use super::{DefaultValue, TypeDefinition};
use crate::field::Field;
use crate::key::RegistryKey;
use serde::{Deserialize, Serialize};

/// Name of the primitive sub-field
pub const PRIMITIVE: &str = "Primitive";
/// Name of the precision sub-field
pub const PRECISION: &str = "Precision";
/// Name of the length sub-field
pub const LENGTH: &str = "Length";
/// Name of the height sub-field
pub const HEIGHT: &str = "Height";
/// Name of the reference sub-field
pub const REFERENCE: &str = "Reference";

const CATEGORY: &str = "GraphType";
const VECTOR_GROUP: &str = "Vector";
const MATRIX_GROUP: &str = "Matrix";

/// Sub-field name of component `index`
pub fn component(index: usize) -> String {
    format!("c{index}")
}

/// Component primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    /// Floating point
    Float,
    /// Integer
    Int,
    /// Boolean
    Bool,
}

field_enum!(Primitive { Float, Int, Bool });

/// Floating point precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Precision {
    /// 32-bit
    Single,
    /// 16-bit
    Half,
    /// Decided by the consuming shader
    Inherit,
}

field_enum!(Precision { Single, Half, Inherit });

/// Vector length (matrix column count)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Length {
    /// One component
    One,
    /// Two components
    Two,
    /// Three components
    Three,
    /// Four components
    Four,
    /// Inferred from the graph
    Any,
}

field_enum!(Length { One, Two, Three, Four, Any });

/// Matrix row count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Height {
    /// One row
    One,
    /// Two rows
    Two,
    /// Three rows
    Three,
    /// Four rows
    Four,
    /// Inferred from the graph
    Any,
}

field_enum!(Height { One, Two, Three, Four, Any });

macro_rules! sized {
    ($name:ident) => {
        impl $name {
            /// Concrete size, `None` for `Any`
            pub fn count(self) -> Option<u8> {
                match self {
                    Self::One => Some(1),
                    Self::Two => Some(2),
                    Self::Three => Some(3),
                    Self::Four => Some(4),
                    Self::Any => None,
                }
            }

            /// Size clamped into `1..=4`
            pub fn from_count(count: usize) -> Self {
                match count {
                    0 | 1 => Self::One,
                    2 => Self::Two,
                    3 => Self::Three,
                    _ => Self::Four,
                }
            }
        }
    };
}

sized!(Length);
sized!(Height);

/// Numeric shape type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphType {
    key: RegistryKey,
    /// Component primitive
    pub primitive: Primitive,
    /// Precision
    pub precision: Precision,
    /// Declared length
    pub length: Length,
    /// Declared height
    pub height: Height,
}

impl GraphType {
    /// Create a shape registered under `name` (version 1)
    pub fn new(name: impl Into<String>, primitive: Primitive, length: Length, height: Height) -> Self {
        Self {
            key: RegistryKey::new(name, 1),
            primitive,
            precision: Precision::Single,
            length,
            height,
        }
    }

    /// Every built-in shape
    pub fn builtins() -> Vec<GraphType> {
        use Height as H;
        use Length as L;
        use Primitive::{Bool, Float, Int};
        vec![
            Self::new("Float", Float, L::One, H::One),
            Self::new("Int", Int, L::One, H::One),
            Self::new("Bool", Bool, L::One, H::One),
            Self::new("Vec2", Float, L::Two, H::One),
            Self::new("Vec3", Float, L::Three, H::One),
            Self::new("Vec4", Float, L::Four, H::One),
            Self::new("Vector", Float, L::Any, H::One),
            Self::new("Mat2", Float, L::Two, H::Two),
            Self::new("Mat3", Float, L::Three, H::Three),
            Self::new("Mat4", Float, L::Four, H::Four),
            Self::new("Matrix", Float, L::Any, H::Any),
        ]
    }

    /// Built-in shape for a key
    pub fn builtin(key: RegistryKey) -> Option<GraphType> {
        Self::builtins().into_iter().find(|t| t.key == key)
    }

    fn is_matrix_group(&self) -> bool {
        self.length == Length::Any && self.height == Height::Any
    }

    /// Component values of a field, in order
    pub fn components(field: &Field) -> Vec<f32> {
        (0..component_count(field))
            .map(|i| field.try_get::<f32>(&component(i)).unwrap_or(0.0))
            .collect()
    }

    fn shape_for_default(&self, default: Option<&DefaultValue>) -> (Length, Height) {
        let provided = match default {
            Some(DefaultValue::Components(values)) if !values.is_empty() => Some(values.len()),
            _ => None,
        };
        let intrinsic = usize::from(self.intrinsic_dimension());

        match (self.length, self.height) {
            (Length::Any, Height::Any) => {
                let side = provided.map_or(intrinsic, square_side).max(2);
                (Length::from_count(side), Height::from_count(side))
            }
            (Length::Any, height) => {
                (Length::from_count(provided.unwrap_or(intrinsic)), height)
            }
            (length, Height::Any) => (length, Height::from_count(provided.unwrap_or(1))),
            fixed => fixed,
        }
    }
}

fn square_side(count: usize) -> usize {
    (1..=4).find(|side| side * side >= count).unwrap_or(4)
}

fn component_count(field: &Field) -> usize {
    let length = field.try_get::<Length>(LENGTH).and_then(Length::count).unwrap_or(1);
    let height = field.try_get::<Height>(HEIGHT).and_then(Height::count).unwrap_or(1);
    usize::from(length) * usize::from(height)
}

fn set_components(field: &mut Field, values: &[f32]) {
    let Field::Composite(map) = field else {
        return;
    };
    map.retain(|name, _| !is_component_name(name));
    for (i, value) in values.iter().enumerate() {
        map.insert(component(i), Field::Float(*value));
    }
}

fn is_component_name(name: &str) -> bool {
    name.strip_prefix('c')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

fn format_component(primitive: Primitive, value: f32) -> String {
    match primitive {
        Primitive::Float => format!("{value:?}"),
        Primitive::Int => format!("{}", value as i32),
        Primitive::Bool => (value != 0.0).to_string(),
    }
}

impl TypeDefinition for GraphType {
    fn key(&self) -> RegistryKey {
        self.key.clone()
    }

    fn category(&self) -> &'static str {
        CATEGORY
    }

    fn default_field(&self, default: Option<&DefaultValue>) -> Field {
        if let Some(DefaultValue::Field(field)) = default {
            return field.clone();
        }

        let (length, height) = self.shape_for_default(default);
        let mut field = Field::composite()
            .with(PRIMITIVE, self.primitive)
            .with(PRECISION, self.precision)
            .with(LENGTH, length)
            .with(HEIGHT, height);

        let count = component_count(&field);
        let mut values = vec![0.0; count];
        match default {
            Some(DefaultValue::Components(given)) => {
                for (slot, value) in values.iter_mut().zip(given) {
                    *slot = *value;
                }
            }
            Some(DefaultValue::Int(value)) => values.fill(*value as f32),
            Some(DefaultValue::Bool(value)) => values.fill(if *value { 1.0 } else { 0.0 }),
            Some(DefaultValue::Reference(name)) => {
                field = field.with(REFERENCE, name.as_str());
            }
            Some(DefaultValue::Field(_)) | None => {}
        }
        set_components(&mut field, &values);
        field
    }

    fn adapt_field(&self, source: &Field, target: &dyn TypeDefinition) -> Field {
        let mut adapted = target.default_field(None);
        if target.shape_group().is_some() {
            if let Some(dimension) = self.dimension(source) {
                target.resize(&mut adapted, dimension);
            }
        }

        let incoming = Self::components(source);
        let values: Vec<f32> = (0..component_count(&adapted))
            .map(|i| incoming.get(i).copied().unwrap_or(0.0))
            .collect();
        set_components(&mut adapted, &values);
        adapted
    }

    fn shape_group(&self) -> Option<&'static str> {
        match (self.length, self.height) {
            (Length::Any, Height::Any) => Some(MATRIX_GROUP),
            (Length::Any, _) => Some(VECTOR_GROUP),
            _ => None,
        }
    }

    fn intrinsic_dimension(&self) -> u8 {
        if self.is_matrix_group() {
            2
        } else {
            1
        }
    }

    fn dimension(&self, field: &Field) -> Option<u8> {
        field.try_get::<Length>(LENGTH).and_then(Length::count)
    }

    fn resize(&self, field: &mut Field, dimension: u8) {
        let size = usize::from(dimension);
        let mut values = Self::components(field);
        if let Err(err) = field.set(LENGTH, Length::from_count(size)) {
            tracing::warn!("Cannot resize {} field: {err}", self.key);
            return;
        }
        if self.is_matrix_group() {
            if let Err(err) = field.set(HEIGHT, Height::from_count(size)) {
                tracing::warn!("Cannot resize {} field: {err}", self.key);
                return;
            }
        }
        values.resize(component_count(field), 0.0);
        set_components(field, &values);
    }

    fn normalize(&self, field: &mut Field) {
        let template = self.default_field(None);
        let Field::Composite(map) = field else {
            tracing::warn!("{} field replaced by a bare value; rebuilding from it", self.key);
            *field = match field.as_f32() {
                Some(value) => self.default_field(Some(&DefaultValue::Components(vec![value]))),
                None => template,
            };
            return;
        };

        if let Field::Composite(shape) = template {
            for name in [PRIMITIVE, PRECISION, LENGTH, HEIGHT] {
                if let Some(value) = shape.get(name).filter(|_| !map.contains_key(name)) {
                    map.insert(name.to_string(), value.clone());
                }
            }
        }
        let values = Self::components(field);
        set_components(field, &values);
    }

    fn shader_type(&self, field: &Field) -> String {
        let primitive = field.try_get::<Primitive>(PRIMITIVE).unwrap_or(self.primitive);
        let precision = field.try_get::<Precision>(PRECISION).unwrap_or(self.precision);
        let base = match (primitive, precision) {
            (Primitive::Float, Precision::Half) => "half",
            (Primitive::Float, _) => "float",
            (Primitive::Int, _) => "int",
            (Primitive::Bool, _) => "bool",
        };
        let length = field.try_get::<Length>(LENGTH).and_then(Length::count).unwrap_or(1);
        let height = field.try_get::<Height>(HEIGHT).and_then(Height::count).unwrap_or(1);
        match (height, length) {
            (1, 1) => base.to_string(),
            (1, length) => format!("{base}{length}"),
            (height, length) => format!("{base}{height}x{length}"),
        }
    }

    fn literal(&self, field: &Field) -> Option<String> {
        if let Some(reference) = field.try_get::<String>(REFERENCE) {
            return Some(reference);
        }
        let primitive = field.try_get::<Primitive>(PRIMITIVE).unwrap_or(self.primitive);
        let values: Vec<String> = Self::components(field)
            .into_iter()
            .map(|v| format_component(primitive, v))
            .collect();
        match values.as_slice() {
            [single] => Some(single.clone()),
            _ => Some(format!("{}({})", self.shader_type(field), values.join(", "))),
        }
    }
}
