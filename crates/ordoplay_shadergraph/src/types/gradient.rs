// SPDX-License-Identifier: MIT OR Apache-2.0
//! Colour gradient type.
//!
//! The field stores a `Mode` tag plus `ColorKeys` and `AlphaKeys` lists.
//! [`Gradient`] is the typed view used by callers that want to read or
//! write the whole value at once.

use super::{ty, DefaultValue, TypeDefinition};
use crate::field::{Field, FromField};
use crate::key::RegistryKey;
use serde::{Deserialize, Serialize};

/// Name of the mode sub-field
pub const MODE: &str = "Mode";
/// Name of the colour key list
pub const COLOR_KEYS: &str = "ColorKeys";
/// Name of the alpha key list
pub const ALPHA_KEYS: &str = "AlphaKeys";

/// Keys beyond this count are dropped when writing a gradient
pub const MAX_KEYS: usize = 8;

/// Interpolation between keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GradientMode {
    /// Linear blend
    #[default]
    Blend,
    /// Step to the next key
    Fixed,
    /// Blend in a perceptual colour space
    PerceptualBlend,
}

field_enum!(GradientMode { Blend, Fixed, PerceptualBlend });

impl GradientMode {
    fn shader_index(self) -> u8 {
        match self {
            Self::Blend => 0,
            Self::Fixed => 1,
            Self::PerceptualBlend => 2,
        }
    }
}

/// Colour key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientColorKey {
    /// RGB colour
    pub color: [f32; 3],
    /// Position in `0..=1`
    pub time: f32,
}

impl GradientColorKey {
    /// Create a key
    pub fn new(color: [f32; 3], time: f32) -> Self {
        Self { color, time }
    }
}

/// Alpha key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientAlphaKey {
    /// Alpha
    pub alpha: f32,
    /// Position in `0..=1`
    pub time: f32,
}

impl GradientAlphaKey {
    /// Create a key
    pub fn new(alpha: f32, time: f32) -> Self {
        Self { alpha, time }
    }
}

/// Typed gradient value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    /// Interpolation mode
    pub mode: GradientMode,
    /// Colour keys
    pub color_keys: Vec<GradientColorKey>,
    /// Alpha keys
    pub alpha_keys: Vec<GradientAlphaKey>,
}

impl Default for Gradient {
    /// Black to white, fully opaque
    fn default() -> Self {
        Self {
            mode: GradientMode::Blend,
            color_keys: vec![
                GradientColorKey::new([0.0, 0.0, 0.0], 0.0),
                GradientColorKey::new([1.0, 1.0, 1.0], 1.0),
            ],
            alpha_keys: vec![GradientAlphaKey::new(1.0, 0.0), GradientAlphaKey::new(1.0, 1.0)],
        }
    }
}

impl Gradient {
    /// Replace both key lists
    pub fn set_keys(&mut self, color_keys: Vec<GradientColorKey>, alpha_keys: Vec<GradientAlphaKey>) {
        self.color_keys = color_keys;
        self.alpha_keys = alpha_keys;
    }

    /// Field representation
    pub fn to_field(&self) -> Field {
        let colors = self
            .color_keys
            .iter()
            .take(MAX_KEYS)
            .map(|key| {
                Field::composite()
                    .with("r", key.color[0])
                    .with("g", key.color[1])
                    .with("b", key.color[2])
                    .with("time", key.time)
            })
            .collect::<Vec<_>>();
        let alphas = self
            .alpha_keys
            .iter()
            .take(MAX_KEYS)
            .map(|key| Field::composite().with("alpha", key.alpha).with("time", key.time))
            .collect::<Vec<_>>();
        if self.color_keys.len() > MAX_KEYS || self.alpha_keys.len() > MAX_KEYS {
            tracing::warn!(
                "Gradient has {} colour and {} alpha keys; keeping the first {MAX_KEYS} of each",
                self.color_keys.len(),
                self.alpha_keys.len()
            );
        }

        Field::composite()
            .with(MODE, self.mode)
            .with(COLOR_KEYS, colors)
            .with(ALPHA_KEYS, alphas)
    }
}

impl FromField for Gradient {
    fn from_field(field: &Field) -> Option<Self> {
        let mode = field.try_get::<GradientMode>(MODE)?;
        let color_keys = field
            .get(COLOR_KEYS)?
            .as_list()?
            .iter()
            .map(|key| {
                Some(GradientColorKey::new(
                    [key.try_get("r")?, key.try_get("g")?, key.try_get("b")?],
                    key.try_get("time")?,
                ))
            })
            .collect::<Option<Vec<_>>>()?;
        let alpha_keys = field
            .get(ALPHA_KEYS)?
            .as_list()?
            .iter()
            .map(|key| Some(GradientAlphaKey::new(key.try_get("alpha")?, key.try_get("time")?)))
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            mode,
            color_keys,
            alpha_keys,
        })
    }
}

/// Gradient port type
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientType;

impl GradientType {
    /// Read the gradient held by a field
    pub fn get_gradient(field: &Field) -> Option<Gradient> {
        Gradient::from_field(field)
    }

    /// Overwrite a field with a gradient
    pub fn set_gradient(field: &mut Field, gradient: &Gradient) {
        *field = gradient.to_field();
    }
}

impl TypeDefinition for GradientType {
    fn key(&self) -> RegistryKey {
        ty::gradient()
    }

    fn category(&self) -> &'static str {
        "Gradient"
    }

    fn default_field(&self, default: Option<&DefaultValue>) -> Field {
        match default {
            Some(DefaultValue::Field(field)) => field.clone(),
            _ => Gradient::default().to_field(),
        }
    }

    fn shader_type(&self, _field: &Field) -> String {
        "Gradient".to_string()
    }

    fn literal(&self, field: &Field) -> Option<String> {
        let gradient = Gradient::from_field(field)?;
        let mut args = vec![
            gradient.mode.shader_index().to_string(),
            gradient.color_keys.len().min(MAX_KEYS).to_string(),
            gradient.alpha_keys.len().min(MAX_KEYS).to_string(),
        ];
        for i in 0..MAX_KEYS {
            let key = gradient.color_keys.get(i).copied().unwrap_or(GradientColorKey::new([0.0; 3], 0.0));
            args.push(format!(
                "float4({:?}, {:?}, {:?}, {:?})",
                key.color[0], key.color[1], key.color[2], key.time
            ));
        }
        for i in 0..MAX_KEYS {
            let key = gradient.alpha_keys.get(i).copied().unwrap_or(GradientAlphaKey::new(0.0, 0.0));
            args.push(format!("float2({:?}, {:?})", key.alpha, key.time));
        }
        Some(format!("NewGradient({})", args.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gradient_field() {
        let field = GradientType.default_field(None);
        let gradient = GradientType::get_gradient(&field).unwrap();
        assert_eq!(gradient, Gradient::default());
        assert_eq!(field.try_get::<f32>("ColorKeys.1.r"), Some(1.0));
        assert_eq!(field.try_get::<f32>("AlphaKeys.0.alpha"), Some(1.0));
    }

    #[test]
    fn test_gradient_write_then_read() {
        let mut expected = Gradient {
            mode: GradientMode::Fixed,
            ..Gradient::default()
        };
        expected.set_keys(
            vec![
                GradientColorKey::new([0.0, 0.0, 0.0], 0.0),
                GradientColorKey::new([0.0, 1.0, 0.0], 1.0),
            ],
            vec![GradientAlphaKey::new(1.0, 0.0), GradientAlphaKey::new(0.0, 1.0)],
        );

        let mut field = GradientType.default_field(None);
        GradientType::set_gradient(&mut field, &expected);
        assert_eq!(GradientType::get_gradient(&field), Some(expected));
    }

    #[test]
    fn test_keys_are_capped() {
        let mut gradient = Gradient::default();
        gradient.color_keys = (0..12).map(|i| GradientColorKey::new([0.0; 3], i as f32 / 12.0)).collect();
        gradient.alpha_keys = (0..9).map(|i| GradientAlphaKey::new(1.0, i as f32 / 9.0)).collect();

        let field = gradient.to_field();
        assert_eq!(field.get(COLOR_KEYS).and_then(Field::as_list).map(<[Field]>::len), Some(MAX_KEYS));
        assert_eq!(field.get(ALPHA_KEYS).and_then(Field::as_list).map(<[Field]>::len), Some(MAX_KEYS));

        let read = Gradient::from_field(&field).unwrap();
        assert_eq!(read.color_keys.len(), MAX_KEYS);
        assert_eq!(read.color_keys[..], gradient.color_keys[..MAX_KEYS]);
        assert_eq!(read.alpha_keys[..], gradient.alpha_keys[..MAX_KEYS]);
    }

    #[test]
    fn test_literal_has_fixed_arity() {
        let literal = GradientType.literal(&GradientType.default_field(None)).unwrap();
        assert!(literal.starts_with("NewGradient(0, 2, 2, float4(0.0, 0.0, 0.0, 0.0)"));
        assert_eq!(literal.matches("float4(").count(), MAX_KEYS);
        assert_eq!(literal.matches("float2(").count(), MAX_KEYS);
    }

    #[test]
    fn test_malformed_field_is_not_a_gradient() {
        let field = Field::composite().with(MODE, Field::Enum("Sideways".into()));
        assert!(GradientType::get_gradient(&field).is_none());
    }
}
