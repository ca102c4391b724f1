// SPDX-License-Identifier: MIT OR Apache-2.0
//! Texture and sampler resource types.
//!
//! Resources are composite: in generated code a port refers to a struct
//! and the body template reaches into it (`Texture.tex`,
//! `Sampler.samplerstate`). A bare reference expands to the default member.

use super::{ty, DefaultValue, TypeDefinition};
use crate::field::Field;
use crate::key::RegistryKey;
use serde::{Deserialize, Serialize};

/// Name of the texture asset sub-field
pub const ASSET: &str = "Asset";
/// Name of the sampler filter sub-field
pub const FILTER: &str = "Filter";
/// Name of the sampler wrap sub-field
pub const WRAP: &str = "Wrap";

/// 2D texture
#[derive(Debug, Clone, Copy, Default)]
pub struct Texture2DType;

impl TypeDefinition for Texture2DType {
    fn key(&self) -> RegistryKey {
        ty::texture2d()
    }

    fn category(&self) -> &'static str {
        "Texture2D"
    }

    fn default_field(&self, default: Option<&DefaultValue>) -> Field {
        match default {
            Some(DefaultValue::Field(field)) => field.clone(),
            Some(DefaultValue::Reference(asset)) => Field::composite().with(ASSET, asset.as_str()),
            _ => Field::composite().with(ASSET, ""),
        }
    }

    fn shader_type(&self, _field: &Field) -> String {
        "UnityTexture2D".to_string()
    }

    fn default_member(&self) -> Option<&'static str> {
        Some("tex")
    }
}

/// Sampler filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SamplerFilter {
    /// Nearest texel
    Point,
    /// Bilinear
    #[default]
    Linear,
    /// Trilinear
    Trilinear,
}

/// Sampler addressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SamplerWrap {
    /// Tile
    #[default]
    Repeat,
    /// Clamp to edge
    Clamp,
    /// Mirror every tile
    Mirror,
    /// Mirror once then clamp
    MirrorOnce,
}

field_enum!(SamplerFilter { Point, Linear, Trilinear });
field_enum!(SamplerWrap { Repeat, Clamp, Mirror, MirrorOnce });

/// Texture sampler state
#[derive(Debug, Clone, Copy, Default)]
pub struct SamplerStateType;

impl TypeDefinition for SamplerStateType {
    fn key(&self) -> RegistryKey {
        ty::sampler_state()
    }

    fn category(&self) -> &'static str {
        "SamplerState"
    }

    fn default_field(&self, default: Option<&DefaultValue>) -> Field {
        match default {
            Some(DefaultValue::Field(field)) => field.clone(),
            _ => Field::composite()
                .with(FILTER, SamplerFilter::default())
                .with(WRAP, SamplerWrap::default()),
        }
    }

    fn shader_type(&self, _field: &Field) -> String {
        "UnitySamplerState".to_string()
    }

    fn literal(&self, field: &Field) -> Option<String> {
        let filter = field.try_get::<SamplerFilter>(FILTER).unwrap_or_default();
        let wrap = field.try_get::<SamplerWrap>(WRAP).unwrap_or_default();
        Some(format!(
            "UnityBuildSamplerStateStruct(SamplerState_{}_{})",
            filter.tag(),
            wrap.tag()
        ))
    }

    fn default_member(&self) -> Option<&'static str> {
        Some("samplerstate")
    }
}
