// SPDX-License-Identifier: MIT OR Apache-2.0
//! Standard shader node library.
//!
//! A small set of material nodes registered on top of the built-in types.

use crate::key::RegistryKey;
use crate::node::{FunctionDescriptor, NodeDescriptor, ParameterDescriptor};
use crate::port::Usage;
use crate::registry::{Registry, RegistryError};
use crate::types::{ty, DefaultValue, Gradient};

/// Include file used by the imposter node
pub const IMPOSTER_INCLUDE: &str =
    "Packages/com.ordoplay.shadergraph/ShaderLibrary/MeshDeformation/Imposter.hlsl";

/// Named references used as parameter defaults
pub mod reference {
    /// First UV channel
    pub const UV0: &str = "UV0";
    /// Vertex position in object space
    pub const OBJECT_SPACE_POSITION: &str = "ObjectSpacePosition";
}

fn param(name: &str, type_key: RegistryKey, usage: Usage) -> ParameterDescriptor {
    ParameterDescriptor::new(name, type_key, usage)
}

/// Register every standard node, returning their keys in registration order
pub fn register_standard_nodes(registry: &mut Registry) -> Result<Vec<RegistryKey>, RegistryError> {
    let mut keys = Vec::new();

    // ========================================================================
    // Math
    // ========================================================================

    keys.push(registry.register_function(
        FunctionDescriptor::new(
            "Add",
            "$Out = $A + $B;",
            [
                param("A", ty::vector(), Usage::In),
                param("B", ty::vector(), Usage::In),
                param("Out", ty::vector(), Usage::Out),
            ],
        )
        .with_display_name("Add"),
    )?);

    keys.push(registry.register_function(
        FunctionDescriptor::new(
            "Multiply",
            "$Out = $A * $B;",
            [
                param("A", ty::vector(), Usage::In),
                param("B", ty::vector(), Usage::In).with_default([2.0]),
                param("Out", ty::vector(), Usage::Out),
            ],
        )
        .with_display_name("Multiply"),
    )?);

    // ========================================================================
    // Input - Constants
    // ========================================================================

    keys.push(registry.register_function(
        FunctionDescriptor::new(
            "Matrix2x2",
            "$Out = $Matrix2x2;",
            [
                param("Matrix2x2", ty::mat2(), Usage::Static).with_default([1.0, 0.0, 0.0, 1.0]),
                param("Out", ty::mat2(), Usage::Out),
            ],
        )
        .with_display_name("Matrix 2x2"),
    )?);

    keys.push(registry.register_function(
        FunctionDescriptor::new(
            "GradientNode",
            "$Out = $Gradient;",
            [
                param("Gradient", ty::gradient(), Usage::Static)
                    .with_default(DefaultValue::Field(Gradient::default().to_field())),
                param("Out", ty::gradient(), Usage::Out),
            ],
        )
        .with_display_name("Gradient"),
    )?);

    // ========================================================================
    // Texture
    // ========================================================================

    keys.push(registry.register_function(
        FunctionDescriptor::new(
            "SampleTexture2D",
            "$RGBA = SAMPLE_TEXTURE2D($Texture, $Sampler.samplerstate, $UV.xy);",
            [
                param("Texture", ty::texture2d(), Usage::In),
                param("UV", ty::vec4(), Usage::In).with_reference(reference::UV0),
                param("Sampler", ty::sampler_state(), Usage::In),
                param("RGBA", ty::vec4(), Usage::Out),
            ],
        )
        .with_display_name("Sample Texture 2D"),
    )?);

    // ========================================================================
    // Mesh deformation
    // ========================================================================

    keys.push(registry.register_node(
        NodeDescriptor::new(1, "ImposterUV", [imposter_three_frames(), imposter_one_frame()])
            .with_main_function("ThreeFrames"),
    )?);

    tracing::debug!("Registered {} standard nodes", keys.len());
    Ok(keys)
}

fn imposter_inputs() -> Vec<ParameterDescriptor> {
    vec![
        param("Pos", ty::vec3(), Usage::In).with_reference(reference::OBJECT_SPACE_POSITION),
        param("inUV", ty::vec4(), Usage::In).with_reference(reference::UV0),
        param("Frames", ty::float(), Usage::In).with_default([16.0]),
        param("Offset", ty::vec3(), Usage::In),
        param("Size", ty::float(), Usage::In).with_default([1.0]),
        param("HemiSphere", ty::bool(), Usage::In),
        param("Texture", ty::texture2d(), Usage::In),
        param("Sampler", ty::sampler_state(), Usage::In),
        param("Parallax", ty::float(), Usage::In),
        param("HeightMapChannel", ty::int(), Usage::In).with_default(3),
    ]
}

fn imposter_three_frames() -> FunctionDescriptor {
    let mut parameters = imposter_inputs();
    parameters.extend([
        param("OutPos", ty::vec3(), Usage::Out),
        param("UV0", ty::vec2(), Usage::Out),
        param("UV1", ty::vec2(), Usage::Out),
        param("UV2", ty::vec2(), Usage::Out),
        param("Weights", ty::vec4(), Usage::Out),
        param("Grid", ty::vec4(), Usage::Out),
    ]);

    FunctionDescriptor::new(
        "ThreeFrames",
        "ImposterUV($Pos, $inUV, $Frames, $Offset, $Size, $HemiSphere, $Parallax, $HeightMapChannel, \
         $Sampler, $Texture, $OutPos, $Weights, $UV0, $UV1, $UV2, $Grid);",
        parameters,
    )
    .with_display_name("Three Frames")
    .with_includes([IMPOSTER_INCLUDE])
}

fn imposter_one_frame() -> FunctionDescriptor {
    let mut parameters = imposter_inputs();
    parameters.extend([
        param("OutPos", ty::vec3(), Usage::Out),
        param("UV0", ty::vec4(), Usage::Out),
        param("Grid", ty::vec4(), Usage::Out),
    ]);

    FunctionDescriptor::new(
        "OneFrame",
        "ImposterUV_oneFrame($Pos, $inUV, $Frames, $Offset, $Size, $HemiSphere, $Parallax, \
         $HeightMapChannel, $Sampler, $Texture, $OutPos, $UV0, $Grid);",
        parameters,
    )
    .with_display_name("One Frame")
    .with_includes([IMPOSTER_INCLUDE])
}
