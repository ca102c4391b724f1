// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graphics test metadata for material graphs.
//!
//! A [`MaterialTestCase`] records which material a graph test renders,
//! the hash of the expected image and how rendered images are compared.
//! Assets are referred to by derived names only, so the JSON is the whole
//! test description.

use serde::{Deserialize, Serialize};

/// How a rendered image is compared against the expected one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageComparisonSettings {
    /// Render target width in pixels
    pub target_width: u32,
    /// Render target height in pixels
    pub target_height: u32,
    /// Per-pixel error above which a pixel counts as incorrect
    pub per_pixel_correctness_threshold: f32,
    /// Largest accepted mean error over the image
    pub average_correctness_threshold: f32,
    /// Largest accepted fraction of incorrect pixels
    pub incorrect_pixels_threshold: f32,
    /// Compare in HDR
    pub use_hdr: bool,
}

impl Default for ImageComparisonSettings {
    fn default() -> Self {
        Self {
            target_width: 512,
            target_height: 512,
            per_pixel_correctness_threshold: 0.001,
            average_correctness_threshold: 0.005,
            incorrect_pixels_threshold: 1.0 / 512.0 / 512.0,
            use_hdr: false,
        }
    }
}

/// One material test of a shader graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialTestCase {
    /// Test name
    pub test_name: String,
    /// Hash of the expected result image
    pub expected_hash: i32,
    /// Hash of the material under test
    pub test_hash: i32,
    /// Render with a perspective camera
    pub is_camera_perspective: bool,
    /// Name of the expected result image asset
    pub expected_result_path: String,
    /// Name of the material asset
    pub test_material_path: String,
    /// Name of the custom mesh asset, if the test uses one
    #[serde(default)]
    pub custom_mesh_path: Option<String>,
    /// Image comparison settings
    #[serde(default)]
    pub image_comparison: ImageComparisonSettings,
}

impl MaterialTestCase {
    /// Create a test case, deriving asset names from the test and material
    pub fn new(
        test_name: impl Into<String>,
        material_name: &str,
        expected_hash: i32,
        test_hash: i32,
        has_custom_mesh: bool,
    ) -> Self {
        let test_name = test_name.into();
        Self {
            expected_result_path: format!("{test_name}_{material_name}_image"),
            test_material_path: format!("{test_name}_{material_name}_material"),
            custom_mesh_path: has_custom_mesh.then(|| format!("{test_name}_mesh")),
            test_name,
            expected_hash,
            test_hash,
            is_camera_perspective: true,
            image_comparison: ImageComparisonSettings::default(),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
