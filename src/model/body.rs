use nalgebra::Vector3;
use serde::Deserialize;

// All the immutable info about a body, as it appears in the data file.
// Lengths are in whatever unit the data file uses; the scene scales them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyRecord {
    /// Display name. Bodies with an empty name get no label animation or
    /// interactions.
    #[serde(default)]
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub parent: String,
    pub diameter: f64,

    #[serde(default)]
    pub model_offset_x: f64,
    #[serde(default)]
    pub model_offset_y: f64,
    #[serde(default)]
    pub model_offset_z: f64,
    #[serde(default)]
    pub model_rotation_x: f64,
    #[serde(default)]
    pub model_rotation_y: f64,
    #[serde(default)]
    pub model_rotation_z: f64,

    #[serde(default)]
    pub label_offset_x: f64,
    #[serde(default)]
    pub label_offset_y: f64,
    #[serde(default)]
    pub label_offset_z: f64,

    #[serde(default = "default_visible")]
    pub visible: bool,
    pub distance: f64,
    /// Length of a day, in days
    pub day: f64,
    /// Length of a year, in days
    pub year: f64,
    /// Inclination of the orbital plane, in degrees
    pub inclination: f64,
    /// Axial tilt, in degrees
    pub obliquity: f64,
    #[serde(default)]
    pub retrograde: bool,
}

fn default_visible() -> bool {
    true
}

impl BodyRecord {
    pub fn is_interactive(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn model_offset(&self) -> Vector3<f32> {
        nalgebra::convert(Vector3::new(
            self.model_offset_x,
            self.model_offset_y,
            self.model_offset_z,
        ))
    }

    /// Model rotation offsets, as Euler angles in degrees
    pub fn model_rotation(&self) -> Vector3<f32> {
        nalgebra::convert(Vector3::new(
            self.model_rotation_x,
            self.model_rotation_y,
            self.model_rotation_z,
        ))
    }

    pub fn label_offset(&self) -> Vector3<f32> {
        nalgebra::convert(Vector3::new(
            self.label_offset_x,
            self.label_offset_y,
            self.label_offset_z,
        ))
    }
}
