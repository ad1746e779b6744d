use nalgebra::{UnitQuaternion, Vector3};

use crate::config::{LabelAnchor, SceneConfig};
use crate::host::NodeId;
use crate::math::geometry::{euler_degrees, forward_tilt, scale_factor};
use crate::math::Transform;
use crate::model::BodyRecord;

/// The six nodes that make up one body:
///
/// ```text
/// orbital_plane
/// └── orbital_position
///     ├── label
///     └── obliquity_carrier
///         └── obliquity_tilt
///             └── model
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CelestialBodyActors {
    pub orbital_plane: NodeId,
    pub orbital_position: NodeId,
    pub label: NodeId,
    pub obliquity_carrier: NodeId,
    pub obliquity_tilt: NodeId,
    pub model: NodeId,
}

impl CelestialBodyActors {
    /// Each node with its expected parent. The orbital plane's parent is
    /// whatever the scene root is, so it isn't listed.
    pub fn parent_links(&self) -> [(NodeId, NodeId); 5] {
        [
            (self.orbital_position, self.orbital_plane),
            (self.label, self.orbital_position),
            (self.obliquity_carrier, self.orbital_position),
            (self.obliquity_tilt, self.obliquity_carrier),
            (self.model, self.obliquity_tilt),
        ]
    }
}

/// Resting transforms for a body's nodes, derived from its record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyGeometry {
    pub scale: f32,
    pub plane_tilt: UnitQuaternion<f32>,
    pub axial_tilt: UnitQuaternion<f32>,
    pub orbital_position: Vector3<f32>,
    pub model: Transform,
    pub label: Transform,
}

impl BodyGeometry {
    pub fn new(record: &BodyRecord, config: &SceneConfig) -> Self {
        let scale = scale_factor(record.diameter);

        let model = Transform::from_position(record.model_offset())
            .with_rotation(euler_degrees(&record.model_rotation()))
            .with_uniform_scale(scale);

        let mut label_position = record.label_offset();
        if config.label_anchor == LabelAnchor::BodyRelative {
            label_position.y += scale;
        }

        BodyGeometry {
            scale,
            plane_tilt: forward_tilt(record.inclination),
            axial_tilt: forward_tilt(record.obliquity),
            orbital_position: Vector3::x() * (record.distance as f32 * config.distance_scale),
            model,
            label: Transform::from_position(label_position),
        }
    }
}
