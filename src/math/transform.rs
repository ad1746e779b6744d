use approx::{AbsDiffEq, RelativeEq};
use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Local transform of a scene node, relative to its parent.
///
/// Scale is applied first, then rotation, then translation. Composition
/// assumes uniform scale on the parent, which holds for everything the
/// scene builds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Transform {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::repeat(1.0),
        }
    }

    pub fn from_position(position: Vector3<f32>) -> Self {
        Transform {
            position,
            ..Self::identity()
        }
    }

    pub fn from_rotation(rotation: UnitQuaternion<f32>) -> Self {
        Transform {
            rotation,
            ..Self::identity()
        }
    }

    pub fn with_position(self, position: Vector3<f32>) -> Self {
        Transform { position, ..self }
    }

    pub fn with_rotation(self, rotation: UnitQuaternion<f32>) -> Self {
        Transform { rotation, ..self }
    }

    pub fn with_scale(self, scale: Vector3<f32>) -> Self {
        Transform { scale, ..self }
    }

    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(Vector3::repeat(scale))
    }

    /// Returns the transform that results from applying `child` inside `self`.
    pub fn compose(&self, child: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * self.scale.component_mul(&child.position),
            rotation: self.rotation * child.rotation,
            scale: self.scale.component_mul(&child.scale),
        }
    }

    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        Point3::from(self.position + self.rotation * self.scale.component_mul(&point.coords))
    }

    /// Interpolates towards `other`. `t` is not clamped, so easing curves that
    /// overshoot are passed through.
    pub fn interpolate(&self, other: &Transform, t: f32) -> Transform {
        // slerp panics on antipodal quaternions; fall back to the target
        let rotation = self
            .rotation
            .try_slerp(&other.rotation, t, 1.0e-6)
            .unwrap_or(other.rotation);

        Transform {
            position: self.position.lerp(&other.position, t),
            rotation,
            scale: self.scale.lerp(&other.scale, t),
        }
    }
}

impl AbsDiffEq for Transform {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.position.abs_diff_eq(&other.position, epsilon)
            && self.rotation.abs_diff_eq(&other.rotation, epsilon)
            && self.scale.abs_diff_eq(&other.scale, epsilon)
    }
}

impl RelativeEq for Transform {
    fn default_max_relative() -> f32 {
        f32::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: f32, max_relative: f32) -> bool {
        self.position.relative_eq(&other.position, epsilon, max_relative)
            && self.rotation.relative_eq(&other.rotation, epsilon, max_relative)
            && self.scale.relative_eq(&other.scale, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_compose() {
        let parent = Transform::from_position(Vector3::new(10.0, 0.0, 0.0))
            .with_rotation(UnitQuaternion::from_axis_angle(&Vector3::z_axis(), PI / 2.0))
            .with_uniform_scale(2.0);
        let child = Transform::from_position(Vector3::new(1.0, 0.0, 0.0));

        let world = parent.compose(&child);
        assert_relative_eq!(world.position, Vector3::new(10.0, 2.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(world.scale, Vector3::repeat(2.0));
        assert_relative_eq!(
            world.transform_point(&Point3::origin()),
            Point3::new(10.0, 2.0, 0.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_interpolate() {
        let start = Transform::identity().with_uniform_scale(0.0);
        let end = Transform::from_position(Vector3::new(0.0, 4.0, 0.0))
            .with_rotation(UnitQuaternion::from_axis_angle(&Vector3::y_axis(), PI / 2.0))
            .with_uniform_scale(1.0);

        assert_relative_eq!(start.interpolate(&end, 0.0), start);
        assert_relative_eq!(start.interpolate(&end, 1.0), end, epsilon = 1e-6);

        let half = start.interpolate(&end, 0.5);
        assert_relative_eq!(half.position, Vector3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(half.scale, Vector3::repeat(0.5));
        assert_relative_eq!(half.rotation.angle(), PI / 4.0, epsilon = 1e-6);
    }
}
