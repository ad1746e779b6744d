use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Diameters are cube-rooted and divided by this before halving, so that the
/// Sun and Mercury end up within an order of magnitude of each other.
pub const DIAMETER_DIVISOR: f64 = 25.0;

/// Uniform scale applied to a body's model.
pub fn scale_factor(diameter: f64) -> f32 {
    (diameter.cbrt() / DIAMETER_DIVISOR / 2.0) as f32
}

/// Rotation about the forward (+Z) axis by an angle in degrees.
///
/// Used for both the orbital-plane inclination and the axial tilt.
pub fn forward_tilt(degrees: f64) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), degrees.to_radians() as f32)
}

/// Rotation from Euler angles given in degrees, applied x, then y, then z.
pub fn euler_degrees(angles: &Vector3<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::from_euler_angles(
        angles.x.to_radians(),
        angles.y.to_radians(),
        angles.z.to_radians(),
    )
}

/// Rotation about the up (+Y) axis by an angle in radians.
pub fn about_up(radians: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), radians)
}

/// Distance along a ray to where it first hits a sphere, if it does.
/// `direction` must be normalized. A ray starting inside the sphere hits it
/// at distance zero.
pub fn ray_sphere_distance(
    origin: &Point3<f32>,
    direction: &Vector3<f32>,
    center: &Point3<f32>,
    radius: f32,
) -> Option<f32> {
    let to_center = center - origin;
    if to_center.norm_squared() <= radius * radius {
        return Some(0.0);
    }

    // Closest approach along the ray
    let along = to_center.dot(direction);
    if along < 0.0 {
        return None;
    }
    let miss_squared = to_center.norm_squared() - along * along;
    if miss_squared > radius * radius {
        return None;
    }
    Some(along - (radius * radius - miss_squared).sqrt())
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_scale_factor() {
        assert_eq!(scale_factor(0.0), 0.0);
        // cbrt(15625) = 25
        assert_relative_eq!(scale_factor(15625.0), 0.5, epsilon = 1e-6);
        assert!(scale_factor(f64::NAN).is_nan());
    }

    #[test]
    fn test_forward_tilt() {
        let tilt = forward_tilt(90.0);
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        assert_relative_eq!(tilt, expected, epsilon = 1e-6);

        // x goes to y
        assert_relative_eq!(tilt * Vector3::x(), Vector3::y(), epsilon = 1e-6);
        assert_relative_eq!(forward_tilt(0.0), UnitQuaternion::identity());
    }

    #[test]
    fn test_ray_sphere_distance() {
        let origin = Point3::new(0.0, 0.0, 10.0);
        let forward = -Vector3::z();
        let center = Point3::origin();

        assert_relative_eq!(
            ray_sphere_distance(&origin, &forward, &center, 1.0).unwrap(),
            9.0
        );
        // pointing away
        assert_eq!(ray_sphere_distance(&origin, &Vector3::z(), &center, 1.0), None);
        // passes beside it
        let beside = Point3::new(2.0, 0.0, 10.0);
        assert_eq!(ray_sphere_distance(&beside, &forward, &center, 1.0), None);
        // starts inside
        assert_eq!(
            ray_sphere_distance(&Point3::new(0.0, 0.5, 0.0), &forward, &center, 1.0),
            Some(0.0)
        );
    }

    #[test]
    fn test_euler_degrees() {
        let rotation = euler_degrees(&Vector3::new(0.0, 90.0, 0.0));
        assert_relative_eq!(rotation * Vector3::z(), Vector3::x(), epsilon = 1e-6);
    }
}
