use std::f64::consts::TAU;

use crate::model::BodyRecord;

/// Where a body is in its year and its day, as angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalAngles {
    /// Angle travelled around the orbit, counterclockwise about +Y
    pub orbit: f32,
    /// Rotation about the body's own axis
    pub spin: f32,
}

fn fraction_of(elapsed_days: f64, period_days: f64) -> f64 {
    // Zero (or garbage) periods mean the body doesn't move
    if period_days == 0.0 || !period_days.is_finite() {
        return 0.0;
    }
    (elapsed_days / period_days).rem_euclid(1.0)
}

pub fn orbital_angles(record: &BodyRecord, elapsed_days: f64) -> OrbitalAngles {
    let orbit = TAU * fraction_of(elapsed_days, record.year);
    let mut spin = TAU * fraction_of(elapsed_days, record.day);
    if record.retrograde {
        spin = -spin;
    }

    OrbitalAngles {
        orbit: orbit as f32,
        spin: spin as f32,
    }
}
