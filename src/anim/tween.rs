use std::collections::BTreeMap;
use std::f32::consts::PI;
use std::time::Duration;

use nalgebra::{Unit, UnitQuaternion, Vector3};
use serde::Deserialize;

use crate::host::NodeId;
use crate::math::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    EaseInCubic,
    EaseOutCubic,
}

impl Easing {
    /// Maps linear progress in [0, 1] to eased progress.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// Interpolation of a node's transform between two states.
#[derive(Debug, Clone)]
pub struct Tween {
    from: Transform,
    to: Transform,
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
}

impl Tween {
    pub fn new(from: Transform, to: Transform, duration: Duration, easing: Easing) -> Self {
        Tween {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
            easing,
        }
    }

    pub fn advance(&mut self, dt: Duration) -> Transform {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        self.sample()
    }

    pub fn sample(&self) -> Transform {
        if self.is_finished() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from.interpolate(&self.to, self.easing.apply(t))
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn target(&self) -> &Transform {
        &self.to
    }
}

/// A single-keyframe looping animation: a full turn about `axis` every
/// `period`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationData {
    pub axis: Unit<Vector3<f32>>,
    pub period: Duration,
}

impl AnimationData {
    pub fn spin(axis: Unit<Vector3<f32>>, period: Duration) -> Self {
        AnimationData { axis, period }
    }
}

#[derive(Debug, Clone)]
struct Spin {
    data: AnimationData,
    base: Transform,
    elapsed: Duration,
}

impl Spin {
    fn advance(&mut self, dt: Duration) -> Transform {
        self.elapsed += dt;
        let period = self.data.period.as_secs_f32();
        let fraction = if period > 0.0 {
            (self.elapsed.as_secs_f32() / period).fract()
        } else {
            0.0
        };
        let turn = UnitQuaternion::from_axis_angle(&self.data.axis, 2.0 * PI * fraction);
        self.base.with_rotation(self.base.rotation * turn)
    }
}

/// Every tween and looping animation currently playing, by node.
///
/// Starting a tween on a node that is already tweening replaces the old one.
/// When a node has both, the tween wins for that frame.
#[derive(Debug, Default)]
pub struct TweenSet {
    tweens: BTreeMap<NodeId, Tween>,
    spins: BTreeMap<NodeId, Spin>,
}

impl TweenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_tween(&mut self, node: NodeId, tween: Tween) {
        self.tweens.insert(node, tween);
    }

    pub fn start_spin(&mut self, node: NodeId, base: Transform, data: AnimationData) {
        let spin = Spin {
            data,
            base,
            elapsed: Duration::ZERO,
        };
        self.spins.insert(node, spin);
    }

    pub fn cancel(&mut self, node: NodeId) {
        self.tweens.remove(&node);
        self.spins.remove(&node);
    }

    pub fn is_tweening(&self, node: NodeId) -> bool {
        self.tweens.contains_key(&node)
    }

    pub fn is_spinning(&self, node: NodeId) -> bool {
        self.spins.contains_key(&node)
    }

    pub fn tween_target(&self, node: NodeId) -> Option<Transform> {
        self.tweens.get(&node).map(|tween| *tween.target())
    }

    /// Steps everything forward, returning the new local transform of each
    /// animated node. Finished tweens are dropped after reporting their end
    /// state.
    pub fn advance(&mut self, dt: Duration) -> Vec<(NodeId, Transform)> {
        let mut updates: Vec<_> = self
            .spins
            .iter_mut()
            .map(|(node, spin)| (*node, spin.advance(dt)))
            .collect();

        for (node, tween) in self.tweens.iter_mut() {
            updates.push((*node, tween.advance(dt)));
        }
        self.tweens.retain(|_, tween| !tween.is_finished());

        updates
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseInCubic, Easing::EaseOutCubic] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert_eq!(easing.apply(2.0), 1.0);
        }
        // ease-out is ahead of linear, ease-in behind
        assert!(Easing::EaseOutCubic.apply(0.5) > 0.5);
        assert!(Easing::EaseInCubic.apply(0.5) < 0.5);
    }

    #[test]
    fn test_tween_finishes_on_target() {
        let to = Transform::from_position(Vector3::new(0.0, 1.0, 0.0));
        let mut tween = Tween::new(
            Transform::identity(),
            to,
            Duration::from_secs(1),
            Easing::EaseOutCubic,
        );

        let mid = tween.advance(Duration::from_millis(500));
        assert_relative_eq!(mid.position.y, 0.875, epsilon = 1e-6);
        assert!(!tween.is_finished());

        let end = tween.advance(Duration::from_secs(5));
        assert_eq!(end, to);
        assert!(tween.is_finished());
    }

    #[test]
    fn test_zero_duration_tween() {
        let to = Transform::identity().with_uniform_scale(3.0);
        let tween = Tween::new(Transform::identity(), to, Duration::ZERO, Easing::Linear);
        assert!(tween.is_finished());
        assert_eq!(tween.sample(), to);
    }

    #[test]
    fn test_tween_set_replaces_and_drops() {
        let node = NodeId(7);
        let mut set = TweenSet::new();
        let target = |y| Transform::from_position(Vector3::new(0.0, y, 0.0));

        set.start_tween(
            node,
            Tween::new(target(0.0), target(1.0), Duration::from_secs(1), Easing::Linear),
        );
        set.start_tween(
            node,
            Tween::new(target(0.0), target(-1.0), Duration::from_secs(1), Easing::Linear),
        );

        let updates = set.advance(Duration::from_secs(2));
        assert_eq!(updates, vec![(node, target(-1.0))]);
        assert!(!set.is_tweening(node));
        assert!(set.advance(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_spin_wraps() {
        let node = NodeId(1);
        let mut set = TweenSet::new();
        set.start_spin(
            node,
            Transform::identity(),
            AnimationData::spin(Vector3::z_axis(), Duration::from_secs(4)),
        );

        let (_, quarter) = set.advance(Duration::from_secs(1))[0];
        assert_relative_eq!(quarter.rotation.angle(), PI / 2.0, epsilon = 1e-5);

        // four more seconds is a full turn, so we're back at a quarter
        let (_, again) = set.advance(Duration::from_secs(4))[0];
        assert_relative_eq!(again.rotation.angle(), PI / 2.0, epsilon = 1e-5);
        assert!(set.is_spinning(node));
    }
}
