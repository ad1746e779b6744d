use std::time::Duration;

use nalgebra::{UnitQuaternion, Vector3};

use super::timer::{TimerHandle, TimerQueue};
use crate::math::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BobStep {
    Up,
    Down,
}

/// Phase of the label bob. The counter lives in [0, 10]: below 5 it counts
/// up and the label rises, from 10 it counts down and the label falls.
/// Reaching 5 on the way up jumps to 10, and reaching 5 on the way down
/// resets to 0, so each half-cycle is five steps long.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BobPhase {
    counter: u8,
}

impl BobPhase {
    const TURN: u8 = 5;
    const TOP: u8 = 10;

    pub fn counter(&self) -> u8 {
        self.counter
    }

    pub fn step(&mut self) -> BobStep {
        if self.counter < Self::TURN {
            self.counter += 1;
            if self.counter == Self::TURN {
                self.counter = Self::TOP;
            }
            BobStep::Up
        } else {
            self.counter -= 1;
            if self.counter == Self::TURN {
                self.counter = 0;
            }
            BobStep::Down
        }
    }

    /// How many steps above its resting position the label currently is.
    pub fn height(&self) -> u8 {
        if self.counter <= Self::TURN {
            self.counter
        } else {
            self.counter - Self::TURN
        }
    }

    pub const fn max_height() -> u8 {
        Self::TURN
    }
}

/// Symmetric counter in [-limit, limit] that reverses at the bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oscillator {
    value: i32,
    direction: i32,
    limit: i32,
}

impl Oscillator {
    pub fn new(limit: u32) -> Self {
        Oscillator {
            value: 0,
            direction: 1,
            limit: limit as i32,
        }
    }

    pub fn step(&mut self) -> i32 {
        if self.limit == 0 {
            return 0;
        }
        if (self.value + self.direction).abs() > self.limit {
            self.direction = -self.direction;
        }
        self.value += self.direction;
        self.value
    }
}

/// A repeating timer plus the state it steps. Starting a running loop or
/// stopping a stopped one does nothing.
#[derive(Debug, Clone, Default)]
struct TimedLoop {
    timer: Option<TimerHandle>,
}

impl TimedLoop {
    fn is_running<A: Clone>(&self, timers: &TimerQueue<A>) -> bool {
        self.timer.map_or(false, |handle| timers.is_active(handle))
    }

    fn start<A: Clone>(&mut self, timers: &mut TimerQueue<A>, period: Duration, action: A) -> bool {
        if self.is_running(timers) {
            return false;
        }
        // Clear out anything stale before replacing it
        if let Some(handle) = self.timer.take() {
            timers.cancel(handle);
        }
        self.timer = Some(timers.set_interval(period, action));
        true
    }

    fn stop<A: Clone>(&mut self, timers: &mut TimerQueue<A>) -> bool {
        match self.timer.take() {
            Some(handle) => timers.cancel(handle),
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
struct GearLoop {
    rest: Transform,
    oscillator: Oscillator,
    step_degrees: f32,
    timer: TimedLoop,
}

/// Animation state for one body: the label bob, and the gear oscillation
/// for the gear body.
#[derive(Debug, Clone)]
pub struct BodyAnimation {
    label_rest: Transform,
    bob_step: f32,
    bob: BobPhase,
    bob_timer: TimedLoop,
    gear: Option<GearLoop>,
}

impl BodyAnimation {
    pub fn new(label_rest: Transform, bob_step: f32) -> Self {
        BodyAnimation {
            label_rest,
            bob_step,
            bob: BobPhase::default(),
            bob_timer: TimedLoop::default(),
            gear: None,
        }
    }

    pub fn label_rest(&self) -> &Transform {
        &self.label_rest
    }

    pub fn bob_running<A: Clone>(&self, timers: &TimerQueue<A>) -> bool {
        self.bob_timer.is_running(timers)
    }

    /// Returns true if a new timer was scheduled.
    pub fn start_bob<A: Clone>(
        &mut self,
        timers: &mut TimerQueue<A>,
        interval: Duration,
        action: A,
    ) -> bool {
        self.bob_timer.start(timers, interval, action)
    }

    /// Returns true if a running timer was cancelled.
    pub fn stop_bob<A: Clone>(&mut self, timers: &mut TimerQueue<A>) -> bool {
        self.bob_timer.stop(timers)
    }

    /// Advances the bob by one tick and returns the label's new transform.
    pub fn tick_bob(&mut self) -> Transform {
        self.bob.step();
        self.label_transform()
    }

    pub fn label_transform(&self) -> Transform {
        let lift = self.bob_step * f32::from(self.bob.height());
        self.label_rest
            .with_position(self.label_rest.position + Vector3::y() * lift)
    }

    /// Largest vertical offset the bob can put on the label.
    pub fn bob_amplitude(&self) -> f32 {
        self.bob_step * f32::from(BobPhase::max_height())
    }

    pub fn set_gear(&mut self, rest: Transform, step_degrees: f32, limit: u32) {
        self.gear = Some(GearLoop {
            rest,
            oscillator: Oscillator::new(limit),
            step_degrees,
            timer: TimedLoop::default(),
        });
    }

    pub fn has_gear(&self) -> bool {
        self.gear.is_some()
    }

    pub fn gear_running<A: Clone>(&self, timers: &TimerQueue<A>) -> bool {
        self.gear
            .as_ref()
            .map_or(false, |gear| gear.timer.is_running(timers))
    }

    /// Does nothing (and returns false) if no gear was set up.
    pub fn start_gear<A: Clone>(
        &mut self,
        timers: &mut TimerQueue<A>,
        interval: Duration,
        action: A,
    ) -> bool {
        match &mut self.gear {
            Some(gear) => gear.timer.start(timers, interval, action),
            None => false,
        }
    }

    /// Rocks the gear one step about the forward axis, returning its new
    /// transform.
    pub fn tick_gear(&mut self) -> Option<Transform> {
        let gear = self.gear.as_mut()?;
        let angle = gear.step_degrees * gear.oscillator.step() as f32;
        let rock = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle.to_radians());
        Some(gear.rest.with_rotation(gear.rest.rotation * rock))
    }
}
