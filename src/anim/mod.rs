mod loops;
mod timer;
mod tween;

pub use loops::{BobPhase, BobStep, BodyAnimation, Oscillator};
pub use timer::{TimerHandle, TimerQueue};
pub use tween::{AnimationData, Easing, Tween, TweenSet};
