use std::time::Instant;

use kiss3d::event::{Action, Key, MouseButton, WindowEvent};
use nalgebra::Point2;

use super::host::Kiss3dHost;
use crate::scene::OrreryApp;

// Key config, all in one place
const KEY_SPEED_UP: Key = Key::Period;
const KEY_SLOW_DOWN: Key = Key::Comma;
const KEY_REWIND: Key = Key::R;
const KEY_TOGGLE_PAUSE: Key = Key::Space;
const KEY_TOGGLE_ORBITS: Key = Key::O;

// Cursor travel (in pixels) beyond which a press counts as a drag
const CLICK_SLOP: f32 = 4.0;

pub struct Controller {
    paused: bool,
    cursor: Option<Point2<f32>>,
    press_origin: Option<Point2<f32>>,
    clicked: bool,
    fps_counter: FpsCounter,
}

pub struct FpsCounter {
    instant: Instant,
    counter: usize,
    window_size_millis: usize,
    previous_fps: f64,
}

impl FpsCounter {
    pub fn new(window_size_millis: usize) -> Self {
        FpsCounter {
            instant: Instant::now(),
            counter: 0,
            previous_fps: 0.0,
            window_size_millis,
        }
    }

    pub fn reset(&mut self) {
        self.instant = Instant::now();
        self.counter = 0;
    }

    pub fn value(&self) -> f64 {
        self.previous_fps
    }

    pub fn increment(&mut self) {
        self.counter += 1;

        let elapsed = self.instant.elapsed();
        if elapsed.as_millis() > self.window_size_millis as u128 {
            self.previous_fps = (1000 * self.counter) as f64 / elapsed.as_millis() as f64;
            self.reset();
        }
    }
}

impl Controller {
    pub fn new() -> Self {
        Controller {
            paused: false,
            cursor: None,
            press_origin: None,
            clicked: false,
            fps_counter: FpsCounter::new(1000),
        }
    }

    pub fn process_event(&mut self, event: &WindowEvent, app: &mut OrreryApp<Kiss3dHost>) {
        match *event {
            WindowEvent::CursorPos(x, y, _) => {
                self.cursor = Some(Point2::new(x as f32, y as f32));
            }
            WindowEvent::CursorEnter(false) => {
                self.cursor = None;
            }
            WindowEvent::MouseButton(MouseButton::Button1, Action::Press, _) => {
                self.press_origin = self.cursor;
            }
            WindowEvent::MouseButton(MouseButton::Button1, Action::Release, _) => {
                // Releasing after a drag rotated the camera; that's not a click
                if let (Some(origin), Some(cursor)) = (self.press_origin.take(), self.cursor) {
                    self.clicked |= (cursor - origin).norm() <= CLICK_SLOP;
                }
            }
            WindowEvent::Key(KEY_SPEED_UP, Action::Press, _) => {
                app.set_time_scale(app.time_scale() * 2.0);
                tracing::info!("time scale is {} days / s", app.time_scale());
            }
            WindowEvent::Key(KEY_SLOW_DOWN, Action::Press, _) => {
                app.set_time_scale(app.time_scale() / 2.0);
                tracing::info!("time scale is {} days / s", app.time_scale());
            }
            WindowEvent::Key(KEY_REWIND, Action::Press, _) => {
                app.set_time_scale(-app.time_scale());
            }
            WindowEvent::Key(KEY_TOGGLE_PAUSE, Action::Press, _) => {
                self.paused = !self.paused;
            }
            WindowEvent::Key(KEY_TOGGLE_ORBITS, Action::Press, _) => {
                app.set_orbits_enabled(!app.orbits_enabled());
                tracing::info!(enabled = app.orbits_enabled(), "orbital motion toggled");
            }
            _ => {}
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn cursor(&self) -> Option<Point2<f32>> {
        self.cursor
    }

    /// Whether a click finished since the last call.
    pub fn take_click(&mut self) -> bool {
        std::mem::take(&mut self.clicked)
    }

    pub fn fps(&self) -> f64 {
        self.fps_counter.value()
    }

    pub fn increment_frame_counter(&mut self) {
        self.fps_counter.increment()
    }
}
