use std::time::Instant;

use kiss3d::camera::Camera;
use kiss3d::event::EventManager;
use kiss3d::planar_camera::PlanarCamera;
use kiss3d::post_processing::PostProcessingEffect;
use kiss3d::renderer::Renderer;
use kiss3d::text::Font;
use kiss3d::window::{State, Window};
use nalgebra::{Point2, Point3, Vector2};

use self::camera::OrbitCamera;
use self::controller::Controller;
use crate::scene::OrreryApp;

mod camera;
mod controller;
mod host;

pub use self::host::Kiss3dHost;

const INITIAL_CAMERA_DISTANCE: f32 = 30.0;

pub struct Simulation {
    app: OrreryApp<Kiss3dHost>,
    controller: Controller,
    camera: OrbitCamera,
    last_frame: Instant,
}

impl Simulation {
    pub fn new(app: OrreryApp<Kiss3dHost>) -> Self {
        Self {
            app,
            controller: Controller::new(),
            camera: OrbitCamera::new(INITIAL_CAMERA_DISTANCE),
            last_frame: Instant::now(),
        }
    }

    fn process_user_input(&mut self, mut events: EventManager) {
        for event in events.iter() {
            self.controller.process_event(&event.value, &mut self.app);
        }
    }

    /// Turns the cursor position into hover and click events on the host.
    fn update_pointer(&mut self, window: &Window) {
        let size = Vector2::new(window.width() as f32, window.height() as f32);
        let ray = self
            .controller
            .cursor()
            .map(|cursor| self.camera.unproject(&cursor, &size));

        let host = self.app.host_mut();
        host.update_pointer(ray);
        if self.controller.take_click() {
            host.click();
        }
    }

    fn draw_status(&self, window: &mut Window) {
        let text = format!(
            "day {:.1} ({} days / s{})\n{:.0} FPS",
            self.app.elapsed_days(),
            self.app.time_scale(),
            if self.app.orbits_enabled() { "" } else { ", frozen" },
            self.controller.fps(),
        );
        window.draw_text(
            &text,
            &Point2::origin(),
            40.0,
            &Font::default(),
            &Point3::new(1.0, 1.0, 1.0),
        );
    }
}

impl State for Simulation {
    fn cameras_and_effect_and_renderer(
        &mut self,
    ) -> (
        Option<&mut dyn Camera>,
        Option<&mut dyn PlanarCamera>,
        Option<&mut dyn Renderer>,
        Option<&mut dyn PostProcessingEffect>,
    ) {
        (Some(&mut self.camera), None, None, None)
    }

    fn step(&mut self, window: &mut Window) {
        self.process_user_input(window.events());
        self.update_pointer(window);

        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;
        if !self.controller.is_paused() {
            self.app.update(dt);
        }

        self.app.host().draw_labels(window, &self.camera);
        self.draw_status(window);
        self.controller.increment_frame_counter();
    }
}
