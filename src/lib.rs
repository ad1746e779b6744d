pub mod anim;
pub mod config;
pub mod debug;
pub mod error;
pub mod gui;
pub mod host;
pub mod math;
pub mod model;
pub mod scene;
