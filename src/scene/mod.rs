mod app;
mod assets;
mod body;
mod orbit;

pub use app::{OrreryApp, TimerAction};
pub use assets::{AssetCache, AssetRequest};
pub use body::{BodyGeometry, CelestialBodyActors};
pub use orbit::{orbital_angles, OrbitalAngles};
