pub mod geometry;
mod transform;

pub use transform::Transform;
