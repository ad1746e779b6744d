mod body;
mod registry;

pub use body::BodyRecord;
pub use registry::BodyRegistry;
