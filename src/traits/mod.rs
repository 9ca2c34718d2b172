pub mod sink;
pub mod source;
pub mod transform;

pub use sink::Sink;
pub use source::Source;
pub use transform::Transform;
