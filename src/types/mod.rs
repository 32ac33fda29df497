//! Data types for the resource timeline.

mod duration;
mod event;
mod options;
mod resource;

pub use duration::*;
pub use event::*;
pub use options::*;
pub use resource::*;
