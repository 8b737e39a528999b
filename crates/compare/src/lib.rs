pub mod artifacts;
pub mod slider;
pub mod subscription;
pub mod view;

pub use artifacts::*;
pub use slider::*;
pub use subscription::*;
pub use view::*;
