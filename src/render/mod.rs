//! Rendering pipeline: viewport windows, pane layout, and the abstract frame model.

pub mod frame;
pub mod layout;
pub mod renderer;
pub mod viewport;

pub use frame::{ConsoleFrame, PaneFrame, StyleTag, StyledLine};
pub use layout::{PaneRect, SplitOrientation};
pub use renderer::render;
pub use viewport::Viewport;
