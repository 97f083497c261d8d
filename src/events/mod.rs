pub mod app;
pub mod keyboard;

pub use app::{RunningApp, WindowRef};
pub use keyboard::{KeySegment, ModifierMask};
