pub mod close_session;
pub mod host;
pub mod injector;
pub mod keycode_map;
pub mod overview;
pub mod partitioner;
pub mod replay;
pub mod window_tracker;

#[cfg(test)]
pub mod test_support;

pub use close_session::SessionCloser;
pub use host::create_shell_host;
pub use injector::create_key_injector;
pub use overview::create_overview;
pub use replay::ShortcutReplayEngine;
pub use window_tracker::WindowTracker;
