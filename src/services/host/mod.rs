//! ShellHost service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for talking to the windowing
//! host: enumerating running applications, activating windows, requesting application
//! termination and releasing workspaces. They MUST NOT decide how an application is
//! closed. That decision belongs to the close orchestrator.

mod dry_run;
mod wmctrl;
mod r#trait;

pub use self::r#trait::{create_shell_host, ShellHost};
